//! Planner configuration.
//!
//! Every default the stages rely on (unit, comparison operator, field
//! names, top-priority share, priority mode) lives here and is passed
//! explicitly into the stages.
//!
//! # TOML
//!
//! ```
//! use u_workplan::config::PlannerConfig;
//! use u_workplan::models::{PriorityMode, TimeUnit};
//!
//! let config = PlannerConfig::from_toml_str(r#"
//!     top_percent = 10.0
//!     priority_mode = "tripmax"
//!
//!     [constraints]
//!     unit = "days"
//!
//!     [fields]
//!     trip_location = "Route"
//! "#).unwrap();
//!
//! assert_eq!(config.top_percent, 10.0);
//! assert_eq!(config.priority_mode, PriorityMode::TripMax);
//! assert_eq!(config.constraints.unit, TimeUnit::Days);
//! assert_eq!(config.fields.trip_location, "Route");
//! assert_eq!(config.fields.access_type, "Access Type");
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::PlanError;
use crate::models::{Comparison, PriorityMode, TimeUnit};

/// Fallbacks for fixed parameters that omit a unit or operator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintDefaults {
    /// Unit assumed for temporal values (hours).
    pub unit: TimeUnit,
    /// Operator assumed for per-item checks (`<=`).
    pub comparison: Comparison,
}

/// Names of the record fields the stages read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldNames {
    /// Trip location field.
    pub trip_location: String,
    /// Access type field.
    pub access_type: String,
    /// Repair duration field (days).
    pub days: String,
    /// Funding split fields, in lookup order.
    pub split_fields: Vec<String>,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            trip_location: "Trip Location".to_string(),
            access_type: "Access Type".to_string(),
            days: "Days".to_string(),
            split_fields: vec![
                "O&M".to_string(),
                "Capital".to_string(),
                "Decommission".to_string(),
            ],
        }
    }
}

/// Top-level planner configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Share (percent) of top-scored repairs expected in the first year.
    pub top_percent: f64,
    /// Trip priority mode.
    pub priority_mode: PriorityMode,
    /// Constraint fallbacks.
    pub constraints: ConstraintDefaults,
    /// Record field names.
    pub fields: FieldNames,
    /// Label used when a trip location or access type is missing.
    pub unknown_label: String,
    /// Year used when no fixed parameter names any year (default: current year).
    pub fallback_year: Option<i32>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            top_percent: 20.0,
            priority_mode: PriorityMode::TripMean,
            constraints: ConstraintDefaults::default(),
            fields: FieldNames::default(),
            unknown_label: "Unknown".to_string(),
            fallback_year: None,
        }
    }
}

impl PlannerConfig {
    /// Parses a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, PlanError> {
        Ok(toml::from_str(raw)?)
    }

    /// Reads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PlanError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| PlanError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&raw)?;
        log::debug!("loaded planner configuration from {}", path.display());
        Ok(config)
    }

    /// Sets the top-priority share.
    pub fn with_top_percent(mut self, top_percent: f64) -> Self {
        self.top_percent = top_percent;
        self
    }

    /// Sets the trip priority mode.
    pub fn with_priority_mode(mut self, mode: PriorityMode) -> Self {
        self.priority_mode = mode;
        self
    }

    /// Sets the constraint fallbacks.
    pub fn with_constraints(mut self, constraints: ConstraintDefaults) -> Self {
        self.constraints = constraints;
        self
    }

    /// Sets the record field names.
    pub fn with_fields(mut self, fields: FieldNames) -> Self {
        self.fields = fields;
        self
    }

    /// Pins the year used when no fixed parameter names a year.
    pub fn with_fallback_year(mut self, year: i32) -> Self {
        self.fallback_year = Some(year);
        self
    }
}
