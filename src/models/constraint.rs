//! Fixed (hard) parameters gating fiscal-year placement.
//!
//! A fixed parameter is an admissibility rule tied to specific years:
//!
//! - **Geographical**: a repair's location-like field must only contain
//!   allowed values.
//! - **Temporal**: a repair's duration is compared against a per-year limit
//!   (or, when cumulative, consumes a per-year allotment).
//! - **Monetary**: a repair's cost (optionally apportioned to one funding
//!   source) is compared against a per-year limit (or consumes a budget).
//!
//! Unrecognized `type` values deserialize to
//! [`ConstraintKind::Unsupported`] and are ignored by the assigner.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::record::{canonical, split_tokens, FieldValue, RecordView};
use super::units::{Comparison, TimeUnit};

/// Fixed parameter category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintKind {
    /// Allowed-value list over a location-like field.
    #[serde(alias = "geographic", alias = "Geographical")]
    Geographical,
    /// Duration limit or allotment.
    #[serde(alias = "Temporal")]
    Temporal,
    /// Cost limit or budget.
    #[serde(alias = "Monetary")]
    Monetary,
    /// Legacy or unknown type; filtered out before assignment.
    #[serde(other)]
    Unsupported,
}

impl ConstraintKind {
    /// Whether the assigner evaluates this kind.
    pub fn is_supported(self) -> bool {
        !matches!(self, ConstraintKind::Unsupported)
    }
}

/// Restricts a fixed parameter to repairs whose `field` has one of `values`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfCondition {
    /// Field looked up on the repair (then its station).
    pub field: String,
    /// Accepted values. Empty means "any non-blank value".
    #[serde(default)]
    pub values: Vec<String>,
}

impl IfCondition {
    /// Creates a condition.
    pub fn new(field: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            field: field.into(),
            values,
        }
    }

    /// Whether the condition holds for a repair.
    ///
    /// The field value is split on `/ , ;` and holds when any token matches
    /// an accepted value canonically. A missing field never satisfies it.
    pub fn is_satisfied(&self, view: &RecordView<'_>) -> bool {
        let Some(text) = view.text(&self.field) else {
            return false;
        };
        if self.values.is_empty() {
            return true;
        }
        let accepted: Vec<String> = self.values.iter().map(|v| canonical(v)).collect();
        split_tokens(&text)
            .into_iter()
            .any(|token| accepted.contains(&canonical(token)))
    }
}

/// Per-year setting of a fixed parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YearValue {
    /// Limit, budget or allotment for the year.
    #[serde(default)]
    pub value: FieldValue,
    /// Year-specific allowed values (geographical).
    #[serde(default)]
    pub values: Vec<String>,
}

impl YearValue {
    /// Numeric year value.
    pub fn amount(value: f64) -> Self {
        Self {
            value: FieldValue::Number(value),
            values: Vec::new(),
        }
    }

    /// Allowed-value list for the year.
    pub fn allowed(values: Vec<String>) -> Self {
        Self {
            value: FieldValue::Empty,
            values,
        }
    }
}

/// A hard admissibility rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedParameter {
    /// Category.
    #[serde(rename = "type")]
    pub kind: ConstraintKind,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Field evaluated on repairs. Defaults to `name`.
    #[serde(default)]
    pub field_name: Option<String>,
    /// Optional applicability condition.
    #[serde(default)]
    pub if_condition: Option<IfCondition>,
    /// Base allowed values (geographical).
    #[serde(default)]
    pub values: Vec<String>,
    /// Comparison operator symbol (temporal/monetary).
    #[serde(default)]
    pub conditional: Option<String>,
    /// Unit of the year values (temporal).
    #[serde(default)]
    pub unit: Option<String>,
    /// Funding source whose share of the cost is checked (monetary).
    #[serde(default)]
    pub split_source: Option<String>,
    /// Per-year settings.
    #[serde(default)]
    pub years: BTreeMap<i32, YearValue>,
    /// Whether the year value is a budget consumed across placed trips.
    #[serde(default)]
    pub cumulative: bool,
}

impl FixedParameter {
    /// Creates a parameter of the given kind evaluating `field`.
    pub fn new(kind: ConstraintKind, field: impl Into<String>) -> Self {
        Self {
            kind,
            name: None,
            field_name: Some(field.into()),
            if_condition: None,
            values: Vec::new(),
            conditional: None,
            unit: None,
            split_source: None,
            years: BTreeMap::new(),
            cumulative: false,
        }
    }

    /// Geographical parameter over `field`.
    pub fn geographical(field: impl Into<String>) -> Self {
        Self::new(ConstraintKind::Geographical, field)
    }

    /// Temporal parameter over `field`.
    pub fn temporal(field: impl Into<String>) -> Self {
        Self::new(ConstraintKind::Temporal, field)
    }

    /// Monetary parameter over `field`.
    pub fn monetary(field: impl Into<String>) -> Self {
        Self::new(ConstraintKind::Monetary, field)
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the applicability condition.
    pub fn with_condition(mut self, condition: IfCondition) -> Self {
        self.if_condition = Some(condition);
        self
    }

    /// Sets base allowed values.
    pub fn with_values(mut self, values: Vec<String>) -> Self {
        self.values = values;
        self
    }

    /// Sets the comparison operator symbol.
    pub fn with_conditional(mut self, symbol: impl Into<String>) -> Self {
        self.conditional = Some(symbol.into());
        self
    }

    /// Sets the unit label.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Sets the funding source token.
    pub fn with_split_source(mut self, source: impl Into<String>) -> Self {
        self.split_source = Some(source.into());
        self
    }

    /// Adds a per-year setting.
    pub fn with_year(mut self, year: i32, value: YearValue) -> Self {
        self.years.insert(year, value);
        self
    }

    /// Adds a numeric per-year limit.
    pub fn with_year_amount(self, year: i32, amount: f64) -> Self {
        self.with_year(year, YearValue::amount(amount))
    }

    /// Marks the parameter as cumulative.
    pub fn with_cumulative(mut self, cumulative: bool) -> Self {
        self.cumulative = cumulative;
        self
    }

    /// Field evaluated on repairs (`field_name`, else `name`).
    pub fn field(&self) -> Option<&str> {
        self.field_name
            .as_deref()
            .or(self.name.as_deref())
            .map(str::trim)
            .filter(|f| !f.is_empty())
    }

    /// Label used in reports (`name`, else `field_name`).
    pub fn label(&self) -> String {
        self.name
            .as_deref()
            .or(self.field_name.as_deref())
            .unwrap_or("unnamed")
            .to_string()
    }

    /// Comparison operator, falling back to `default` when absent or unrecognized.
    pub fn comparison(&self, default: Comparison) -> Comparison {
        self.conditional
            .as_deref()
            .and_then(Comparison::parse)
            .unwrap_or(default)
    }

    /// Configured unit, if recognized.
    pub fn configured_unit(&self) -> Option<TimeUnit> {
        self.unit.as_deref().and_then(TimeUnit::parse)
    }

    /// Whether the parameter applies to a repair.
    pub fn applies_to(&self, view: &RecordView<'_>) -> bool {
        self.if_condition
            .as_ref()
            .map_or(true, |condition| condition.is_satisfied(view))
    }

    /// Numeric value of this parameter for `year`.
    pub fn year_amount(&self, year: i32) -> Option<f64> {
        self.years.get(&year).and_then(|y| y.value.as_number())
    }

    /// Canonical allowed values for `year`: the year's list, else the year's
    /// value text, else the base list.
    pub fn allowed_values(&self, year: i32) -> Vec<String> {
        let year_value = self.years.get(&year);
        let raw: Vec<String> = match year_value {
            Some(y) if !y.values.is_empty() => y.values.clone(),
            Some(y) => match y.value.as_text() {
                Some(text) => split_tokens(&text).into_iter().map(String::from).collect(),
                None => self.values.clone(),
            },
            None => self.values.clone(),
        };
        raw.iter()
            .map(|v| canonical(v))
            .filter(|v| !v.is_empty())
            .collect()
    }
}
