//! Input validation for work-plan problems.
//!
//! Checks structural integrity of repairs, stations and parameters before
//! planning. Detects:
//! - Duplicate station IDs and row indices
//! - Repairs referencing unknown stations
//! - Blank identifiers, negative or non-finite numbers
//! - Fixed parameters the assigner cannot evaluate as written
//!
//! The planner treats every finding as a warning: stages tolerate bad
//! input by treating unusable values as absent.

use crate::models::{
    canonical, Comparison, ConstraintKind, FixedParameter, ParameterRow, Repair, Station,
    TimeUnit,
};
use std::collections::{HashMap, HashSet};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// A repair references a station that doesn't exist.
    UnknownStation,
    /// A required identifier or field name is blank.
    MissingField,
    /// A numeric value is negative or non-finite.
    InvalidValue,
    /// A parameter or overall weight is negative, non-finite or non-positive.
    InvalidWeight,
    /// An overall weight names no parameter.
    UnknownParameter,
    /// A fixed parameter has an unsupported type.
    UnsupportedConstraint,
    /// A fixed parameter has no year table.
    MissingYears,
    /// A comparison operator is not recognized.
    InvalidOperator,
    /// A time unit is not recognized.
    InvalidUnit,
    /// A geographical parameter has no allowed values.
    MissingAllowedValues,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

fn finish(errors: Vec<ValidationError>) -> ValidationResult {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates repairs and stations.
///
/// Checks:
/// 1. No duplicate station IDs
/// 2. No duplicate repair row indices
/// 3. Repairs have a station ID and a name
/// 4. Repair costs are finite and non-negative
/// 5. Repairs reference known stations (skipped when no stations are given)
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(repairs: &[Repair], stations: &[Station]) -> ValidationResult {
    let mut errors = Vec::new();

    let mut station_ids = HashSet::new();
    for s in stations {
        if !station_ids.insert(s.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate station ID: {}", s.id),
            ));
        }
    }

    let mut rows = HashSet::new();
    for repair in repairs {
        if let Some(row) = repair.row_index {
            if !rows.insert(row) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DuplicateId,
                    format!("Duplicate repair row index: {row}"),
                ));
            }
        }

        if repair.station_id.trim().is_empty() || repair.name.trim().is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingField,
                format!("Repair '{}' is missing a station ID or name", repair.key()),
            ));
        }

        if !repair.cost.is_finite() || repair.cost < 0.0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidValue,
                format!("Repair '{}' has invalid cost {}", repair.key(), repair.cost),
            ));
        }

        if !stations.is_empty() && !station_ids.contains(repair.station_id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownStation,
                format!(
                    "Repair '{}' references unknown station '{}'",
                    repair.key(),
                    repair.station_id
                ),
            ));
        }
    }

    finish(errors)
}

/// Validates parameter rows and overall weights.
///
/// Checks:
/// 1. Parameter names are not blank
/// 2. Option weights are finite and non-negative
/// 3. Explicit max weights are finite and positive
/// 4. Overall weights are finite, non-negative and name a parameter
pub fn validate_parameters(
    rows: &[ParameterRow],
    weights: &HashMap<String, f64>,
) -> ValidationResult {
    let mut errors = Vec::new();
    let mut names = HashSet::new();

    for (i, row) in rows.iter().enumerate() {
        if row.parameter.trim().is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingField,
                format!("Parameter row {i} has a blank parameter name"),
            ));
            continue;
        }
        names.insert(canonical(&row.parameter));

        if !row.weight.is_finite() || row.weight < 0.0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidWeight,
                format!(
                    "Parameter '{}' has invalid option weight {}",
                    row.parameter, row.weight
                ),
            ));
        }
        if let Some(max) = row.max_weight {
            if !max.is_finite() || max <= 0.0 {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidWeight,
                    format!("Parameter '{}' has non-positive max weight {max}", row.parameter),
                ));
            }
        }
    }

    // Sorted for stable messages.
    let mut entries: Vec<(&String, &f64)> = weights.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    for (name, weight) in entries {
        if !weight.is_finite() || *weight < 0.0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidWeight,
                format!("Overall weight for '{name}' is invalid: {weight}"),
            ));
        }
        if !names.contains(&canonical(name)) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownParameter,
                format!("Overall weight names unknown parameter '{name}'"),
            ));
        }
    }

    finish(errors)
}

/// Validates fixed parameters.
///
/// Checks:
/// 1. The type is supported
/// 2. A year table is present
/// 3. `conditional` and `unit`, when given, are recognized
/// 4. Temporal parameters name a field
/// 5. Geographical parameters have allowed values (base or per year)
pub fn validate_fixed_parameters(fixed: &[FixedParameter]) -> ValidationResult {
    let mut errors = Vec::new();

    for param in fixed {
        let label = param.label();

        if !param.kind.is_supported() {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnsupportedConstraint,
                format!("Fixed parameter '{label}' has an unsupported type"),
            ));
            continue;
        }

        if param.years.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingYears,
                format!("Fixed parameter '{label}' has no years"),
            ));
        }

        if let Some(symbol) = &param.conditional {
            if Comparison::parse(symbol).is_none() {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidOperator,
                    format!("Fixed parameter '{label}' has unrecognized operator '{symbol}'"),
                ));
            }
        }

        if let Some(unit) = &param.unit {
            if TimeUnit::parse(unit).is_none() {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidUnit,
                    format!("Fixed parameter '{label}' has unrecognized unit '{unit}'"),
                ));
            }
        }

        match param.kind {
            ConstraintKind::Temporal if param.field().is_none() => {
                errors.push(ValidationError::new(
                    ValidationErrorKind::MissingField,
                    format!("Temporal parameter '{label}' names no field"),
                ));
            }
            ConstraintKind::Geographical => {
                let has_values = !param.values.is_empty()
                    || param
                        .years
                        .keys()
                        .any(|&year| !param.allowed_values(year).is_empty());
                if !has_values {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::MissingAllowedValues,
                        format!("Geographical parameter '{label}' has no allowed values"),
                    ));
                }
            }
            _ => {}
        }
    }

    finish(errors)
}
