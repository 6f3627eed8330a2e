//! Constraint evaluation for a single repair.
//!
//! Temporal amounts are normalized to hours; monetary amounts stay in
//! currency units, optionally scaled by the repair's share for one funding
//! source. Missing values never reject a repair.

use crate::config::ConstraintDefaults;
use crate::models::{
    canonical, split_tokens, ConstraintKind, FixedParameter, RecordView, SplitMap, TimeUnit,
};

/// Evaluates fixed parameters against repairs.
#[derive(Debug, Clone)]
pub(crate) struct Evaluator<'a> {
    defaults: ConstraintDefaults,
    split_fields: &'a [String],
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(defaults: ConstraintDefaults, split_fields: &'a [String]) -> Self {
        Self {
            defaults,
            split_fields,
        }
    }

    /// Per-item admissibility of a repair in `year`.
    pub(crate) fn admits(&self, param: &FixedParameter, view: &RecordView<'_>, year: i32) -> bool {
        match param.kind {
            ConstraintKind::Geographical => self.within_allowed(param, view, year),
            ConstraintKind::Temporal | ConstraintKind::Monetary => {
                let (Some(value), Some(limit)) = (self.amount(param, view), self.limit(param, year))
                else {
                    return true;
                };
                param.comparison(self.defaults.comparison).holds(value, limit)
            }
            ConstraintKind::Unsupported => true,
        }
    }

    /// Amount a repair contributes under `param` (hours or currency).
    pub(crate) fn amount(&self, param: &FixedParameter, view: &RecordView<'_>) -> Option<f64> {
        match param.kind {
            ConstraintKind::Temporal => {
                let field = param.field()?;
                let raw = view.number(field)?;
                let unit = TimeUnit::infer_from_field(field)
                    .or_else(|| param.configured_unit())
                    .unwrap_or(self.defaults.unit);
                Some(unit.to_hours(raw))
            }
            ConstraintKind::Monetary => {
                let raw = match param.field() {
                    Some(field) => view.number(field)?,
                    None => view.repair.cost,
                };
                Some(raw * self.split_multiplier(param, view))
            }
            _ => None,
        }
    }

    /// Year limit of `param` (hours or currency).
    pub(crate) fn limit(&self, param: &FixedParameter, year: i32) -> Option<f64> {
        let amount = param.year_amount(year)?;
        match param.kind {
            ConstraintKind::Temporal => {
                let unit = param
                    .configured_unit()
                    .or_else(|| param.field().and_then(TimeUnit::infer_from_field))
                    .unwrap_or(self.defaults.unit);
                Some(unit.to_hours(amount))
            }
            ConstraintKind::Monetary => Some(amount),
            _ => None,
        }
    }

    fn within_allowed(&self, param: &FixedParameter, view: &RecordView<'_>, year: i32) -> bool {
        let Some(text) = param.field().and_then(|field| view.text(field)) else {
            return true;
        };
        let allowed = param.allowed_values(year);
        if allowed.is_empty() {
            return true;
        }
        split_tokens(&text)
            .into_iter()
            .map(canonical)
            .filter(|token| !token.is_empty())
            .all(|token| allowed.contains(&token))
    }

    fn split_multiplier(&self, param: &FixedParameter, view: &RecordView<'_>) -> f64 {
        let Some(source) = param.split_source.as_deref() else {
            return 1.0;
        };
        match SplitMap::resolve(view, self.split_fields) {
            Some(split) => split.fraction(source).unwrap_or(0.0),
            None => 1.0,
        }
    }
}
