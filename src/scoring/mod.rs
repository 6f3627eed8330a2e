//! Multi-criteria repair scoring.
//!
//! Computes a 0–100 suitability score per repair from weighted soft
//! parameters.
//!
//! # Algorithm
//!
//! For each repair and each catalog parameter:
//!
//! 1. Look up the parameter's field (repair first, then station).
//! 2. Match the value against the parameter's options (canonical text,
//!    then numeric equality).
//! 3. A parameter is *present* when matched, with positive max weight and
//!    positive overall fraction.
//! 4. Renormalize: each present parameter's effective fraction is its
//!    overall fraction divided by the sum over present parameters, so a
//!    repair is never penalized for attributes it has no data for.
//! 5. `score = Σ (option_weight / max_weight) · effective_fraction`, as a
//!    percentage rounded to two decimals.
//!
//! Repairs are then sorted by score (descending), station id, repair name,
//! and ranked 1..n.
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use u_workplan::models::{ParameterCatalog, ParameterRow, Repair, StationIndex};
//! use u_workplan::scoring::Scorer;
//!
//! let catalog = ParameterCatalog::from_rows(&[
//!     ParameterRow::new("Age", "Old", 10.0),
//!     ParameterRow::new("Age", "New", 2.0),
//! ]);
//! let repairs = vec![
//!     Repair::new("S1", "Roof").with_field("Age", "New"),
//!     Repair::new("S2", "Dock").with_field("Age", "Old"),
//! ];
//!
//! let ranking = Scorer::new(catalog)
//!     .score(&repairs, &StationIndex::new())
//!     .unwrap();
//! assert_eq!(ranking.items[0].repair_name, "Dock");
//! assert_eq!(ranking.items[0].score, 100.0);
//! assert_eq!(ranking.items[1].score, 20.0);
//! ```

mod rank;

pub use rank::{compare_scored, rank_in_place};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::FieldNames;
use crate::error::PlanError;
use crate::models::{
    ParameterCatalog, ParameterScore, RecordView, Repair, ScoredRepair, SplitMap, StationIndex,
    WeightVector,
};

/// Scored and ranked repairs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    /// Repairs sorted by rank.
    pub items: Vec<ScoredRepair>,
    /// Informational notes (weight fallback, unmatched repairs).
    pub notes: Vec<String>,
}

/// Scores repairs against a parameter catalog.
#[derive(Debug, Clone)]
pub struct Scorer {
    catalog: ParameterCatalog,
    weights: HashMap<String, f64>,
    split_fields: Vec<String>,
}

impl Scorer {
    /// Creates a scorer with equal weighting and the default split fields.
    pub fn new(catalog: ParameterCatalog) -> Self {
        Self {
            catalog,
            weights: HashMap::new(),
            split_fields: FieldNames::default().split_fields,
        }
    }

    /// Sets the overall weight vector (parameter name → importance).
    pub fn with_weights(mut self, weights: HashMap<String, f64>) -> Self {
        self.weights = weights;
        self
    }

    /// Sets the funding split fields, in lookup order.
    pub fn with_split_fields(mut self, fields: Vec<String>) -> Self {
        self.split_fields = fields;
        self
    }

    /// The catalog in use.
    pub fn catalog(&self) -> &ParameterCatalog {
        &self.catalog
    }

    /// Scores and ranks `repairs`.
    ///
    /// # Errors
    /// [`PlanError::EmptyCatalog`] when the catalog has no parameters.
    pub fn score(
        &self,
        repairs: &[Repair],
        stations: &StationIndex,
    ) -> Result<Ranking, PlanError> {
        if self.catalog.is_empty() {
            return Err(PlanError::EmptyCatalog);
        }

        let vector = WeightVector::normalize(&self.catalog, &self.weights);
        log::debug!(
            "scoring {} repairs against {} parameters",
            repairs.len(),
            self.catalog.len()
        );

        let mut notes = Vec::new();
        if vector.equal_fallback {
            notes.push(format!(
                "no positive overall weights supplied; using equal weighting across {} parameters",
                self.catalog.len()
            ));
        }

        let mut items: Vec<ScoredRepair> = repairs
            .iter()
            .map(|repair| self.score_one(repair, stations, &vector))
            .collect();

        let unmatched = items
            .iter()
            .filter(|item| !item.details.iter().any(|d| d.matched))
            .count();
        if unmatched > 0 {
            notes.push(format!("{unmatched} repair(s) matched no parameter option"));
        }

        rank_in_place(&mut items);
        Ok(Ranking { items, notes })
    }

    fn score_one(
        &self,
        repair: &Repair,
        stations: &StationIndex,
        vector: &WeightVector,
    ) -> ScoredRepair {
        let view = RecordView::resolve(repair, stations);

        let mut details: Vec<ParameterScore> = self
            .catalog
            .parameters()
            .iter()
            .enumerate()
            .map(|(i, param)| {
                let value = view.value(&param.name);
                let option_weight = value.as_ref().and_then(|v| param.option_weight(v));
                ParameterScore {
                    parameter: param.name.clone(),
                    value: value.and_then(|v| v.as_text()),
                    option_weight,
                    max_weight: param.max_weight,
                    overall_fraction: vector.fraction(i),
                    effective_fraction: 0.0,
                    contribution: 0.0,
                    matched: option_weight.is_some(),
                }
            })
            .collect();

        fn is_present(d: &ParameterScore) -> bool {
            d.matched && d.max_weight > 0.0 && d.overall_fraction > 0.0
        }
        let present_sum: f64 = details
            .iter()
            .filter(|d| is_present(d))
            .map(|d| d.overall_fraction)
            .sum();

        let mut total = 0.0;
        if present_sum > 0.0 {
            for detail in details.iter_mut().filter(|d| is_present(d)) {
                detail.effective_fraction = detail.overall_fraction / present_sum;
                let ratio = (detail.option_weight.unwrap_or(0.0) / detail.max_weight).clamp(0.0, 1.0);
                detail.contribution = ratio * detail.effective_fraction;
                total += detail.contribution;
            }
        }
        let score = ((total * 10_000.0).round() / 100.0).clamp(0.0, 100.0);

        let split_amounts = SplitMap::resolve(&view, &self.split_fields)
            .map(|split| split.apply(repair.cost))
            .unwrap_or_default();

        ScoredRepair {
            row_index: repair.row_index,
            station_id: repair.station_id.clone(),
            repair_name: repair.name.clone(),
            cost: repair.cost,
            split_amounts,
            score,
            rank: 0,
            details,
            original_repair: repair.clone(),
        }
    }
}
