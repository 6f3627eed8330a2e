//! Constrained fiscal-year assignment.
//!
//! Places whole trips into fiscal years under hard (fixed) parameters.
//!
//! # Algorithm
//!
//! Trips are processed in the given order. Each trip goes to the earliest
//! constrained year where
//!
//! 1. every repair passes every applicable non-cumulative parameter
//!    (geographical allowed values, temporal/monetary limits), and
//! 2. the trip's total under each cumulative parameter still fits that
//!    year's remaining budget or allotment.
//!
//! On placement the cumulative amounts are committed. Trips that fit no
//! year go to an overflow year one past the last constrained year (left
//! unassigned when that year is not representable). No backtracking is
//! performed.
//!
//! # Complexity
//! O(t · y · r · p) where t=trips, y=years, r=repairs/trip, p=parameters.
//!
//! # Example
//!
//! ```
//! use u_workplan::assignment::YearAssigner;
//! use u_workplan::models::{FixedParameter, Repair, ScoredRepair, Trip};
//!
//! let mut a = Trip::new("North", "Boat");
//! a.repairs.push(ScoredRepair::unscored(Repair::new("S1", "Roof").with_cost(700.0)));
//! let mut b = Trip::new("South", "Boat");
//! b.repairs.push(ScoredRepair::unscored(Repair::new("S2", "Dock").with_cost(400.0)));
//!
//! let budget = FixedParameter::monetary("Cost")
//!     .with_cumulative(true)
//!     .with_year_amount(2025, 1000.0)
//!     .with_year_amount(2026, 1000.0);
//!
//! let plan = YearAssigner::new().assign(&[a, b], &[budget]).unwrap();
//! assert_eq!(plan.trips_in(2025)[0].trip_location, "North");
//! assert_eq!(plan.trips_in(2026)[0].trip_location, "South");
//! ```

mod coverage;
mod evaluate;

pub use coverage::top_count;

use chrono::{Datelike, Local};
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::config::{ConstraintDefaults, PlannerConfig};
use crate::error::PlanError;
use crate::models::{
    index_stations, BudgetLine, ConstraintKind, FixedParameter, RecordView, RepairKey,
    StationIndex, Trip, YearLedger, YearPlan, YearSummary,
};
use coverage::coverage_warnings;
use evaluate::Evaluator;

/// Greedy year assigner.
#[derive(Debug, Clone)]
pub struct YearAssigner {
    top_percent: f64,
    defaults: ConstraintDefaults,
    split_fields: Vec<String>,
    fallback_year: Option<i32>,
}

impl Default for YearAssigner {
    fn default() -> Self {
        Self::new()
    }
}

impl YearAssigner {
    /// Creates an assigner with the default configuration.
    pub fn new() -> Self {
        Self::from_config(&PlannerConfig::default())
    }

    /// Creates an assigner from planner configuration.
    pub fn from_config(config: &PlannerConfig) -> Self {
        Self {
            top_percent: config.top_percent,
            defaults: config.constraints,
            split_fields: config.fields.split_fields.clone(),
            fallback_year: config.fallback_year,
        }
    }

    /// Sets the top-priority share (percent) checked for first-year coverage.
    pub fn with_top_percent(mut self, top_percent: f64) -> Self {
        self.top_percent = top_percent;
        self
    }

    /// Sets the unit and operator fallbacks.
    pub fn with_defaults(mut self, defaults: ConstraintDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Sets the funding split fields.
    pub fn with_split_fields(mut self, fields: Vec<String>) -> Self {
        self.split_fields = fields;
        self
    }

    /// Pins the year used when no fixed parameter names a year.
    pub fn with_fallback_year(mut self, year: i32) -> Self {
        self.fallback_year = Some(year);
        self
    }

    /// Assigns trips to years.
    ///
    /// # Errors
    /// [`PlanError::NoTrips`] when `trips` is empty.
    pub fn assign(&self, trips: &[Trip], fixed: &[FixedParameter]) -> Result<YearPlan, PlanError> {
        if trips.is_empty() {
            return Err(PlanError::NoTrips);
        }

        let supported: Vec<&FixedParameter> =
            fixed.iter().filter(|p| p.kind.is_supported()).collect();
        if supported.len() < fixed.len() {
            log::debug!(
                "ignoring {} fixed parameter(s) of unsupported type",
                fixed.len() - supported.len()
            );
        }

        let years: BTreeSet<i32> = supported
            .iter()
            .flat_map(|p| p.years.keys().copied())
            .collect();
        let (Some(&first_year), Some(&last_year)) = (years.first(), years.last()) else {
            return Ok(self.single_bucket(trips));
        };

        let stations = index_stations(
            trips
                .iter()
                .flat_map(|t| t.stations.iter().map(|s| s.station.clone())),
        );
        let evaluator = Evaluator::new(self.defaults, &self.split_fields);
        let mut ledgers: BTreeMap<i32, YearLedger> = years
            .iter()
            .map(|&year| (year, build_ledger(&evaluator, &supported, year)))
            .collect();

        let mut assignments: BTreeMap<i32, Vec<Trip>> =
            years.iter().map(|&year| (year, Vec::new())).collect();
        let mut overflow: Vec<Trip> = Vec::new();
        let mut covered: HashSet<RepairKey> = HashSet::new();

        for trip in trips {
            let mut placed = None;
            for &year in &years {
                let Some(ledger) = ledgers.get_mut(&year) else {
                    continue;
                };
                if !items_admissible(&evaluator, &supported, trip, &stations, year) {
                    log::trace!(
                        "{} / {}: rejected by per-item limits in {year}",
                        trip.trip_location,
                        trip.access_type
                    );
                    continue;
                }
                let Some(amounts) = cumulative_fit(&evaluator, &supported, trip, &stations, ledger)
                else {
                    log::trace!(
                        "{} / {}: exceeds cumulative budget in {year}",
                        trip.trip_location,
                        trip.access_type
                    );
                    continue;
                };
                for (line, amount) in ledger.iter_mut().filter(|l| l.cumulative).zip(amounts) {
                    line.used += amount;
                }
                placed = Some(year);
                break;
            }

            match placed {
                Some(year) => {
                    if year == first_year {
                        covered.extend(trip.repairs.iter().map(|r| r.key()));
                    }
                    assignments.entry(year).or_default().push(trip.clone());
                }
                None => overflow.push(trip.clone()),
            }
        }

        let overflow_year = if overflow.is_empty() {
            None
        } else if let Some(year) = last_year.checked_add(1) {
            log::info!("{} trip(s) deferred to overflow year {year}", overflow.len());
            assignments.insert(year, overflow);
            Some(year)
        } else {
            log::warn!(
                "no overflow year after {last_year}; {} trip(s) left unassigned",
                overflow.len()
            );
            None
        };

        let year_summaries = summarize(&assignments, overflow_year);
        let warnings = coverage_warnings(trips, &covered, self.top_percent);
        if !warnings.is_empty() {
            log::info!(
                "{} top-priority repair(s) not covered in {first_year}",
                warnings.len()
            );
        }

        Ok(YearPlan {
            assignments,
            year_summaries,
            warnings,
            budgets: ledgers,
            overflow_year,
        })
    }

    fn single_bucket(&self, trips: &[Trip]) -> YearPlan {
        let year = self.fallback_year.unwrap_or_else(|| Local::now().year());
        log::debug!("no constrained years; placing {} trips in {year}", trips.len());
        let assignments = BTreeMap::from([(year, trips.to_vec())]);
        YearPlan {
            year_summaries: summarize(&assignments, None),
            assignments,
            ..YearPlan::default()
        }
    }
}

/// One line per monetary/temporal parameter with a numeric value in `year`.
fn build_ledger(evaluator: &Evaluator<'_>, params: &[&FixedParameter], year: i32) -> YearLedger {
    let mut ledger = YearLedger::default();
    for (index, param) in params.iter().enumerate() {
        let Some(total) = evaluator.limit(param, year) else {
            continue;
        };
        let line = BudgetLine {
            parameter_index: index,
            parameter: param.label(),
            field: param.field().unwrap_or("cost").to_string(),
            total,
            used: 0.0,
            cumulative: param.cumulative,
        };
        match param.kind {
            ConstraintKind::Monetary => ledger.monetary.push(line),
            ConstraintKind::Temporal => ledger.temporal.push(line),
            _ => {}
        }
    }
    ledger
}

fn items_admissible(
    evaluator: &Evaluator<'_>,
    params: &[&FixedParameter],
    trip: &Trip,
    stations: &StationIndex,
    year: i32,
) -> bool {
    trip.repairs.iter().all(|item| {
        let view = RecordView::resolve(&item.original_repair, stations);
        params
            .iter()
            .filter(|p| !p.cumulative && p.applies_to(&view))
            .all(|p| evaluator.admits(p, &view, year))
    })
}

/// Trip amount per cumulative line (in ledger order), or `None` if any line
/// would be exceeded.
fn cumulative_fit(
    evaluator: &Evaluator<'_>,
    params: &[&FixedParameter],
    trip: &Trip,
    stations: &StationIndex,
    ledger: &YearLedger,
) -> Option<Vec<f64>> {
    ledger
        .iter()
        .filter(|line| line.cumulative)
        .map(|line| {
            let param = params[line.parameter_index];
            let amount: f64 = trip
                .repairs
                .iter()
                .map(|item| RecordView::resolve(&item.original_repair, stations))
                .filter(|view| param.applies_to(view))
                .filter_map(|view| evaluator.amount(param, &view))
                .sum();
            line.fits(amount).then_some(amount)
        })
        .collect()
}

fn summarize(
    assignments: &BTreeMap<i32, Vec<Trip>>,
    overflow_year: Option<i32>,
) -> BTreeMap<i32, YearSummary> {
    assignments
        .iter()
        .map(|(&year, trips)| {
            (
                year,
                YearSummary::calculate(year, trips, overflow_year == Some(year)),
            )
        })
        .collect()
}
