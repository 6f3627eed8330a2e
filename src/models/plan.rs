//! Year plan (solution) model.
//!
//! The output of the [`YearAssigner`](crate::assignment::YearAssigner):
//! trips per fiscal year, per-year totals, budget usage, and coverage
//! warnings for high-priority repairs deferred past the first year.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::constraint::ConstraintKind;
use super::split::accumulate;
use super::trip::Trip;

/// Consumption tracking for one cumulative-capable fixed parameter in one year.
///
/// Monetary lines are in currency units, temporal lines in hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetLine {
    /// Index of the fixed parameter in the supported-parameter list.
    #[serde(skip)]
    pub parameter_index: usize,
    /// Parameter label.
    pub parameter: String,
    /// Field evaluated.
    pub field: String,
    /// Budget or allotment for the year.
    pub total: f64,
    /// Amount consumed by placed trips.
    pub used: f64,
    /// Whether placements consume this line.
    pub cumulative: bool,
}

impl BudgetLine {
    const EPSILON: f64 = 1e-9;

    /// Remaining capacity (never negative).
    pub fn remaining(&self) -> f64 {
        (self.total - self.used).max(0.0)
    }

    /// Whether `amount` more fits within the total.
    pub fn fits(&self, amount: f64) -> bool {
        self.used + amount <= self.total + Self::EPSILON
    }
}

/// Budget lines of one year, split by kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YearLedger {
    /// Monetary budgets.
    pub monetary: Vec<BudgetLine>,
    /// Temporal allotments (hours).
    pub temporal: Vec<BudgetLine>,
}

impl YearLedger {
    /// Lines of the given kind.
    pub fn lines(&self, kind: ConstraintKind) -> &[BudgetLine] {
        match kind {
            ConstraintKind::Monetary => &self.monetary,
            ConstraintKind::Temporal => &self.temporal,
            _ => &[],
        }
    }

    /// Iterates every line.
    pub fn iter(&self) -> impl Iterator<Item = &BudgetLine> {
        self.monetary.iter().chain(self.temporal.iter())
    }

    /// Mutable iteration over every line.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut BudgetLine> {
        self.monetary.iter_mut().chain(self.temporal.iter_mut())
    }
}

/// Totals of one year bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YearSummary {
    /// Fiscal year.
    pub year: i32,
    /// Number of trips.
    pub trip_count: usize,
    /// Number of repairs across trips.
    pub repair_count: usize,
    /// Sum of trip costs.
    pub total_cost: f64,
    /// Sum of trip days.
    pub total_days: f64,
    /// Cost per funding source.
    pub split_totals: BTreeMap<String, f64>,
    /// Whether this is the synthetic overflow year.
    pub overflow: bool,
}

impl YearSummary {
    /// Sums a year's trips.
    pub fn calculate(year: i32, trips: &[Trip], overflow: bool) -> Self {
        let mut summary = Self {
            year,
            overflow,
            ..Self::default()
        };
        for trip in trips {
            summary.trip_count += 1;
            summary.repair_count += trip.repair_count();
            summary.total_cost += trip.total_cost;
            summary.total_days += trip.total_days;
            accumulate(&mut summary.split_totals, &trip.total_split_costs);
        }
        summary
    }
}

/// A top-priority repair not covered in the first year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageWarning {
    /// Owning station.
    pub station_id: String,
    /// Repair name.
    pub repair_name: String,
    /// Repair score.
    pub score: f64,
    /// Trip location of the repair's trip.
    pub trip_location: String,
    /// Access type of the repair's trip.
    pub access_type: String,
}

/// Trips assigned to fiscal years.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YearPlan {
    /// Trips per year in input order.
    pub assignments: BTreeMap<i32, Vec<Trip>>,
    /// Totals per year.
    pub year_summaries: BTreeMap<i32, YearSummary>,
    /// Top-priority repairs deferred past the first year.
    pub warnings: Vec<CoverageWarning>,
    /// Final budget lines per constrained year.
    pub budgets: BTreeMap<i32, YearLedger>,
    /// Synthetic year holding trips no constrained year could take.
    pub overflow_year: Option<i32>,
}

impl YearPlan {
    /// Trips of a year (empty if the year has none).
    pub fn trips_in(&self, year: i32) -> &[Trip] {
        self.assignments.get(&year).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of trips across all years.
    pub fn trip_count(&self) -> usize {
        self.assignments.values().map(Vec::len).sum()
    }

    /// Trips that could not be placed in any constrained year.
    pub fn overflow_trips(&self) -> &[Trip] {
        match self.overflow_year {
            Some(year) => self.trips_in(year),
            None => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trip(location: &str, cost: f64, days: f64, split: &[(&str, f64)]) -> Trip {
        let mut t = Trip::new(location, "Boat");
        t.total_cost = cost;
        t.total_days = days;
        t.total_split_costs = split.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        t
    }

    #[test]
    fn test_budget_line_fits() {
        let line = BudgetLine {
            parameter_index: 0,
            parameter: "Budget".into(),
            field: "Cost".into(),
            total: 1000.0,
            used: 700.0,
            cumulative: true,
        };
        assert!(line.fits(300.0));
        assert!(!line.fits(400.0));
        assert_eq!(line.remaining(), 300.0);
    }

    #[test]
    fn test_year_summary() {
        let trips = vec![
            trip("A", 100.0, 2.0, &[("f", 50.0), ("p", 50.0)]),
            trip("B", 300.0, 1.0, &[("f", 300.0)]),
        ];
        let summary = YearSummary::calculate(2025, &trips, false);
        assert_eq!(summary.trip_count, 2);
        assert_eq!(summary.total_cost, 400.0);
        assert_eq!(summary.total_days, 3.0);
        assert_eq!(summary.split_totals["f"], 350.0);
        assert_eq!(summary.split_totals["p"], 50.0);
        assert!(!summary.overflow);
    }

    #[test]
    fn test_year_plan_accessors() {
        let mut plan = YearPlan::default();
        plan.assignments.insert(2025, vec![trip("A", 1.0, 1.0, &[])]);
        plan.assignments.insert(2027, vec![trip("B", 1.0, 1.0, &[]), trip("C", 1.0, 1.0, &[])]);
        plan.overflow_year = Some(2027);

        assert_eq!(plan.trip_count(), 3);
        assert_eq!(plan.trips_in(2026).len(), 0);
        assert_eq!(plan.overflow_trips().len(), 2);
    }
}
