//! End-to-end planning.
//!
//! [`WorkPlanner`] chains the three stages (score, group, assign) and
//! returns the first stage error. The free functions [`score_repairs`],
//! [`group_into_trips`] and [`assign_to_years`] run one stage each and
//! report failure inside the result instead (`success: false` plus a
//! message and an empty payload).
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use u_workplan::config::PlannerConfig;
//! use u_workplan::models::{FixedParameter, ParameterRow, Repair};
//! use u_workplan::pipeline::WorkPlanner;
//!
//! let rows = vec![
//!     ParameterRow::new("Condition", "Poor", 10.0),
//!     ParameterRow::new("Condition", "Fair", 5.0),
//! ];
//! let repairs = vec![
//!     Repair::new("S1", "Roof").with_cost(700.0)
//!         .with_field("Condition", "Poor").with_field("Trip Location", "North"),
//!     Repair::new("S2", "Dock").with_cost(400.0)
//!         .with_field("Condition", "Fair").with_field("Trip Location", "South"),
//! ];
//! let budget = FixedParameter::monetary("Cost")
//!     .with_cumulative(true)
//!     .with_year_amount(2025, 1000.0)
//!     .with_year_amount(2026, 1000.0);
//!
//! let plan = WorkPlanner::new(PlannerConfig::default())
//!     .plan(&repairs, &[], &HashMap::new(), &rows, &[budget])
//!     .unwrap();
//!
//! assert_eq!(plan.ranking.items[0].repair_name, "Roof");
//! assert_eq!(plan.years.trips_in(2025)[0].trip_location, "North");
//! assert_eq!(plan.years.trips_in(2026)[0].trip_location, "South");
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::assignment::YearAssigner;
use crate::config::PlannerConfig;
use crate::error::PlanError;
use crate::grouping::{TripGrouper, TripPlan};
use crate::models::{
    index_stations, CoverageWarning, FixedParameter, ParameterCatalog, ParameterRow,
    PriorityMode, Repair, ScoredRepair, Station, StationIndex, Trip, TripContextTable,
    YearLedger, YearPlan, YearSummary,
};
use crate::scoring::{Ranking, Scorer};
use crate::validation::{validate_fixed_parameters, validate_input, validate_parameters};

/// Supplies raw parameter rows to the scorer.
pub trait ParameterSource {
    /// Loads the rows.
    fn parameter_rows(&self) -> Result<Vec<ParameterRow>, PlanError>;
}

impl ParameterSource for [ParameterRow] {
    fn parameter_rows(&self) -> Result<Vec<ParameterRow>, PlanError> {
        Ok(self.to_vec())
    }
}

impl ParameterSource for Vec<ParameterRow> {
    fn parameter_rows(&self) -> Result<Vec<ParameterRow>, PlanError> {
        Ok(self.clone())
    }
}

impl ParameterSource for ParameterCatalog {
    /// One row per option, carrying the catalog's max weight and condition.
    fn parameter_rows(&self) -> Result<Vec<ParameterRow>, PlanError> {
        Ok(self
            .parameters()
            .iter()
            .flat_map(|param| {
                param.options.iter().map(move |option| {
                    ParameterRow::new(param.name.clone(), option.label.clone(), option.weight)
                        .with_max_weight(param.max_weight)
                        .with_condition(param.condition.clone())
                })
            })
            .collect())
    }
}

/// Output of a full planning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkPlan {
    /// Scored and ranked repairs.
    pub ranking: Ranking,
    /// Trips in priority order.
    pub trips: TripPlan,
    /// Trips assigned to fiscal years.
    pub years: YearPlan,
}

/// Runs scoring, trip grouping and year assignment.
#[derive(Debug, Clone, Default)]
pub struct WorkPlanner {
    config: PlannerConfig,
}

impl WorkPlanner {
    /// Creates a planner.
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    /// The planner configuration.
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Plans repairs into fiscal years.
    ///
    /// Validation findings are logged at `warn` and never abort the run.
    pub fn plan<P: ParameterSource + ?Sized>(
        &self,
        repairs: &[Repair],
        stations: &[Station],
        weights: &HashMap<String, f64>,
        parameters: &P,
        fixed: &[FixedParameter],
    ) -> Result<WorkPlan, PlanError> {
        let rows = parameters.parameter_rows()?;

        let findings = [
            validate_input(repairs, stations),
            validate_parameters(&rows, weights),
            validate_fixed_parameters(fixed),
        ];
        for errors in findings.iter().filter_map(|r| r.as_ref().err()) {
            for error in errors {
                log::warn!("{error}");
            }
        }

        let index = index_stations(stations.iter().cloned());
        let ranking = Scorer::new(ParameterCatalog::from_rows(&rows))
            .with_weights(weights.clone())
            .with_split_fields(self.config.fields.split_fields.clone())
            .score(repairs, &index)?;
        let trips = TripGrouper::from_config(&self.config).group(&ranking.items, &index)?;
        let years = YearAssigner::from_config(&self.config).assign(&trips.trips, fixed)?;

        log::info!(
            "planned {} repairs in {} trips over {} year(s)",
            ranking.items.len(),
            trips.trips.len(),
            years.assignments.len()
        );
        Ok(WorkPlan {
            ranking,
            trips,
            years,
        })
    }
}

/// Result of [`score_repairs`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Whether scoring ran.
    pub success: bool,
    /// Failure description.
    pub message: Option<String>,
    /// Ranked repairs (empty on failure).
    pub ranking: Vec<ScoredRepair>,
    /// Informational notes.
    pub notes: Vec<String>,
}

/// Scores and ranks repairs.
pub fn score_repairs<P: ParameterSource + ?Sized>(
    repairs: &[Repair],
    stations: &StationIndex,
    weights: &HashMap<String, f64>,
    parameters: &P,
) -> ScoreResult {
    let result = parameters.parameter_rows().and_then(|rows| {
        Scorer::new(ParameterCatalog::from_rows(&rows))
            .with_weights(weights.clone())
            .score(repairs, stations)
    });
    match result {
        Ok(ranking) => ScoreResult {
            success: true,
            message: None,
            ranking: ranking.items,
            notes: ranking.notes,
        },
        Err(err) => {
            log::warn!("scoring failed: {err}");
            ScoreResult {
                message: Some(err.to_string()),
                ..ScoreResult::default()
            }
        }
    }
}

/// Result of [`group_into_trips`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupResult {
    /// Whether grouping ran.
    pub success: bool,
    /// Failure description.
    pub message: Option<String>,
    /// Trips in priority order.
    pub trips: Vec<Trip>,
    /// Number of trips.
    pub total_trips: usize,
    /// Trip location and access type per repair.
    pub contexts: TripContextTable,
}

/// Groups scored (or raw) repairs into trips.
///
/// Raw [`Repair`]s are grouped as unscored items with score 0.
pub fn group_into_trips<T>(
    items: &[T],
    stations: &StationIndex,
    priority_mode: PriorityMode,
) -> GroupResult
where
    T: Clone + Into<ScoredRepair>,
{
    let items: Vec<ScoredRepair> = items.iter().cloned().map(Into::into).collect();
    match TripGrouper::new()
        .with_priority_mode(priority_mode)
        .group(&items, stations)
    {
        Ok(plan) => GroupResult {
            success: true,
            message: None,
            total_trips: plan.trips.len(),
            trips: plan.trips,
            contexts: plan.contexts,
        },
        Err(err) => {
            log::warn!("trip grouping failed: {err}");
            GroupResult {
                message: Some(err.to_string()),
                ..GroupResult::default()
            }
        }
    }
}

/// Result of [`assign_to_years`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssignResult {
    /// Whether assignment ran.
    pub success: bool,
    /// Failure description.
    pub message: Option<String>,
    /// Trips per year.
    pub assignments: BTreeMap<i32, Vec<Trip>>,
    /// Totals per year.
    pub year_summaries: BTreeMap<i32, YearSummary>,
    /// Top-priority repairs deferred past the first year.
    pub warnings: Vec<CoverageWarning>,
    /// Final budget lines per constrained year.
    pub budgets: BTreeMap<i32, YearLedger>,
    /// Overflow year, if any trip could not be placed.
    pub overflow_year: Option<i32>,
}

/// Assigns trips to fiscal years under fixed parameters.
pub fn assign_to_years(
    trips: &[Trip],
    fixed: &[FixedParameter],
    top_percent: f64,
) -> AssignResult {
    match YearAssigner::new()
        .with_top_percent(top_percent)
        .assign(trips, fixed)
    {
        Ok(plan) => AssignResult {
            success: true,
            message: None,
            assignments: plan.assignments,
            year_summaries: plan.year_summaries,
            warnings: plan.warnings,
            budgets: plan.budgets,
            overflow_year: plan.overflow_year,
        },
        Err(err) => {
            log::warn!("year assignment failed: {err}");
            AssignResult {
                message: Some(err.to_string()),
                ..AssignResult::default()
            }
        }
    }
}
