//! Repair work-plan optimizer.
//!
//! Turns a backlog of candidate repairs at field stations into a multi-year
//! work plan in three stages:
//!
//! 1. **Scoring**: weighted multi-criteria scoring ranks every repair.
//! 2. **Trip grouping**: repairs sharing a travel location and access type
//!    are clustered into trips and ordered by priority.
//! 3. **Year assignment**: trips are placed greedily into fiscal years
//!    under hard geographical, temporal and monetary limits and budgets.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Repair`, `Station`, `ParameterCatalog`,
//!   `FixedParameter`, `ScoredRepair`, `Trip`, `YearPlan`
//! - **`scoring`**: `Scorer` with renormalization over present parameters
//! - **`grouping`**: `TripGrouper` and trip ordering
//! - **`assignment`**: `YearAssigner` with budget ledgers and coverage warnings
//! - **`pipeline`**: `WorkPlanner` and the single-stage entry points
//! - **`validation`**: Input integrity checks
//! - **`config`**: `PlannerConfig` (TOML-loadable defaults)
//! - **`error`**: `PlanError`
//!
//! # Logging
//!
//! The crate logs through the `log` facade and never installs a logger.
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use u_workplan::models::{ParameterRow, Repair, StationIndex};
//! use u_workplan::pipeline::{assign_to_years, group_into_trips, score_repairs};
//! use u_workplan::models::{FixedParameter, PriorityMode};
//!
//! let rows = vec![ParameterRow::new("Condition", "Poor", 10.0)];
//! let repairs = vec![Repair::new("S1", "Roof")
//!     .with_cost(250.0)
//!     .with_field("Condition", "Poor")
//!     .with_field("Trip Location", "North")];
//!
//! let scored = score_repairs(&repairs, &StationIndex::new(), &HashMap::new(), &rows);
//! let grouped = group_into_trips(&scored.ranking, &StationIndex::new(), PriorityMode::TripMean);
//! let limit = FixedParameter::monetary("Cost").with_year_amount(2025, 500.0);
//! let assigned = assign_to_years(&grouped.trips, &[limit], 20.0);
//!
//! assert!(assigned.success);
//! assert_eq!(assigned.assignments[&2025][0].trip_location, "North");
//! ```

pub mod assignment;
pub mod config;
pub mod error;
pub mod grouping;
pub mod models;
pub mod pipeline;
pub mod scoring;
pub mod validation;

pub use error::PlanError;
