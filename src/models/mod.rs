//! Work-plan domain models.
//!
//! Provides the data types flowing through the three planning stages:
//! raw records, soft scoring parameters, hard fixed parameters, scored
//! items, trips, and the year plan.
//!
//! # Stage Mappings
//!
//! | Stage | Input | Output |
//! |-------|-------|--------|
//! | Scorer | `Repair`, `Station`, `ParameterCatalog`, `WeightVector` | `ScoredRepair` |
//! | Trip Grouper | `ScoredRepair` | `Trip`, `TripContextTable` |
//! | Year Assigner | `Trip`, `FixedParameter` | `YearPlan` |

mod constraint;
mod parameter;
mod plan;
mod record;
mod scored;
mod split;
mod trip;
mod units;

pub use constraint::{ConstraintKind, FixedParameter, IfCondition, YearValue};
pub use parameter::{OptionWeight, ParameterCatalog, ParameterRow, SoftParameter, WeightVector};
pub use plan::{BudgetLine, CoverageWarning, YearLedger, YearPlan, YearSummary};
pub use record::{
    canonical, index_stations, split_tokens, Field, FieldSet, FieldValue, RecordView, Repair,
    RepairKey, Station, StationIndex,
};
pub use scored::{ParameterScore, ScoredRepair};
pub use split::SplitMap;
pub(crate) use split::accumulate;
pub use trip::{PriorityMetrics, PriorityMode, StationAggregate, Trip, TripContext, TripContextTable};
pub use units::{Comparison, TimeUnit};
