//! Planning errors.
//!
//! Stage methods return `Result<_, PlanError>`. The free functions in
//! [`pipeline`](crate::pipeline) turn these into soft-failure envelopes
//! (`success: false` plus a message) for callers that prefer reporting
//! over propagation.

/// Errors raised by the planning stages and their configuration.
#[derive(thiserror::Error, Debug)]
pub enum PlanError {
    /// No soft parameters are loaded, so no score can be computed.
    #[error("no scoring parameters loaded")]
    EmptyCatalog,
    /// The trip grouper received no repairs.
    #[error("no repairs supplied for trip grouping")]
    NoRepairs,
    /// The year assigner received no trips.
    #[error("no trips supplied for year assignment")]
    NoTrips,
    /// A collaborator (e.g., the parameter source) failed.
    #[error("parameter source failed: {0}")]
    Source(String),
    /// The planner configuration could not be parsed.
    #[error("invalid planner configuration: {0}")]
    Config(#[from] toml::de::Error),
    /// Reading a configuration file failed.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}
