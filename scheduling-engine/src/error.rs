use chrono::Weekday;
use thiserror::Error;

/// Every failure mode the engine can produce. Mirrors the shape of the
/// teacher's `SchedulingServiceError`/`DataServiceError`, minus the
/// `IntoResponse` impl — there is no HTTP layer to respond through.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no worker can ever cover section {section} on {weekday:?}")]
    Configuration { section: String, weekday: Weekday },

    #[error("search exhausted all combinations; scenario is infeasible")]
    Infeasible,

    #[error("run was cancelled")]
    Cancelled,

    #[error("store operation failed: {0}")]
    Store(#[from] sqlx::Error),
}
