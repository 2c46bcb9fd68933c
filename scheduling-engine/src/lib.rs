pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod request;
pub mod telemetry;

pub use domain::engine::SchedulingEngine;
pub use error::EngineError;
pub use request::{ErrorKind, RunRequest, RunResult, WeekendRoleFailure};
