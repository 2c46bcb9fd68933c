use std::collections::HashSet;

use async_trait::async_trait;
use chrono::NaiveDate;
use shared::types::{Assignment, Scenario, Section, Worker, WorkerMetrics};
use uuid::Uuid;

use crate::error::EngineError;

/// The engine's one persistence collaborator, shaped like the
/// teacher's `JobRepository`: `async_trait`, object-safe (`Arc<dyn
/// Store>`), every method returning `Result<_, EngineError>`. All
/// operations are bulk and transactional at the scenario level — the
/// engine calls `Store` exactly twice per run (§5): once to read
/// everything it needs, once to write the finished scenario.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait]
pub trait Store: Send + Sync {
    async fn list_active_workers(&self) -> Result<Vec<Worker>, EngineError>;
    async fn list_sections(&self) -> Result<Vec<Section>, EngineError>;
    async fn list_holidays(&self, year: i32) -> Result<HashSet<NaiveDate>, EngineError>;
    /// All assignments already on record for `year`, used to seed the
    /// yearly scope of the `MetricsLedger` and "longest ago" queries.
    async fn list_yearly_assignments(&self, year: i32) -> Result<Vec<Assignment>, EngineError>;

    async fn create_scenario(
        &self,
        name: &str,
        created_by: &str,
        year: i32,
        description: &str,
        settings: serde_json::Value,
    ) -> Result<Uuid, EngineError>;

    /// Batchable, idempotent per `(scenario_id, date, section_name,
    /// copy_ix)`.
    async fn append_assignments(&self, scenario_id: Uuid, assignments: &[Assignment]) -> Result<(), EngineError>;
    async fn write_metrics(&self, scenario_id: Uuid, metrics: &[WorkerMetrics]) -> Result<(), EngineError>;
    /// Marks the scenario incomplete, per the non-fatal C7 failures
    /// recorded alongside it.
    async fn mark_incomplete(&self, scenario_id: Uuid) -> Result<(), EngineError>;

    async fn publish(&self, scenario_id: Uuid) -> Result<(), EngineError>;
    async fn archive(&self, scenario_id: Uuid) -> Result<(), EngineError>;
    async fn clone_scenario(&self, scenario_id: Uuid, new_name: &str) -> Result<Uuid, EngineError>;
    async fn get_scenario(&self, scenario_id: Uuid) -> Result<Option<Scenario>, EngineError>;
    async fn get_assignments(&self, scenario_id: Uuid) -> Result<Vec<Assignment>, EngineError>;
}
