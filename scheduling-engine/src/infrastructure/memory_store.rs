use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use shared::types::{Assignment, Scenario, ScenarioStatus, Section, Worker, WorkerMetrics};
use uuid::Uuid;

use crate::domain::store::Store;
use crate::error::EngineError;

#[derive(Default)]
struct Inner {
    workers: Vec<Worker>,
    sections: Vec<Section>,
    holidays: HashSet<NaiveDate>,
    historical_assignments: Vec<Assignment>,
    scenarios: HashMap<Uuid, Scenario>,
    assignments: HashMap<Uuid, Vec<Assignment>>,
    metrics: HashMap<Uuid, Vec<WorkerMetrics>>,
}

/// A plain `Mutex`-guarded `Store`. Real behavior, not a mock:
/// assignments really accumulate and scenarios really transition
/// status. Shared by every integration test and available to any
/// caller that wants to run the engine without a database.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workers(self, workers: Vec<Worker>) -> Self {
        self.inner.lock().expect("lock poisoned").workers = workers;
        self
    }

    pub fn with_sections(self, sections: Vec<Section>) -> Self {
        self.inner.lock().expect("lock poisoned").sections = sections;
        self
    }

    pub fn with_holidays(self, holidays: HashSet<NaiveDate>) -> Self {
        self.inner.lock().expect("lock poisoned").holidays = holidays;
        self
    }

    pub fn with_historical_assignments(self, assignments: Vec<Assignment>) -> Self {
        self.inner.lock().expect("lock poisoned").historical_assignments = assignments;
        self
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_active_workers(&self) -> Result<Vec<Worker>, EngineError> {
        let inner = self.inner.lock().expect("lock poisoned");
        Ok(inner
            .workers
            .iter()
            .filter(|w| w.state == shared::types::WorkerState::Active)
            .cloned()
            .collect())
    }

    async fn list_sections(&self) -> Result<Vec<Section>, EngineError> {
        Ok(self.inner.lock().expect("lock poisoned").sections.clone())
    }

    async fn list_holidays(&self, year: i32) -> Result<HashSet<NaiveDate>, EngineError> {
        let inner = self.inner.lock().expect("lock poisoned");
        Ok(inner.holidays.iter().filter(|d| d.year() == year).copied().collect())
    }

    async fn list_yearly_assignments(&self, year: i32) -> Result<Vec<Assignment>, EngineError> {
        let inner = self.inner.lock().expect("lock poisoned");
        Ok(inner
            .historical_assignments
            .iter()
            .filter(|a| a.date.year() == year)
            .cloned()
            .collect())
    }

    async fn create_scenario(
        &self,
        name: &str,
        created_by: &str,
        year: i32,
        description: &str,
        settings: serde_json::Value,
    ) -> Result<Uuid, EngineError> {
        let mut inner = self.inner.lock().expect("lock poisoned");
        let id = Uuid::new_v4();
        inner.scenarios.insert(
            id,
            Scenario {
                id,
                name: name.to_string(),
                created_by: created_by.to_string(),
                created_at: Utc::now(),
                year,
                status: ScenarioStatus::Draft,
                description: description.to_string(),
                settings_blob: sqlx::types::Json(settings),
            },
        );
        inner.assignments.insert(id, Vec::new());
        Ok(id)
    }

    async fn append_assignments(&self, scenario_id: Uuid, assignments: &[Assignment]) -> Result<(), EngineError> {
        let mut inner = self.inner.lock().expect("lock poisoned");
        inner.assignments.entry(scenario_id).or_default().extend(assignments.iter().cloned());
        inner.historical_assignments.extend(assignments.iter().cloned());
        Ok(())
    }

    async fn write_metrics(&self, scenario_id: Uuid, metrics: &[WorkerMetrics]) -> Result<(), EngineError> {
        let mut inner = self.inner.lock().expect("lock poisoned");
        inner.metrics.insert(scenario_id, metrics.to_vec());
        Ok(())
    }

    async fn mark_incomplete(&self, scenario_id: Uuid) -> Result<(), EngineError> {
        let mut inner = self.inner.lock().expect("lock poisoned");
        if let Some(scenario) = inner.scenarios.get_mut(&scenario_id) {
            scenario.description = format!("{} [incomplete]", scenario.description);
        }
        Ok(())
    }

    async fn publish(&self, scenario_id: Uuid) -> Result<(), EngineError> {
        let mut inner = self.inner.lock().expect("lock poisoned");
        if let Some(scenario) = inner.scenarios.get_mut(&scenario_id)
            && scenario.status == ScenarioStatus::Draft
        {
            scenario.status = ScenarioStatus::Published;
        }
        Ok(())
    }

    async fn archive(&self, scenario_id: Uuid) -> Result<(), EngineError> {
        let mut inner = self.inner.lock().expect("lock poisoned");
        if let Some(scenario) = inner.scenarios.get_mut(&scenario_id)
            && scenario.status == ScenarioStatus::Published
        {
            scenario.status = ScenarioStatus::Archived;
        }
        Ok(())
    }

    async fn clone_scenario(&self, scenario_id: Uuid, new_name: &str) -> Result<Uuid, EngineError> {
        let mut inner = self.inner.lock().expect("lock poisoned");
        let Some(source) = inner.scenarios.get(&scenario_id).cloned() else {
            return Err(EngineError::Infeasible);
        };
        let new_id = Uuid::new_v4();
        inner.scenarios.insert(
            new_id,
            Scenario {
                id: new_id,
                name: new_name.to_string(),
                ..source
            },
        );
        let source_assignments = inner.assignments.get(&scenario_id).cloned().unwrap_or_default();
        inner.assignments.insert(new_id, source_assignments);
        let source_metrics = inner.metrics.get(&scenario_id).cloned().unwrap_or_default();
        inner.metrics.insert(new_id, source_metrics);
        Ok(new_id)
    }

    async fn get_scenario(&self, scenario_id: Uuid) -> Result<Option<Scenario>, EngineError> {
        Ok(self.inner.lock().expect("lock poisoned").scenarios.get(&scenario_id).cloned())
    }

    async fn get_assignments(&self, scenario_id: Uuid) -> Result<Vec<Assignment>, EngineError> {
        Ok(self
            .inner
            .lock()
            .expect("lock poisoned")
            .assignments
            .get(&scenario_id)
            .cloned()
            .unwrap_or_default())
    }
}
