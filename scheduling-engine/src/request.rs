use std::collections::HashMap;

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Input to one `SchedulingEngine::run` call. One run is one period;
/// the caller supplies the period's label rather than the engine
/// inferring biweekly segmentation (§9 Open Questions, resolved).
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub sections_enabled: Vec<String>,
    pub priority_order: HashMap<String, i32>,
    pub created_by: String,
    pub description: String,
    pub period_tag: String,
}

/// Why a run failed. `StoreError` only carries a message: the
/// underlying `sqlx::Error` is not `Clone`, and this variant exists to
/// report failure to a caller, not to be matched on for retry logic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ErrorKind {
    Cancelled,
    ConfigurationError { section: String, weekday: Weekday },
    Infeasible,
    StoreError(String),
}

/// A non-fatal C7 failure: an atomic weekend role that no worker could
/// cover. Recorded, never retried.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeekendRoleFailure {
    pub role: u8,
    pub anchor_date: NaiveDate,
}

/// One line of the search's diagnostic trail. Emitted both as a
/// `tracing` event and appended here, so a caller gets it back as data
/// without scraping logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchLogRecord {
    pub action: String,
    pub date: Option<NaiveDate>,
    pub section: Option<String>,
    pub worker: Option<String>,
    pub reason: Option<String>,
}

impl SearchLogRecord {
    pub fn new(action: &str) -> Self {
        Self {
            action: action.to_string(),
            date: None,
            section: None,
            worker: None,
            reason: None,
        }
    }

    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn worker(mut self, worker: impl Into<String>) -> Self {
        self.worker = Some(worker.into());
        self
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Output of one `SchedulingEngine::run` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub scenario_id: Option<Uuid>,
    pub error_kind: Option<ErrorKind>,
    pub search_log: Vec<SearchLogRecord>,
    pub weekend_role_failures: Vec<WeekendRoleFailure>,
}

impl RunResult {
    pub fn is_success(&self) -> bool {
        self.error_kind.is_none() && self.scenario_id.is_some()
    }

    pub fn is_incomplete(&self) -> bool {
        !self.weekend_role_failures.is_empty()
    }
}
