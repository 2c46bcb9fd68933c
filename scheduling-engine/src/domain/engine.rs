use std::collections::HashMap;
use std::sync::Arc;

use chrono::Datelike;
use tracing::Instrument;

use crate::config::{DEFAULT_SECTION_PRIORITY, SchedulingConfig};
use crate::domain::calendar;
use crate::domain::enumerator;
use crate::domain::search::{self, CancelFlag, SearchFailure, SearchState};
use crate::domain::store::Store;
use crate::domain::weekend_rotation;
use crate::request::{ErrorKind, RunRequest, RunResult};

/// Top-level orchestrator: reads `Store` once, drives C1-C8, writes
/// `Store` once, returns a `RunResult`. Mirrors the shape of the
/// teacher's `SchedulingService`, minus job submission/recovery (this
/// engine is invoked directly, not as a background job).
pub struct SchedulingEngine {
    store: Arc<dyn Store>,
    config: SchedulingConfig,
}

impl SchedulingEngine {
    pub fn new(store: Arc<dyn Store>, config: SchedulingConfig) -> Self {
        Self { store, config }
    }

    #[tracing::instrument(skip(self, request, cancel))]
    pub async fn run(&self, request: RunRequest, cancel: CancelFlag) -> RunResult {
        let span = tracing::info_span!("scheduling_run", start = %request.start_date, end = %request.end_date);
        self.run_inner(request, cancel).instrument(span).await
    }

    async fn run_inner(&self, request: RunRequest, cancel: CancelFlag) -> RunResult {
        let empty_result = |error_kind: ErrorKind| RunResult {
            scenario_id: None,
            error_kind: Some(error_kind),
            search_log: Vec::new(),
            weekend_role_failures: Vec::new(),
        };

        let workers = match self.store.list_active_workers().await {
            Ok(workers) => workers,
            Err(e) => return empty_result(ErrorKind::StoreError(e.to_string())),
        };
        let all_sections = match self.store.list_sections().await {
            Ok(sections) => sections,
            Err(e) => return empty_result(ErrorKind::StoreError(e.to_string())),
        };
        let year = request.start_date.year();
        let holidays = match self.store.list_holidays(year).await {
            Ok(holidays) => holidays,
            Err(e) => return empty_result(ErrorKind::StoreError(e.to_string())),
        };
        let yearly_assignments = match self.store.list_yearly_assignments(year).await {
            Ok(assignments) => assignments,
            Err(e) => return empty_result(ErrorKind::StoreError(e.to_string())),
        };

        let sections: Vec<_> = if request.sections_enabled.is_empty() {
            all_sections
        } else {
            all_sections
                .into_iter()
                .filter(|s| request.sections_enabled.contains(&s.name))
                .collect()
        };
        let sections_by_name: HashMap<String, shared::types::Section> =
            sections.iter().map(|s| (s.name.clone(), s.clone())).collect();

        let mut priority_order = self.config.priority_order.clone();
        priority_order.extend(request.priority_order.clone());

        let calendar_days = calendar::expand(request.start_date, request.end_date, &holidays);
        let enumerated = enumerator::enumerate(&calendar_days, &sections, &priority_order, DEFAULT_SECTION_PRIORITY);

        let mut state = SearchState::new(&workers, &sections_by_name, request.end_date);
        state.ledger.seed_yearly(&yearly_assignments, |name| {
            sections_by_name.get(name).map(|s| s.is_night).unwrap_or(false)
        });

        let coefficients = self.config.versatility_coefficients;

        let mut regular_assignments =
            match search::run_regular_stream(&mut state, &enumerated.regular_stream, &coefficients, &cancel).await {
                Ok(assignments) => assignments,
                Err(failure) => return Self::failure_result(failure, state),
            };

        let (weekend_assignments, weekend_role_failures) = weekend_rotation::run(
            &mut state,
            &enumerated.urg_weekend_buckets,
            &coefficients,
            &self.config.special_workers,
        );

        let mut urg_lab_assignments = match search::run_urg_lab_stream(
            &mut state,
            &enumerated.urg_lab_stream,
            &coefficients,
            &self.config.special_workers,
            &cancel,
        )
        .await
        {
            Ok(assignments) => assignments,
            Err(failure) => return Self::failure_result(failure, state),
        };

        let mut all_assignments = Vec::with_capacity(
            regular_assignments.len() + weekend_assignments.len() + urg_lab_assignments.len(),
        );
        all_assignments.append(&mut regular_assignments);
        all_assignments.extend(weekend_assignments);
        all_assignments.append(&mut urg_lab_assignments);

        let settings = serde_json::json!({ "period_tag": request.period_tag });
        let scenario_id = match self
            .store
            .create_scenario(
                &format!("{} {}", request.period_tag, request.start_date),
                &request.created_by,
                year,
                &request.description,
                settings,
            )
            .await
        {
            Ok(id) => id,
            Err(e) => return empty_result(ErrorKind::StoreError(e.to_string())),
        };

        for assignment in &mut all_assignments {
            assignment.scenario_id = scenario_id;
            assignment.period_tag = request.period_tag.clone();
        }

        if let Err(e) = self.store.append_assignments(scenario_id, &all_assignments).await {
            return empty_result(ErrorKind::StoreError(e.to_string()));
        }
        if let Err(e) = self.store.write_metrics(scenario_id, &state.ledger.all_metrics()).await {
            return empty_result(ErrorKind::StoreError(e.to_string()));
        }
        if !weekend_role_failures.is_empty()
            && let Err(e) = self.store.mark_incomplete(scenario_id).await
        {
            return empty_result(ErrorKind::StoreError(e.to_string()));
        }

        RunResult {
            scenario_id: Some(scenario_id),
            error_kind: None,
            search_log: state.log,
            weekend_role_failures,
        }
    }

    fn failure_result(failure: SearchFailure, state: SearchState<'_>) -> RunResult {
        let error_kind = match failure {
            SearchFailure::Configuration { section, weekday } => ErrorKind::ConfigurationError { section, weekday },
            SearchFailure::Infeasible => ErrorKind::Infeasible,
            SearchFailure::Cancelled => ErrorKind::Cancelled,
        };
        RunResult {
            scenario_id: None,
            error_kind: Some(error_kind),
            search_log: state.log,
            weekend_role_failures: Vec::new(),
        }
    }
}
