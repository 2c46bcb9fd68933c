use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use shared::types::{Assignment, MetricCounters, WorkerMetrics};
use uuid::Uuid;

/// Period-and-yearly counters per worker, updated atomically with
/// Assignments and rolled back in lockstep during backtracking undo.
/// Also keeps the chronological per-worker assignment history the
/// fairness scorer needs for "longest ago" and recent-window queries
/// — those are not expressible from the counters alone.
#[derive(Debug, Default)]
pub struct MetricsLedger {
    counters: HashMap<Uuid, WorkerMetrics>,
    history: HashMap<Uuid, Vec<Assignment>>,
}

impl MetricsLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds yearly counters and history from assignments already on
    /// record before this run started (so "longest ago" queries see
    /// shifts outside the current horizon too).
    pub fn seed_yearly(&mut self, prior_assignments: &[Assignment], is_night: impl Fn(&str) -> bool) {
        for assignment in prior_assignments {
            let night = is_night(&assignment.section_name);
            let metrics = self.counters.entry(assignment.worker_id).or_insert_with(|| WorkerMetrics {
                worker_id: assignment.worker_id,
                ..Default::default()
            });
            metrics.yearly.add(assignment, night);
            self.history.entry(assignment.worker_id).or_default().push(assignment.clone());
        }
    }

    pub fn commit(&mut self, assignment: &Assignment, is_night: bool) {
        let metrics = self.counters.entry(assignment.worker_id).or_insert_with(|| WorkerMetrics {
            worker_id: assignment.worker_id,
            ..Default::default()
        });
        metrics.period.add(assignment, is_night);
        metrics.yearly.add(assignment, is_night);
        self.history.entry(assignment.worker_id).or_default().push(assignment.clone());
    }

    /// Undoes the most recent commit for this worker. Callers must
    /// undo in exact reverse-commit order, matching the backtracking
    /// stack discipline.
    pub fn undo(&mut self, assignment: &Assignment, is_night: bool) {
        if let Some(metrics) = self.counters.get_mut(&assignment.worker_id) {
            metrics.period.subtract(assignment, is_night);
            metrics.yearly.subtract(assignment, is_night);
        }
        if let Some(history) = self.history.get_mut(&assignment.worker_id) {
            history.pop();
        }
    }

    pub fn period_shifts(&self, worker_id: Uuid) -> u32 {
        self.counters.get(&worker_id).map(|m| m.period.total_shifts).unwrap_or(0)
    }

    /// Date of this worker's most recent assignment to `section_name`,
    /// or `None` if never assigned (treated as "infinitely long ago").
    pub fn last_assigned(&self, worker_id: Uuid, section_name: &str) -> Option<NaiveDate> {
        self.history
            .get(&worker_id)
            .into_iter()
            .flatten()
            .filter(|a| a.section_name == section_name)
            .map(|a| a.date)
            .max()
    }

    /// This worker's assignments on a single date, if any.
    pub fn assignments_on(&self, worker_id: Uuid, date: NaiveDate) -> impl Iterator<Item = &Assignment> {
        self.history.get(&worker_id).into_iter().flatten().filter(move |a| a.date == date)
    }

    /// Count of this worker's assignments whose section name starts
    /// with `section_prefix`, within the calendar month of `around`
    /// and the preceding one.
    pub fn recent_count(&self, worker_id: Uuid, section_prefix: &str, around: NaiveDate) -> u32 {
        self.recent_matching(worker_id, section_prefix, around).count() as u32
    }

    pub fn recent_hours(&self, worker_id: Uuid, section_prefix: &str, around: NaiveDate) -> f64 {
        self.recent_matching(worker_id, section_prefix, around).map(|a| a.hours).sum()
    }

    fn recent_matching<'a>(
        &'a self,
        worker_id: Uuid,
        section_prefix: &'a str,
        around: NaiveDate,
    ) -> impl Iterator<Item = &'a Assignment> {
        let (current_year, current_month) = (around.year(), around.month());
        let (prev_year, prev_month) = if current_month == 1 {
            (current_year - 1, 12)
        } else {
            (current_year, current_month - 1)
        };
        self.history
            .get(&worker_id)
            .into_iter()
            .flatten()
            .filter(move |a| a.section_name.starts_with(section_prefix))
            .filter(move |a| {
                (a.date.year() == current_year && a.date.month() == current_month)
                    || (a.date.year() == prev_year && a.date.month() == prev_month)
            })
    }

    /// Folds the full Assignment set from scratch and compares against
    /// the ledger's running counters (invariant P6).
    pub fn matches_fold_of(&self, assignments: &[Assignment], is_night: impl Fn(&str) -> bool) -> bool {
        let mut expected: HashMap<Uuid, MetricCounters> = HashMap::new();
        for assignment in assignments {
            let counters = expected.entry(assignment.worker_id).or_default();
            counters.add(assignment, is_night(&assignment.section_name));
        }
        expected.iter().all(|(worker_id, counters)| {
            self.counters
                .get(worker_id)
                .map(|m| &m.period == counters || &m.yearly == counters)
                .unwrap_or(false)
        })
    }

    pub fn snapshot_for(&self, worker_id: Uuid) -> WorkerMetrics {
        self.counters.get(&worker_id).cloned().unwrap_or(WorkerMetrics {
            worker_id,
            ..Default::default()
        })
    }

    pub fn all_metrics(&self) -> Vec<WorkerMetrics> {
        self.counters.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(worker_id: Uuid, date: NaiveDate, section_name: &str, hours: f64) -> Assignment {
        Assignment {
            id: Uuid::new_v4(),
            scenario_id: Uuid::new_v4(),
            date,
            day_of_week: date.weekday(),
            section_name: section_name.to_string(),
            worker_id,
            worker_name: "Worker".to_string(),
            hours,
            libra: false,
            is_holiday: false,
            is_weekend: false,
            period_tag: "2026-01".to_string(),
            copy_ix: 0,
        }
    }

    #[test]
    fn commit_then_undo_restores_zero() {
        let mut ledger = MetricsLedger::new();
        let worker_id = Uuid::new_v4();
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let assignment = assignment(worker_id, date, "HEMS_tarde", 12.0);
        ledger.commit(&assignment, false);
        assert_eq!(ledger.period_shifts(worker_id), 1);
        ledger.undo(&assignment, false);
        assert_eq!(ledger.period_shifts(worker_id), 0);
    }

    #[test]
    fn last_assigned_tracks_the_most_recent_matching_section() {
        let mut ledger = MetricsLedger::new();
        let worker_id = Uuid::new_v4();
        let earlier = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let later = NaiveDate::from_ymd_opt(2026, 1, 19).unwrap();
        ledger.commit(&assignment(worker_id, earlier, "UCI_G_festivo", 24.0), false);
        ledger.commit(&assignment(worker_id, later, "UCI_G_festivo", 24.0), false);
        assert_eq!(ledger.last_assigned(worker_id, "UCI_G_festivo"), Some(later));
    }

    #[test]
    fn never_assigned_is_none() {
        let ledger = MetricsLedger::new();
        assert_eq!(ledger.last_assigned(Uuid::new_v4(), "UCI_G_festivo"), None);
    }

    #[test]
    fn recent_count_spans_current_and_previous_month_only() {
        let mut ledger = MetricsLedger::new();
        let worker_id = Uuid::new_v4();
        let in_window = NaiveDate::from_ymd_opt(2026, 1, 20).unwrap();
        let out_of_window = NaiveDate::from_ymd_opt(2025, 11, 20).unwrap();
        ledger.commit(&assignment(worker_id, in_window, "UCI_G_lab", 12.0), false);
        ledger.commit(&assignment(worker_id, out_of_window, "UCI_G_lab", 12.0), false);
        let around = NaiveDate::from_ymd_opt(2026, 1, 25).unwrap();
        assert_eq!(ledger.recent_count(worker_id, "UCI_G_", around), 1);
    }

    #[test]
    fn fold_matches_running_counters() {
        let mut ledger = MetricsLedger::new();
        let worker_id = Uuid::new_v4();
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let a = assignment(worker_id, date, "HEMS_tarde", 12.0);
        ledger.commit(&a, false);
        assert!(ledger.matches_fold_of(&[a], |_| false));
    }
}
