use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use chrono::{Datelike, NaiveDate, Weekday};
use shared::types::{Assignment, Section, Worker};
use uuid::Uuid;

use crate::config::{SpecialWorkerNames, VersatilityCoefficients};
use crate::domain::availability::AvailabilityMatrices;
use crate::domain::eligibility;
use crate::domain::enumerator::ShiftInstance;
use crate::domain::fairness;
use crate::domain::metrics::MetricsLedger;
use crate::request::SearchLogRecord;

/// Cooperative cancellation point, checked at the top of every search
/// iteration. Flipping it from outside the engine (e.g. a
/// `tokio::select!` arm racing a deadline) causes the next iteration
/// to return `Cancelled` cleanly; there is no engine-imposed timeout.
pub type CancelFlag = Arc<AtomicBool>;

/// Memo of forbidden `(frontier_depth, date, section, worker)` tuples.
/// Keyed by `frontier_depth` rather than the literal path prefix — a
/// deliberate, spec-endorsed approximation that trades perfect
/// precision for O(1) key construction. Monotone non-shrinking: once
/// inserted, a tuple is never removed, even across backtracks.
#[derive(Debug, Default)]
pub struct TriedCombinations {
    set: HashSet<(usize, NaiveDate, String, Uuid)>,
}

impl TriedCombinations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, depth: usize, date: NaiveDate, section: &str, worker_id: Uuid) {
        self.set.insert((depth, date, section.to_string(), worker_id));
    }

    pub fn contains(&self, depth: usize, date: NaiveDate, section: &str, worker_id: Uuid) -> bool {
        self.set.contains(&(depth, date, section.to_string(), worker_id))
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}

struct FrontierEntry {
    assignment: Assignment,
    matrices_mark: usize,
}

#[derive(Debug)]
pub enum SearchFailure {
    Configuration { section: String, weekday: Weekday },
    Infeasible,
    Cancelled,
}

/// The mutable state C6 and C7 share across the Regular, Urg-weekend,
/// and Urg-lab phases of one run: the availability matrices, the
/// metrics ledger, the tried-combinations memo, and the diagnostic
/// log. Carrying it as one struct (rather than four loose parameters)
/// keeps `SchedulingEngine::run`'s phase handoff to a single borrow.
pub struct SearchState<'a> {
    pub workers: &'a [Worker],
    pub sections_by_name: &'a HashMap<String, Section>,
    pub horizon_end: NaiveDate,
    pub matrices: AvailabilityMatrices,
    pub ledger: MetricsLedger,
    pub tried: TriedCombinations,
    pub log: Vec<SearchLogRecord>,
}

impl<'a> SearchState<'a> {
    pub fn new(workers: &'a [Worker], sections_by_name: &'a HashMap<String, Section>, horizon_end: NaiveDate) -> Self {
        Self {
            workers,
            sections_by_name,
            horizon_end,
            matrices: AvailabilityMatrices::new(),
            ledger: MetricsLedger::new(),
            tried: TriedCombinations::new(),
            log: Vec::new(),
        }
    }

    fn worker(&self, id: Uuid) -> &Worker {
        self.workers.iter().find(|w| w.id == id).expect("worker id must resolve")
    }
}

/// Runs the Regular stream: the first backtracking pass, which must
/// complete fully or the entire scenario fails.
pub async fn run_regular_stream(
    state: &mut SearchState<'_>,
    stream: &[ShiftInstance],
    coefficients: &VersatilityCoefficients,
    cancel: &CancelFlag,
) -> Result<Vec<Assignment>, SearchFailure> {
    run_stream(state, stream, coefficients, None, cancel).await
}

/// Runs the Urg-lab stream, with the Monday carry-over override.
pub async fn run_urg_lab_stream(
    state: &mut SearchState<'_>,
    stream: &[ShiftInstance],
    coefficients: &VersatilityCoefficients,
    special_workers: &SpecialWorkerNames,
    cancel: &CancelFlag,
) -> Result<Vec<Assignment>, SearchFailure> {
    run_stream(state, stream, coefficients, Some(special_workers), cancel).await
}

fn monday_carryover_override(
    state: &SearchState<'_>,
    instance: &ShiftInstance,
    names: &SpecialWorkerNames,
) -> Option<Uuid> {
    if instance.section_name != crate::domain::enumerator::URG_LAB_SECTION
        || instance.date.weekday() != Weekday::Mon
    {
        return None;
    }

    let prior_saturday = instance.date - chrono::Duration::days(2);
    let prior_sunday = instance.date - chrono::Duration::days(1);

    let had_weekend_night = |name: &str| {
        state.workers.iter().find(|w| w.name == name).is_some_and(|w| {
            [prior_saturday, prior_sunday].iter().any(|&day| {
                state.ledger.assignments_on(w.id, day).any(|a| {
                    state
                        .sections_by_name
                        .get(&a.section_name)
                        .is_some_and(|section| section.is_night)
                })
            })
        })
    };

    if !had_weekend_night(&names.monday_carryover_night_a) && !had_weekend_night(&names.monday_carryover_night_b) {
        return None;
    }

    let fallback = state.workers.iter().find(|w| w.name == names.monday_carryover_fallback)?;
    let section = state.sections_by_name.get(&instance.section_name)?;
    eligibility::is_eligible(
        fallback,
        instance.date,
        section,
        state.workers,
        &state.matrices,
        &state.tried,
        0,
        state.horizon_end,
    )
    .then_some(fallback.id)
}

async fn run_stream(
    state: &mut SearchState<'_>,
    stream: &[ShiftInstance],
    coefficients: &VersatilityCoefficients,
    special_workers: Option<&SpecialWorkerNames>,
    cancel: &CancelFlag,
) -> Result<Vec<Assignment>, SearchFailure> {
    let mut frontier: Vec<FrontierEntry> = Vec::new();
    let mut committed: Vec<Assignment> = Vec::new();
    let mut i = 0usize;

    while i < stream.len() {
        tokio::task::yield_now().await;
        if cancel.load(AtomicOrdering::Relaxed) {
            return Err(SearchFailure::Cancelled);
        }

        let instance = &stream[i];
        let section = state
            .sections_by_name
            .get(&instance.section_name)
            .expect("enumerated instance must reference a known section");
        let depth = frontier.len();

        state.log.push(
            SearchLogRecord::new("processing")
                .date(instance.date)
                .section(section.name.clone()),
        );

        let forced = special_workers.and_then(|names| monday_carryover_override(state, instance, names));

        let eligible: Vec<&Worker> = state
            .workers
            .iter()
            .filter(|w| {
                eligibility::is_eligible(w, instance.date, section, state.workers, &state.matrices, &state.tried, depth, state.horizon_end)
            })
            .collect();

        state.log.push(
            SearchLogRecord::new("eligible")
                .date(instance.date)
                .section(section.name.clone())
                .reason(format!("{} candidates", eligible.len())),
        );

        let chosen_id = match forced {
            Some(id) => Some(id),
            None if eligible.is_empty() => None,
            None => Some(fairness::best_worker(&eligible, instance.date, &section.name, &state.ledger, coefficients).id),
        };

        match chosen_id {
            Some(worker_id) => {
                let worker = state.worker(worker_id);
                let mark = state.matrices.snapshot();
                let assignment = Assignment {
                    id: Uuid::new_v4(),
                    scenario_id: Uuid::nil(),
                    date: instance.date,
                    day_of_week: instance.date.weekday(),
                    section_name: section.name.clone(),
                    worker_id: worker.id,
                    worker_name: worker.name.clone(),
                    hours: instance.hours,
                    libra: instance.libra,
                    is_holiday: instance.is_holiday,
                    is_weekend: instance.is_weekend,
                    period_tag: String::new(),
                    copy_ix: instance.copy_ix,
                };
                state.matrices.record_assignment(&assignment, section, worker, state.horizon_end);
                state.ledger.commit(&assignment, section.is_night);
                state.tried.insert(depth, instance.date, &section.name, worker.id);

                state.log.push(
                    SearchLogRecord::new("success")
                        .date(instance.date)
                        .section(section.name.clone())
                        .worker(worker.name.clone()),
                );

                frontier.push(FrontierEntry { assignment: assignment.clone(), matrices_mark: mark });
                committed.push(assignment);
                i += 1;
            }
            None => {
                if !eligibility::could_ever_satisfy(section, instance.date, state.workers) {
                    return Err(SearchFailure::Configuration {
                        section: section.name.clone(),
                        weekday: instance.date.weekday(),
                    });
                }

                for worker in state.workers {
                    if eligibility::matches_configuration_rules(worker, instance.date, section) {
                        state.tried.insert(depth, instance.date, &section.name, worker.id);
                    }
                }

                state.log.push(
                    SearchLogRecord::new("backtrack")
                        .date(instance.date)
                        .section(section.name.clone())
                        .reason("no eligible worker".to_string()),
                );

                match frontier.pop() {
                    None => return Err(SearchFailure::Infeasible),
                    Some(entry) => {
                        state.matrices.restore(entry.matrices_mark);
                        let undone_section = state.sections_by_name.get(&entry.assignment.section_name);
                        let is_night = undone_section.map(|s| s.is_night).unwrap_or(false);
                        state.ledger.undo(&entry.assignment, is_night);
                        committed.pop();
                        i -= 1;
                    }
                }
            }
        }
    }

    Ok(committed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tried_combinations_never_shrinks() {
        let mut tried = TriedCombinations::new();
        let worker_id = Uuid::new_v4();
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        tried.insert(0, date, "HEMS_tarde", worker_id);
        assert_eq!(tried.len(), 1);
        tried.insert(0, date, "HEMS_tarde", worker_id);
        assert_eq!(tried.len(), 1, "re-inserting the same tuple must not grow the memo");
        assert!(tried.contains(0, date, "HEMS_tarde", worker_id));
    }

    #[test]
    fn distinct_depths_are_distinct_keys() {
        let mut tried = TriedCombinations::new();
        let worker_id = Uuid::new_v4();
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        tried.insert(0, date, "HEMS_tarde", worker_id);
        tried.insert(1, date, "HEMS_tarde", worker_id);
        assert_eq!(tried.len(), 2);
    }
}
