use chrono::{Datelike, NaiveDate, Weekday};
use shared::types::{required_area, Area, Section, Worker, WorkerState, WEEKDAY_RESTRICTED_SECTIONS};

use crate::domain::availability::AvailabilityMatrices;
use crate::domain::search::TriedCombinations;

fn is_weekday_restricted_weekday(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Mon | Weekday::Tue | Weekday::Wed | Weekday::Thu)
}

/// Rule 4: the weekday-assignment restriction on the five named
/// sections. Split out of `is_eligible` so `could_ever_satisfy` (which
/// ignores availability) can reuse exactly this rule.
fn satisfies_weekday_assignment_rule(worker: &Worker, date: NaiveDate, section: &Section, area: Area) -> bool {
    if !is_weekday_restricted_weekday(date) || !WEEKDAY_RESTRICTED_SECTIONS.contains(&section.name.as_str()) {
        return true;
    }
    worker
        .days_assigned
        .0
        .get(&area)
        .is_some_and(|days| days.contains(&date.weekday()))
}

/// Rules 1, 2, 4 only: whether *some* Active worker could ever cover
/// this shift, ignoring current availability and the tried-memo. Used
/// to distinguish a genuine `ConfigurationError` (no worker, ever)
/// from ordinary backtracking.
pub fn could_ever_satisfy(section: &Section, date: NaiveDate, workers: &[Worker]) -> bool {
    workers.iter().any(|w| matches_configuration_rules(w, date, section))
}

/// Rules 1, 2, 4 for a single worker — the subset `could_ever_satisfy`
/// existentially quantifies over, also used to mark every
/// rules-1/2/4-matching worker as tried when a shift dead-ends.
pub fn matches_configuration_rules(worker: &Worker, date: NaiveDate, section: &Section) -> bool {
    let Some(area) = required_area(&section.name) else {
        return false;
    };
    worker.state == WorkerState::Active
        && worker.has_area(area)
        && satisfies_weekday_assignment_rule(worker, date, section, area)
}

/// Rule 5: assigning `worker` must leave at least 2 other Active
/// workers in the same area with `regular_avail = true` on `date` and
/// (if in-horizon) `date + 1`.
fn satisfies_minimum_staffing(
    worker: &Worker,
    date: NaiveDate,
    area: Area,
    all_workers: &[Worker],
    matrices: &AvailabilityMatrices,
    horizon_end: NaiveDate,
) -> bool {
    let others_available_on = |d: NaiveDate| {
        all_workers
            .iter()
            .filter(|v| v.id != worker.id && v.state == WorkerState::Active && v.has_area(area))
            .filter(|v| matrices.regular_avail(v, d))
            .count()
            >= 2
    };

    if !others_available_on(date) {
        return false;
    }
    let next_day = date + chrono::Duration::days(1);
    if next_day <= horizon_end && !others_available_on(next_day) {
        return false;
    }
    true
}

/// All six rules of §4.3, in order. `frontier_depth` is the current
/// length of the search frontier, used as the (approximate) key
/// component for the tried-combinations memo.
#[allow(clippy::too_many_arguments)]
pub fn is_eligible(
    worker: &Worker,
    date: NaiveDate,
    section: &Section,
    all_workers: &[Worker],
    matrices: &AvailabilityMatrices,
    tried: &TriedCombinations,
    frontier_depth: usize,
    horizon_end: NaiveDate,
) -> bool {
    if worker.state != WorkerState::Active {
        return false;
    }
    let Some(area) = required_area(&section.name) else {
        return false;
    };
    if !worker.has_area(area) {
        return false;
    }
    if !matrices.shift_avail(worker, date) {
        return false;
    }
    if !satisfies_weekday_assignment_rule(worker, date, section, area) {
        return false;
    }
    if section.is_regular()
        && is_weekday_restricted_weekday(date)
        && !satisfies_minimum_staffing(worker, date, area, all_workers, matrices, horizon_end)
    {
        return false;
    }
    if tried.contains(frontier_depth, date, &section.name, worker.id) {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use uuid::Uuid;

    fn active_worker(areas: &[Area]) -> Worker {
        Worker {
            id: Uuid::new_v4(),
            name: "Eligible Worker".to_string(),
            initials: "EW".to_string(),
            birth_year: 1985,
            category: "staff".to_string(),
            state: WorkerState::Active,
            areas: sqlx::types::Json(areas.iter().copied().collect()),
            days_assigned: sqlx::types::Json(HashMap::new()),
            avoid_days: sqlx::types::Json(HashSet::new()),
            ooo_days: sqlx::types::Json(HashSet::new()),
            available_work_hours: 160.0,
            available_guard_hours: 80.0,
            fte_pct: 1.0,
            regular_workdays: sqlx::types::Json(HashSet::new()),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    fn section(name: &str) -> Section {
        Section {
            id: Uuid::new_v4(),
            name: name.to_string(),
            hours: 12.0,
            days: sqlx::types::Json(HashSet::new()),
            personal: 1,
            libra: false,
            fechas: sqlx::types::Json(None),
            is_night: shared::types::derive_is_night(name),
        }
    }

    #[test]
    fn inactive_worker_is_never_eligible() {
        let mut worker = active_worker(&[Area::Hems]);
        worker.state = WorkerState::Inactive;
        let sect = section("HEMS_tarde");
        let matrices = AvailabilityMatrices::new();
        let tried = TriedCombinations::new();
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let horizon_end = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        assert!(!is_eligible(&worker, date, &sect, &[worker.clone()], &matrices, &tried, 0, horizon_end));
    }

    #[test]
    fn missing_area_is_ineligible() {
        let worker = active_worker(&[Area::Coordis]);
        let sect = section("HEMS_tarde");
        let matrices = AvailabilityMatrices::new();
        let tried = TriedCombinations::new();
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let horizon_end = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        assert!(!is_eligible(&worker, date, &sect, &[worker.clone()], &matrices, &tried, 0, horizon_end));
    }

    #[test]
    fn weekday_restricted_section_requires_days_assigned_entry() {
        let mut worker = active_worker(&[Area::GuardiaUci]);
        let sect = section("UCI_G_lab");
        let monday = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let horizon_end = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        let matrices = AvailabilityMatrices::new();
        let tried = TriedCombinations::new();
        assert!(!is_eligible(&worker, monday, &sect, &[worker.clone()], &matrices, &tried, 0, horizon_end));

        worker
            .days_assigned
            .0
            .insert(Area::GuardiaUci, HashSet::from([Weekday::Mon]));
        assert!(is_eligible(&worker, monday, &sect, &[worker.clone()], &matrices, &tried, 0, horizon_end));
    }

    #[test]
    fn could_ever_satisfy_ignores_availability_but_not_area() {
        let worker = active_worker(&[Area::Coordis]);
        let sect = section("HEMS_tarde");
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        assert!(!could_ever_satisfy(&sect, date, &[worker]));
    }
}
