use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};
use shared::types::{Assignment, Worker};
use uuid::Uuid;

use crate::config::{SpecialWorkerNames, VersatilityCoefficients};
use crate::domain::enumerator::{ShiftInstance, URG_REFUERZO_SECTION};
use crate::domain::fairness;
use crate::domain::search::SearchState;
use crate::request::{SearchLogRecord, WeekendRoleFailure};

const TARDE_NOCHE: &str = "Urg_G_tarde-noche_l";
const FESTIVO_MANANA: &str = "Urg_G_festivo_mañana";
const FESTIVO_NOCHE: &str = "Urg_G_festivo_noche";

/// The "leftover reinforcement could not be placed" case doesn't
/// correspond to one of the three rotation roles; reported under a
/// fourth role id so it still surfaces in `weekend_role_failures`.
const REFUERZO_LEFTOVER_ROLE: u8 = 3;

fn partition_bucket<'a>(shifts: &'a [ShiftInstance]) -> (Vec<&'a ShiftInstance>, Vec<&'a ShiftInstance>, Vec<&'a ShiftInstance>, Vec<&'a ShiftInstance>) {
    let mut role0 = Vec::new();
    let mut role1 = Vec::new();
    let mut role2 = Vec::new();
    let mut refuerzo = Vec::new();

    for shift in shifts {
        match (shift.section_name.as_str(), shift.date.weekday()) {
            (URG_REFUERZO_SECTION, _) => refuerzo.push(shift),
            (TARDE_NOCHE, Weekday::Fri) => role0.push(shift),
            (FESTIVO_MANANA, Weekday::Sun) => role0.push(shift),
            (FESTIVO_MANANA, Weekday::Sat) => role1.push(shift),
            (FESTIVO_NOCHE, Weekday::Sun) => role1.push(shift),
            (FESTIVO_NOCHE, Weekday::Sat) => role2.push(shift),
            _ => {}
        }
    }

    (role0, role1, role2, refuerzo)
}

fn is_first_friday_of_month(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Fri && date.day() <= 7
}

fn commit_role(
    state: &mut SearchState<'_>,
    worker: &Worker,
    shifts: &[&ShiftInstance],
    committed: &mut Vec<Assignment>,
) {
    for shift in shifts {
        let section = state
            .sections_by_name
            .get(&shift.section_name)
            .expect("role shift must reference a known section");
        let assignment = Assignment {
            id: Uuid::new_v4(),
            scenario_id: Uuid::nil(),
            date: shift.date,
            day_of_week: shift.date.weekday(),
            section_name: shift.section_name.clone(),
            worker_id: worker.id,
            worker_name: worker.name.clone(),
            hours: shift.hours,
            libra: shift.libra,
            is_holiday: shift.is_holiday,
            is_weekend: shift.is_weekend,
            period_tag: String::new(),
            copy_ix: shift.copy_ix,
        };
        state.matrices.record_assignment(&assignment, section, worker, state.horizon_end);
        state.ledger.commit(&assignment, section.is_night);
        state.log.push(
            SearchLogRecord::new("success")
                .date(shift.date)
                .section(shift.section_name.clone())
                .worker(worker.name.clone()),
        );
        committed.push(assignment);
    }
}

fn fully_available<'a>(state: &SearchState<'_>, pool: &[&'a Worker], shifts: &[&ShiftInstance]) -> Vec<&'a Worker> {
    pool.iter()
        .copied()
        .filter(|w| shifts.iter().all(|s| state.matrices.shift_avail(w, s.date)))
        .collect()
}

fn pick_for_role(
    state: &SearchState<'_>,
    shifts: &[&ShiftInstance],
    preferred: &[&Worker],
    all_urg: &[&Worker],
    coefficients: &VersatilityCoefficients,
) -> Option<Uuid> {
    if shifts.is_empty() {
        return None;
    }
    let preferred_pool = fully_available(state, preferred, shifts);
    let pool = if !preferred_pool.is_empty() {
        preferred_pool
    } else {
        fully_available(state, all_urg, shifts)
    };
    if pool.is_empty() {
        return None;
    }
    let first = shifts[0];
    Some(fairness::best_worker(&pool, first.date, &first.section_name, &state.ledger, coefficients).id)
}

/// Runs C7 for every weekend bucket, anchor date ascending. Does not
/// backtrack: an atomic role with no fully-available worker is simply
/// left unassigned and reported as a `WeekendRoleFailure`.
pub fn run(
    state: &mut SearchState<'_>,
    buckets: &BTreeMap<NaiveDate, Vec<ShiftInstance>>,
    coefficients: &VersatilityCoefficients,
    special_workers: &SpecialWorkerNames,
) -> (Vec<Assignment>, Vec<WeekendRoleFailure>) {
    let mut committed = Vec::new();
    let mut failures = Vec::new();

    let mut urg_workers: Vec<&Worker> = state
        .workers
        .iter()
        .filter(|w| w.state == shared::types::WorkerState::Active && w.has_area(shared::types::Area::GuardiaUrg))
        .collect();
    urg_workers.sort_by(|a, b| a.name.cmp(&b.name));

    for (&anchor, shifts) in buckets {
        let (mut role0, role1, role2, mut refuerzo) = partition_bucket(shifts);

        if is_first_friday_of_month(anchor) {
            if let Some(lead) = state.workers.iter().find(|w| w.name == special_workers.first_friday_lead) {
                if fully_available(state, &[lead], &role0).len() == 1 {
                    let shifts_owned = role0.clone();
                    commit_role(state, lead, &shifts_owned, &mut committed);
                    role0.clear();
                }
            }

            if let Some((idx, _)) = refuerzo.iter().enumerate().next() {
                let candidates: Vec<&Worker> = urg_workers
                    .iter()
                    .copied()
                    .filter(|w| w.name != special_workers.first_friday_lead)
                    .collect();
                let leftover_shift = [refuerzo[idx]];
                if let Some(worker_id) = pick_for_role(state, &leftover_shift, &candidates, &candidates, coefficients) {
                    let worker = state.workers.iter().find(|w| w.id == worker_id).expect("picked worker must exist");
                    commit_role(state, worker, &leftover_shift, &mut committed);
                    refuerzo.remove(idx);
                }
            }
        }

        let o = (anchor.month() as i32 - 1).rem_euclid(3) as usize;
        for (role_id, role_shifts) in [(0u8, &role0), (1u8, &role1), (2u8, &role2)] {
            if role_shifts.is_empty() {
                continue;
            }
            let preferred: Vec<&Worker> = urg_workers
                .iter()
                .copied()
                .enumerate()
                .filter(|(i, _)| (i + o) % 3 == role_id as usize)
                .map(|(_, w)| w)
                .collect();

            match pick_for_role(state, role_shifts, &preferred, &urg_workers, coefficients) {
                Some(worker_id) => {
                    let worker = state.workers.iter().find(|w| w.id == worker_id).expect("picked worker must exist");
                    commit_role(state, worker, role_shifts, &mut committed);
                }
                None => {
                    state.log.push(
                        SearchLogRecord::new("backtrack")
                            .date(anchor)
                            .reason(format!("weekend role {role_id} unassignable")),
                    );
                    failures.push(WeekendRoleFailure { role: role_id, anchor_date: anchor });
                }
            }
        }

        for shift in &refuerzo {
            match pick_for_role(state, std::slice::from_ref(shift), &urg_workers, &urg_workers, coefficients) {
                Some(worker_id) => {
                    let worker = state.workers.iter().find(|w| w.id == worker_id).expect("picked worker must exist");
                    commit_role(state, worker, std::slice::from_ref(shift), &mut committed);
                }
                None => failures.push(WeekendRoleFailure { role: REFUERZO_LEFTOVER_ROLE, anchor_date: anchor }),
            }
        }
    }

    (committed, failures)
}
