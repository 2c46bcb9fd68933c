use chrono::NaiveDate;
use shared::types::{Area, Worker};

use crate::config::VersatilityCoefficients;
use crate::domain::metrics::MetricsLedger;

/// Per-section scoring strategy (§4.4), modeled as a tagged variant
/// rather than conditionals scattered across call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringPolicy {
    LongestAgoSame,
    LongestAgoSameByAge,
    VersatilityWeightedUci,
    PeriodShiftCount,
}

pub fn policy_for(section_name: &str) -> ScoringPolicy {
    match section_name {
        "UCI_G_festivo" => ScoringPolicy::LongestAgoSame,
        "Urg_G_noche_l" | "Urg_G_festivo_mañana" | "Urg_G_festivo_noche" | "Urg_G_refuerzo_fyf" => {
            ScoringPolicy::LongestAgoSameByAge
        }
        "UCI_G_lab" => ScoringPolicy::VersatilityWeightedUci,
        _ => ScoringPolicy::PeriodShiftCount,
    }
}

const UCI_VERSATILITY_AREAS: [Area; 4] = [Area::GuardiaUci, Area::Hems, Area::Coordis, Area::GuardiaUrg];

fn versatility(worker: &Worker) -> u32 {
    UCI_VERSATILITY_AREAS.iter().filter(|area| worker.has_area(**area)).count() as u32
}

fn days_since(ledger: &MetricsLedger, worker_id: uuid::Uuid, section_name: &str, date: NaiveDate) -> i64 {
    match ledger.last_assigned(worker_id, section_name) {
        Some(last) => (date - last).num_days(),
        None => i64::MAX,
    }
}

fn versatility_weighted_score(
    worker: &Worker,
    date: NaiveDate,
    ledger: &MetricsLedger,
    coefficients: &VersatilityCoefficients,
) -> f64 {
    let v = versatility(worker).max(1) as f64;
    let u = ledger.recent_count(worker.id, "UCI_G_", date) as f64;
    let n_recent = ledger.recent_count(worker.id, "", date) as f64;
    let h_recent = ledger.recent_hours(worker.id, "", date);
    let period_shifts = ledger.period_shifts(worker.id) as f64;

    if v == 1.0 {
        -coefficients.uci_only_usage_weight * u * (1.0 / v)
            - coefficients.uci_only_recent_count_weight * n_recent
            - coefficients.uci_only_recent_hours_weight * h_recent
            - coefficients.uci_only_period_shifts_weight * period_shifts
    } else {
        -coefficients.versatile_usage_weight * u * (1.0 / v)
            - coefficients.versatile_recent_count_weight * n_recent
            - coefficients.versatile_recent_hours_weight * h_recent
            - coefficients.versatile_period_shifts_weight * period_shifts
    }
}

/// Picks the best worker in `eligible` for `(date, section_name)`
/// according to the policy that section resolves to. Panics on an
/// empty slice — callers only invoke this once `EligibilityOracle` has
/// already confirmed a non-empty eligible set.
pub fn best_worker<'a>(
    eligible: &[&'a Worker],
    date: NaiveDate,
    section_name: &str,
    ledger: &MetricsLedger,
    coefficients: &VersatilityCoefficients,
) -> &'a Worker {
    let policy = policy_for(section_name);
    eligible
        .iter()
        .copied()
        .max_by(|a, b| compare(a, b, date, section_name, policy, ledger, coefficients))
        .expect("eligible set must be non-empty")
}

#[allow(clippy::too_many_arguments)]
fn compare(
    a: &Worker,
    b: &Worker,
    date: NaiveDate,
    section_name: &str,
    policy: ScoringPolicy,
    ledger: &MetricsLedger,
    coefficients: &VersatilityCoefficients,
) -> std::cmp::Ordering {
    use std::cmp::Ordering;

    match policy {
        ScoringPolicy::LongestAgoSame => {
            let score_a = days_since(ledger, a.id, section_name, date);
            let score_b = days_since(ledger, b.id, section_name, date);
            score_a.cmp(&score_b).then_with(|| b.name.cmp(&a.name))
        }
        ScoringPolicy::LongestAgoSameByAge => {
            let score_a = days_since(ledger, a.id, section_name, date);
            let score_b = days_since(ledger, b.id, section_name, date);
            score_a.cmp(&score_b).then_with(|| a.birth_year.cmp(&b.birth_year))
        }
        ScoringPolicy::VersatilityWeightedUci => {
            let score_a = versatility_weighted_score(a, date, ledger, coefficients);
            let score_b = versatility_weighted_score(b, date, ledger, coefficients);
            score_a
                .partial_cmp(&score_b)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.name.cmp(&a.name))
        }
        ScoringPolicy::PeriodShiftCount => {
            let score_a = -(ledger.period_shifts(a.id) as f64);
            let score_b = -(ledger.period_shifts(b.id) as f64);
            score_a
                .partial_cmp(&score_b)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.name.cmp(&a.name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use uuid::Uuid;

    fn worker(name: &str, birth_year: i32, areas: &[Area]) -> Worker {
        Worker {
            id: Uuid::new_v4(),
            name: name.to_string(),
            initials: name.chars().take(2).collect(),
            birth_year,
            category: "staff".to_string(),
            state: shared::types::WorkerState::Active,
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

    #[test]
    fn policy_selection_matches_section_table() {
        assert_eq!(policy_for("UCI_G_festivo"), ScoringPolicy::LongestAgoSame);
        assert_eq!(policy_for("Urg_G_noche_l"), ScoringPolicy::LongestAgoSameByAge);
        assert_eq!(policy_for("UCI_G_lab"), ScoringPolicy::VersatilityWeightedUci);
        assert_eq!(policy_for("HEMS_tarde"), ScoringPolicy::PeriodShiftCount);
    }

    #[test]
    fn never_assigned_worker_wins_longest_ago_same() {
        let ledger = MetricsLedger::new();
        let never = worker("Ana Alonso", 1980, &[Area::GuardiaUci]);
        let recently = worker("Beatriz Soler", 1980, &[Area::GuardiaUci]);
        let date = NaiveDate::from_ymd_opt(2026, 1, 20).unwrap();
        let eligible = vec![&never, &recently];
        let coefficients = VersatilityCoefficients::default();
        let winner = best_worker(&eligible, date, "UCI_G_festivo", &ledger, &coefficients);
        assert_eq!(winner.name, "Ana Alonso");
    }

    #[test]
    fn tie_break_by_age_prefers_youngest() {
        let ledger = MetricsLedger::new();
        let older = worker("Carlos Diaz", 1970, &[Area::GuardiaUrg]);
        let younger = worker("David Ezcurra", 1995, &[Area::GuardiaUrg]);
        let date = NaiveDate::from_ymd_opt(2026, 1, 20).unwrap();
        let eligible = vec![&older, &younger];
        let coefficients = VersatilityCoefficients::default();
        let winner = best_worker(&eligible, date, "Urg_G_noche_l", &ledger, &coefficients);
        assert_eq!(winner.name, "David Ezcurra");
    }

    #[test]
    fn period_shift_count_prefers_fewer_shifts() {
        let mut ledger = MetricsLedger::new();
        let busy = worker("Elena Fuentes", 1980, &[Area::Hems]);
        let idle = worker("Fernando Gil", 1980, &[Area::Hems]);
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let assignment = shared::types::Assignment {
            id: Uuid::new_v4(),
            scenario_id: Uuid::new_v4(),
            date,
            day_of_week: chrono::Datelike::weekday(&date),
            section_name: "HEMS_tarde".to_string(),
            worker_id: busy.id,
            worker_name: busy.name.clone(),
            hours: 12.0,
            libra: false,
            is_holiday: false,
            is_weekend: false,
            period_tag: "2026-01".to_string(),
            copy_ix: 0,
        };
        ledger.commit(&assignment, false);
        let eligible = vec![&busy, &idle];
        let coefficients = VersatilityCoefficients::default();
        let winner = best_worker(&eligible, date, "HEMS_tarde", &ledger, &coefficients);
        assert_eq!(winner.name, "Fernando Gil");
    }
}
