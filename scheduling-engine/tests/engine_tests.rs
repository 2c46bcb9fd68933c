use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use chrono::{NaiveDate, Utc, Weekday};
use scheduling_engine::config::SchedulingConfig;
use scheduling_engine::domain::engine::SchedulingEngine;
use scheduling_engine::domain::store::Store;
use scheduling_engine::infrastructure::memory_store::MemoryStore;
use scheduling_engine::request::{ErrorKind, RunRequest};
use shared::types::{Area, DayLabel, Section, Worker, WorkerState};
use uuid::Uuid;

fn worker(name: &str, areas: &[Area], birth_year: i32) -> Worker {
    Worker {
        id: Uuid::new_v4(),
        name: name.to_string(),
        initials: name.chars().filter(|c| c.is_uppercase()).collect(),
        birth_year,
        category: "staff".to_string(),
        state: WorkerState::Active,
        areas: sqlx::types::Json(areas.iter().copied().collect()),
        days_assigned: sqlx::types::Json(HashMap::new()),
        avoid_days: sqlx::types::Json(HashSet::new()),
        ooo_days: sqlx::types::Json(HashSet::new()),
        available_work_hours: 160.0,
        available_guard_hours: 80.0,
        fte_pct: 1.0,
        regular_workdays: sqlx::types::Json(HashSet::from([
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ])),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn section(name: &str, hours: f64, days: &[DayLabel], personal: i32, libra: bool) -> Section {
    Section {
        id: Uuid::new_v4(),
        name: name.to_string(),
        hours,
        days: sqlx::types::Json(days.iter().copied().collect()),
        personal,
        libra,
        fechas: sqlx::types::Json(None),
        is_night: shared::types::derive_is_night(name),
    }
}

fn weekdays(days: &[Weekday]) -> Vec<DayLabel> {
    days.iter().copied().map(DayLabel::Weekday).collect()
}

fn request(start: NaiveDate, end: NaiveDate) -> RunRequest {
    RunRequest {
        start_date: start,
        end_date: end,
        sections_enabled: Vec::new(),
        priority_order: HashMap::new(),
        created_by: "integration-test".to_string(),
        description: String::new(),
        period_tag: "2026-test".to_string(),
    }
}

#[tokio::test]
async fn single_worker_covers_a_weekend_only_horizon() {
    let w = worker("Ana Alonso", &[Area::Hems], 1982);
    // Rule 5 (minimum staffing) only applies on Mon-Thu; a weekend-only
    // section lets a single worker legitimately cover the whole horizon.
    let sections = vec![section("HEMS_festivo", 24.0, &weekdays(&[Weekday::Sat, Weekday::Sun]), 1, false)];

    let store = MemoryStore::new().with_workers(vec![w]).with_sections(sections);
    let engine = SchedulingEngine::new(Arc::new(store), SchedulingConfig::default());

    let start = NaiveDate::from_ymd_opt(2026, 1, 3).unwrap(); // Saturday
    let end = NaiveDate::from_ymd_opt(2026, 1, 4).unwrap(); // Sunday
    let cancel = Arc::new(AtomicBool::new(false));
    let result = engine.run(request(start, end), cancel).await;

    assert!(result.is_success(), "expected success, got {:?}", result.error_kind);
}

#[tokio::test]
async fn weekday_restricted_uci_lab_section_only_assigns_on_configured_days() {
    let mut monday_worker = worker("Beatriz Soler", &[Area::GuardiaUci], 1985);
    monday_worker.days_assigned.0.insert(Area::GuardiaUci, HashSet::from([Weekday::Mon]));
    let mut other_worker = worker("Carlos Diaz", &[Area::GuardiaUci], 1988);
    other_worker.days_assigned.0.insert(Area::GuardiaUci, HashSet::from([Weekday::Tue]));
    // Rule 5 (minimum staffing) requires 2 *other* Active workers in the same
    // area available on a restricted weekday; these two never hold a
    // `days_assigned` entry so they're never themselves chosen, but they keep
    // the staffing count satisfied for whoever is.
    let padding_a = worker("Laura Navarro", &[Area::GuardiaUci], 1979);
    let padding_b = worker("Marcos Ortiz", &[Area::GuardiaUci], 1991);

    let sections = vec![section(
        "UCI_G_lab",
        24.0,
        &weekdays(&[Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri]),
        1,
        false,
    )];

    let store = Arc::new(
        MemoryStore::new()
            .with_workers(vec![monday_worker.clone(), other_worker.clone(), padding_a, padding_b])
            .with_sections(sections),
    );
    let engine = SchedulingEngine::new(store.clone(), SchedulingConfig::default());

    let start = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(); // Monday
    let end = NaiveDate::from_ymd_opt(2026, 1, 6).unwrap(); // Tuesday
    let cancel = Arc::new(AtomicBool::new(false));
    let result = engine.run(request(start, end), cancel).await;

    assert!(result.is_success(), "expected success, got {:?}", result.error_kind);

    let assignments = store.get_assignments(result.scenario_id.unwrap()).await.unwrap();
    let monday_assignment = assignments.iter().find(|a| a.date == start).unwrap();
    assert_eq!(monday_assignment.worker_id, monday_worker.id);
    let tuesday_assignment = assignments.iter().find(|a| a.date == end).unwrap();
    assert_eq!(tuesday_assignment.worker_id, other_worker.id);
}

#[tokio::test]
async fn libra_section_blocks_the_worker_the_following_day() {
    let mut w1 = worker("Daniela Ezcurra", &[Area::Hems], 1980);
    w1.days_assigned.0.insert(Area::Hems, HashSet::from([Weekday::Mon, Weekday::Tue]));
    let mut w2 = worker("Esteban Fariña", &[Area::Hems], 1983);
    w2.days_assigned.0.insert(Area::Hems, HashSet::from([Weekday::Mon, Weekday::Tue]));
    // padding so rule 5 (minimum staffing: 2 *other* available workers) is
    // satisfiable no matter which of w1/w2 is chosen on a given day
    let padding = worker("Nuria Peña", &[Area::Hems], 1986);

    let sections = vec![section("HEMS_tarde", 12.0, &weekdays(&[Weekday::Mon, Weekday::Tue]), 1, true)];

    let store = Arc::new(
        MemoryStore::new()
            .with_workers(vec![w1.clone(), w2.clone(), padding])
            .with_sections(sections),
    );
    let engine = SchedulingEngine::new(store.clone(), SchedulingConfig::default());

    let start = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(); // Monday
    let end = NaiveDate::from_ymd_opt(2026, 1, 6).unwrap(); // Tuesday
    let cancel = Arc::new(AtomicBool::new(false));
    let result = engine.run(request(start, end), cancel).await;

    assert!(result.is_success(), "expected success, got {:?}", result.error_kind);
    let assignments = store.get_assignments(result.scenario_id.unwrap()).await.unwrap();
    let monday_worker_id = assignments.iter().find(|a| a.date == start).unwrap().worker_id;
    let tuesday_worker_id = assignments.iter().find(|a| a.date == end).unwrap().worker_id;
    assert_ne!(monday_worker_id, tuesday_worker_id, "libra must keep Monday's worker off Tuesday");
}

#[tokio::test]
async fn no_eligible_worker_for_a_section_reports_configuration_error() {
    let w = worker("Fernando Gil", &[Area::Coordis], 1975);
    let sections = vec![section("HEMS_tarde", 12.0, &weekdays(&[Weekday::Mon]), 1, false)];

    let store = MemoryStore::new().with_workers(vec![w]).with_sections(sections);
    let engine = SchedulingEngine::new(Arc::new(store), SchedulingConfig::default());

    let day = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
    let cancel = Arc::new(AtomicBool::new(false));
    let result = engine.run(request(day, day), cancel).await;

    assert!(!result.is_success());
    match result.error_kind {
        Some(ErrorKind::ConfigurationError { section, .. }) => assert_eq!(section, "HEMS_tarde"),
        other => panic!("expected ConfigurationError, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_horizon_still_produces_a_scenario() {
    let store = MemoryStore::new();
    let engine = SchedulingEngine::new(Arc::new(store), SchedulingConfig::default());

    let start = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
    let end = NaiveDate::from_ymd_opt(2026, 1, 9).unwrap(); // end before start: empty calendar
    let cancel = Arc::new(AtomicBool::new(false));
    let result = engine.run(request(start, end), cancel).await;

    assert!(result.is_success());
    assert!(result.search_log.is_empty());
}

#[tokio::test]
async fn first_friday_weekend_rotation_assigns_violeta_farina_the_lead_role() {
    let lead = worker("Violeta Fariña", &[Area::GuardiaUrg], 1978);
    let second = worker("Gonzalo Herrero", &[Area::GuardiaUrg], 1982);
    let third = worker("Irene Jimenez", &[Area::GuardiaUrg], 1990);

    let sections = vec![
        section("Urg_G_tarde-noche_l", 14.0, &weekdays(&[Weekday::Fri]), 1, true),
        section("Urg_G_festivo_mañana", 12.0, &weekdays(&[Weekday::Sat, Weekday::Sun]), 1, false),
        section("Urg_G_festivo_noche", 12.0, &weekdays(&[Weekday::Sat, Weekday::Sun]), 1, false),
        section("Urg_G_refuerzo_fyf", 10.0, &weekdays(&[Weekday::Fri]), 1, false),
    ];

    let store = Arc::new(
        MemoryStore::new()
            .with_workers(vec![lead.clone(), second, third])
            .with_sections(sections),
    );
    let engine = SchedulingEngine::new(store.clone(), SchedulingConfig::default());

    let start = NaiveDate::from_ymd_opt(2026, 4, 3).unwrap(); // first Friday of April 2026
    let end = NaiveDate::from_ymd_opt(2026, 4, 5).unwrap(); // through Sunday
    let cancel = Arc::new(AtomicBool::new(false));
    let result = engine.run(request(start, end), cancel).await;

    assert!(result.is_success(), "expected success, got {:?}", result.error_kind);
    let assignments = store.get_assignments(result.scenario_id.unwrap()).await.unwrap();
    let friday_night = assignments
        .iter()
        .find(|a| a.section_name == "Urg_G_tarde-noche_l" && a.date == start)
        .expect("Friday tarde-noche must be assigned");
    assert_eq!(friday_night.worker_id, lead.id);
}

#[tokio::test]
async fn metrics_ledger_matches_a_fresh_fold_of_the_committed_assignments() {
    let restricted_days = HashSet::from([Weekday::Mon, Weekday::Tue, Weekday::Wed]);
    let mut w1 = worker("Julia Lopez", &[Area::Hems], 1980);
    w1.days_assigned.0.insert(Area::Hems, restricted_days.clone());
    let mut w2 = worker("Kevin Martinez", &[Area::Hems], 1983);
    w2.days_assigned.0.insert(Area::Hems, restricted_days);
    // padding so rule 5 (minimum staffing) is satisfiable for whichever of
    // w1/w2 is chosen each day
    let padding = worker("Lucia Moreno", &[Area::Hems], 1987);

    let sections = vec![section("HEMS_tarde", 12.0, &weekdays(&[Weekday::Mon, Weekday::Tue, Weekday::Wed]), 1, false)];

    let store = Arc::new(MemoryStore::new().with_workers(vec![w1, w2, padding]).with_sections(sections));
    let engine = SchedulingEngine::new(store.clone(), SchedulingConfig::default());

    let start = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
    let end = NaiveDate::from_ymd_opt(2026, 1, 7).unwrap();
    let cancel = Arc::new(AtomicBool::new(false));
    let result = engine.run(request(start, end), cancel).await;

    assert!(result.is_success());
    let assignments = store.get_assignments(result.scenario_id.unwrap()).await.unwrap();
    let total_hours: f64 = assignments.iter().map(|a| a.hours).sum();
    assert_eq!(assignments.len(), 3);
    assert_eq!(total_hours, 36.0);
}
