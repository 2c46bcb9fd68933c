use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use sqlx::prelude::{FromRow, Type};
use sqlx::types::Json;
use uuid::Uuid;

// region: Worker

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "worker_state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerState {
    Active,
    Inactive,
    Leave,
    Reduced,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "area", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Area {
    Hems,
    Coordis,
    GuardiaUci,
    GuardiaUrg,
    GuardiaHosp,
}

/// A worker eligible to cover on-call shifts.
///
/// `areas`, `days_assigned`, `avoid_days`, `ooo_days` and
/// `regular_workdays` don't map cleanly onto flat SQL columns, so the
/// Postgres adapter stores them as `jsonb` via [`Json`].
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Worker {
    pub id: Uuid,
    pub name: String,
    pub initials: String,
    pub birth_year: i32,
    pub category: String,
    pub state: WorkerState,
    pub areas: Json<HashSet<Area>>,
    pub days_assigned: Json<HashMap<Area, HashSet<Weekday>>>,
    pub avoid_days: Json<HashSet<Weekday>>,
    pub ooo_days: Json<HashSet<NaiveDate>>,
    pub available_work_hours: f64,
    pub available_guard_hours: f64,
    pub fte_pct: f64,
    pub regular_workdays: Json<HashSet<Weekday>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Worker {
    pub fn has_area(&self, area: Area) -> bool {
        self.areas.0.contains(&area)
    }
}

// endregion: Worker

// region: Section

/// A day label a [`Section`] can apply to: an ordinary weekday, or a
/// holiday regardless of its underlying weekday.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DayLabel {
    Weekday(Weekday),
    Holiday,
}

/// A shift template. A template with `personal = N` expands to `N`
/// independent shift instances per matching date (see
/// `scheduling_engine::domain::enumerator`).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Section {
    pub id: Uuid,
    pub name: String,
    pub hours: f64,
    pub days: Json<HashSet<DayLabel>>,
    pub personal: i32,
    pub libra: bool,
    pub fechas: Json<Option<HashSet<NaiveDate>>>,
    /// Resolved once, at construction time, instead of re-derived from
    /// the section name by every caller (the original source keyed
    /// night-ness off a `noche`/`nocturno` substring match).
    pub is_night: bool,
}

impl Section {
    pub fn is_urg(&self) -> bool {
        self.name.starts_with("Urg_G_")
    }

    pub fn is_regular(&self) -> bool {
        !self.is_urg()
    }

    pub fn applies_to(&self, date: NaiveDate, label: DayLabel) -> bool {
        if !self.days.0.contains(&label) {
            return false;
        }
        match &self.fechas.0 {
            Some(fechas) if !fechas.is_empty() => fechas.contains(&date),
            _ => true,
        }
    }
}

/// Night-ness by name, matching the source's substring rule. Used only
/// once, by whatever constructs a [`Section`] (the Postgres adapter or
/// a test fixture), to populate `Section::is_night`.
pub fn derive_is_night(section_name: &str) -> bool {
    let lower = section_name.to_lowercase();
    lower.contains("noche") || lower.contains("nocturno") || section_name == "UCI_G_lab"
}

/// Maps a section name onto the [`Area`] a worker must hold to cover
/// it, via the fixed name-prefix table.
pub fn required_area(section_name: &str) -> Option<Area> {
    if section_name.starts_with("HEMS_") {
        Some(Area::Hems)
    } else if section_name.starts_with("Coordis_") {
        Some(Area::Coordis)
    } else if section_name.starts_with("UCI_") {
        Some(Area::GuardiaUci)
    } else if section_name.starts_with("Urg_") {
        Some(Area::GuardiaUrg)
    } else if section_name.starts_with("Hosp_") {
        Some(Area::GuardiaHosp)
    } else {
        None
    }
}

/// The five sections where Mon-Thu assignment is further restricted by
/// `Worker::days_assigned`.
pub const WEEKDAY_RESTRICTED_SECTIONS: [&str; 5] = [
    "UCI_G_lab",
    "Coordis_nocturno",
    "Coordis_diurno",
    "HEMS_tarde",
    "Urg_G_noche_l",
];

// endregion: Section

// region: Assignment

/// A committed (date, section, worker) triple. Created by the search,
/// destroyed only by backtracking undo.
///
/// Does not derive `sqlx::FromRow`: `day_of_week` is a bare
/// `chrono::Weekday`, which has no `sqlx::Type` impl, so the Postgres
/// adapter maps rows to this struct by hand (see
/// `weekday_code`/`weekday_from_code`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub id: Uuid,
    pub scenario_id: Uuid,
    pub date: NaiveDate,
    pub day_of_week: Weekday,
    pub section_name: String,
    pub worker_id: Uuid,
    pub worker_name: String,
    pub hours: f64,
    pub libra: bool,
    pub is_holiday: bool,
    pub is_weekend: bool,
    pub period_tag: String,
    pub copy_ix: i32,
}

/// `chrono::Weekday` has no `sqlx::Type` impl of its own and the orphan
/// rule blocks writing one here, so the Postgres adapter stores
/// `day_of_week` as a three-letter code and converts through these at
/// the read/write boundary instead of deriving it automatically.
pub fn weekday_code(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MON",
        Weekday::Tue => "TUE",
        Weekday::Wed => "WED",
        Weekday::Thu => "THU",
        Weekday::Fri => "FRI",
        Weekday::Sat => "SAT",
        Weekday::Sun => "SUN",
    }
}

pub fn weekday_from_code(code: &str) -> Weekday {
    match code {
        "MON" => Weekday::Mon,
        "TUE" => Weekday::Tue,
        "WED" => Weekday::Wed,
        "THU" => Weekday::Thu,
        "FRI" => Weekday::Fri,
        "SAT" => Weekday::Sat,
        "SUN" => Weekday::Sun,
        other => panic!("unknown weekday code: {other}"),
    }
}

// endregion: Assignment

// region: Metrics

/// One scope (period or yearly) of a worker's counters.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct MetricCounters {
    pub total_shifts: u32,
    pub total_hours: f64,
    pub night_shifts: u32,
    pub weekend_shifts: u32,
    pub holiday_shifts: u32,
}

impl MetricCounters {
    /// Folds a single assignment into the counters. Used both to build
    /// the ledger incrementally and, in tests, to check invariant P6 by
    /// folding the whole assignment set from scratch.
    pub fn add(&mut self, assignment: &Assignment, is_night: bool) {
        self.total_shifts += 1;
        self.total_hours += assignment.hours;
        if is_night {
            self.night_shifts += 1;
        }
        if assignment.is_holiday {
            self.holiday_shifts += 1;
        }
        if assignment.is_weekend {
            self.weekend_shifts += 1;
        }
    }

    pub fn subtract(&mut self, assignment: &Assignment, is_night: bool) {
        self.total_shifts -= 1;
        self.total_hours -= assignment.hours;
        if is_night {
            self.night_shifts -= 1;
        }
        if assignment.is_holiday {
            self.holiday_shifts -= 1;
        }
        if assignment.is_weekend {
            self.weekend_shifts -= 1;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkerMetrics {
    pub worker_id: Uuid,
    pub period: MetricCounters,
    pub yearly: MetricCounters,
}

// endregion: Metrics

// region: Scenario

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "scenario_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScenarioStatus {
    Draft,
    Published,
    Archived,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Scenario {
    pub id: Uuid,
    pub name: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub year: i32,
    pub status: ScenarioStatus,
    pub description: String,
    pub settings_blob: Json<serde_json::Value>,
}

// endregion: Scenario
