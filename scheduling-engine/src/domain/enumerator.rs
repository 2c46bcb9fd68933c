use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};
use shared::types::{DayLabel, Section};

pub const URG_PREFIX: &str = "Urg_G_";
pub const URG_LAB_SECTION: &str = "Urg_G_noche_l";
pub const URG_REFUERZO_SECTION: &str = "Urg_G_refuerzo_fyf";

/// One shift to fill: `(date, section, copy_ix)` plus the derived
/// flags callers need without re-deriving them from the section.
#[derive(Debug, Clone, PartialEq)]
pub struct ShiftInstance {
    pub date: NaiveDate,
    pub section_name: String,
    pub copy_ix: i32,
    pub hours: f64,
    pub libra: bool,
    pub is_night: bool,
    pub is_weekend: bool,
    pub is_holiday: bool,
}

impl ShiftInstance {
    fn new(date: NaiveDate, section: &Section, copy_ix: i32, label: DayLabel) -> Self {
        Self {
            date,
            section_name: section.name.clone(),
            copy_ix,
            hours: section.hours,
            libra: section.libra,
            is_night: section.is_night,
            is_weekend: crate::domain::calendar::is_weekend(date),
            is_holiday: matches!(label, DayLabel::Holiday),
        }
    }

    pub fn is_urg(&self) -> bool {
        self.section_name.starts_with(URG_PREFIX)
    }
}

fn is_first_friday_of_month(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Fri && date.day() <= 7
}

/// The anchor date of the weekend package a date belongs to: the
/// Friday for Fri/Sat/Sun, or the date itself for a weekday holiday.
pub fn weekend_anchor(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Fri => date,
        Weekday::Sat => date - chrono::Duration::days(1),
        Weekday::Sun => date - chrono::Duration::days(2),
        _ => date,
    }
}

fn is_urg_weekend_instance(instance: &ShiftInstance) -> bool {
    instance.is_urg()
        && (matches!(
            instance.date.weekday(),
            Weekday::Fri | Weekday::Sat | Weekday::Sun
        ) || instance.is_holiday)
}

/// Everything C2 produces, already split into the three streams C6/C7
/// consume independently.
#[derive(Debug, Default)]
pub struct EnumeratedShifts {
    /// Sorted by `(priority[section], date)`.
    pub regular_stream: Vec<ShiftInstance>,
    /// Sorted by date.
    pub urg_lab_stream: Vec<ShiftInstance>,
    /// Keyed by weekend-package anchor date, ascending.
    pub urg_weekend_buckets: BTreeMap<NaiveDate, Vec<ShiftInstance>>,
}

/// Expands every `(date, label)` pair against every Section, then
/// splits and sorts into the three streams C6/C7 operate on.
pub fn enumerate(
    calendar: &[(NaiveDate, DayLabel)],
    sections: &[Section],
    priority_order: &std::collections::HashMap<String, i32>,
    default_priority: i32,
) -> EnumeratedShifts {
    let mut regular_stream = Vec::new();
    let mut urg_lab_stream = Vec::new();
    let mut urg_weekend_buckets: BTreeMap<NaiveDate, Vec<ShiftInstance>> = BTreeMap::new();

    for &(date, label) in calendar {
        for section in sections {
            if !section.applies_to(date, label) {
                continue;
            }
            for copy_ix in 0..section.personal {
                let instance = ShiftInstance::new(date, section, copy_ix, label);
                if instance.section_name == URG_LAB_SECTION {
                    urg_lab_stream.push(instance);
                } else if is_urg_weekend_instance(&instance) {
                    let anchor = weekend_anchor(instance.date);
                    urg_weekend_buckets.entry(anchor).or_default().push(instance);
                } else {
                    regular_stream.push(instance);
                }
            }
        }

        if is_first_friday_of_month(date) {
            if let Some(section) = sections.iter().find(|s| s.name == URG_REFUERZO_SECTION) {
                let reinforcement = ShiftInstance::new(date, section, 0, label);
                urg_weekend_buckets.entry(date).or_default().push(reinforcement);
            }
        }
    }

    regular_stream.sort_by_key(|instance| {
        let priority = priority_order
            .get(&instance.section_name)
            .copied()
            .unwrap_or(default_priority);
        (priority, instance.date)
    });
    urg_lab_stream.sort_by_key(|instance| instance.date);

    EnumeratedShifts {
        regular_stream,
        urg_lab_stream,
        urg_weekend_buckets,
    }
}
