use std::collections::HashSet;

use chrono::{Datelike, NaiveDate, Weekday};
use shared::types::DayLabel;

/// Expands `[start, end]` into `(date, label)` pairs, total and
/// restartable: no internal state survives past the returned `Vec`.
pub fn expand(start: NaiveDate, end: NaiveDate, holidays: &HashSet<NaiveDate>) -> Vec<(NaiveDate, DayLabel)> {
    let mut out = Vec::new();
    let mut cursor = start;
    while cursor <= end {
        let label = if holidays.contains(&cursor) {
            DayLabel::Holiday
        } else {
            DayLabel::Weekday(cursor.weekday())
        };
        out.push((cursor, label));
        cursor += chrono::Duration::days(1);
    }
    out
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}
