use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use shared::types::{Assignment, Section, Worker};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatrixKind {
    Shift,
    Regular,
}

#[derive(Debug, Clone, Copy)]
struct ChangeLogEntry {
    date: NaiveDate,
    worker_id: Uuid,
    which: MatrixKind,
    prior_value: bool,
}

/// The two per-`(date, worker)` availability matrices of §4.5,
/// implemented as a default-value lookup over static worker metadata
/// plus a change-log overlay rather than a dense `(H·W)` array.
/// `snapshot`/`restore` are O(commits-since-snapshot), not O(H·W).
#[derive(Debug, Default)]
pub struct AvailabilityMatrices {
    shift_overlay: HashMap<(NaiveDate, Uuid), bool>,
    regular_overlay: HashMap<(NaiveDate, Uuid), bool>,
    log: Vec<ChangeLogEntry>,
}

impl AvailabilityMatrices {
    pub fn new() -> Self {
        Self::default()
    }

    fn static_shift_base(worker: &Worker, date: NaiveDate) -> bool {
        !worker.ooo_days.0.contains(&date) && !worker.avoid_days.0.contains(&date.weekday())
    }

    pub fn shift_avail(&self, worker: &Worker, date: NaiveDate) -> bool {
        if self.shift_overlay.get(&(date, worker.id)) == Some(&false) {
            return false;
        }
        Self::static_shift_base(worker, date)
    }

    pub fn regular_avail(&self, worker: &Worker, date: NaiveDate) -> bool {
        if self.regular_overlay.get(&(date, worker.id)) == Some(&false) {
            return false;
        }
        Self::static_shift_base(worker, date) && worker.regular_workdays.0.contains(&date.weekday())
    }

    fn set_shift(&mut self, date: NaiveDate, worker_id: Uuid, value: bool) {
        let prior = self.shift_overlay.get(&(date, worker_id)).copied().unwrap_or(true);
        self.log.push(ChangeLogEntry { date, worker_id, which: MatrixKind::Shift, prior_value: prior });
        self.shift_overlay.insert((date, worker_id), value);
    }

    fn set_regular(&mut self, date: NaiveDate, worker_id: Uuid, value: bool) {
        let prior = self.regular_overlay.get(&(date, worker_id)).copied().unwrap_or(true);
        self.log.push(ChangeLogEntry { date, worker_id, which: MatrixKind::Regular, prior_value: prior });
        self.regular_overlay.insert((date, worker_id), value);
    }

    /// Applies the side effects of committing `assignment` for `worker`
    /// against `section`: marks `shift_avail` false on the assigned
    /// date (and, if `libra`, the day after), and propagates the same
    /// into `regular_avail` when the section is a regular shift.
    pub fn record_assignment(
        &mut self,
        assignment: &Assignment,
        section: &Section,
        worker: &Worker,
        horizon_end: NaiveDate,
    ) {
        self.set_shift(assignment.date, worker.id, false);
        let next_day = assignment.date + chrono::Duration::days(1);
        if section.libra && next_day <= horizon_end {
            self.set_shift(next_day, worker.id, false);
        }

        if section.is_regular() {
            self.set_regular(assignment.date, worker.id, false);
            if section.libra && next_day <= horizon_end {
                self.set_regular(next_day, worker.id, false);
            }
        }
    }

    /// A mark that `restore` can roll back to. Cheap: just the current
    /// log length.
    pub fn snapshot(&self) -> usize {
        self.log.len()
    }

    /// Replays the change-log in reverse back to `mark`.
    pub fn restore(&mut self, mark: usize) {
        while self.log.len() > mark {
            let entry = self.log.pop().expect("checked len > mark above");
            match entry.which {
                MatrixKind::Shift => {
                    self.shift_overlay.insert((entry.date, entry.worker_id), entry.prior_value);
                }
                MatrixKind::Regular => {
                    self.regular_overlay.insert((entry.date, entry.worker_id), entry.prior_value);
                }
            }
        }
    }
}
