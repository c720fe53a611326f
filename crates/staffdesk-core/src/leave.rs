//! Leave conflict engine
//!
//! Pure functions over plain data: no I/O, no shared state. The snapshot of
//! existing periods is supplied by the caller and never mutated.

use chrono::NaiveDate;
use staffdesk_api::{LeaveKind, LeavePeriod, LeaveSnapshot};
use staffdesk_util::{CalendarDay, EmployeeId};

/// Inclusive number of calendar days from `start` to `end`.
///
/// Time-of-day is ignored. `start == end` yields 1; a reversed range
/// yields 0.
pub fn day_count(start: impl CalendarDay, end: impl CalendarDay) -> u32 {
    let days = (end.calendar_day() - start.calendar_day()).num_days() + 1;
    u32::try_from(days.max(0)).unwrap_or(u32::MAX)
}

/// Closed-interval overlap test at calendar-day granularity.
///
/// Ranges that merely touch (one ends the day the other starts) overlap.
pub fn overlaps(
    a_start: impl CalendarDay,
    a_end: impl CalendarDay,
    b_start: impl CalendarDay,
    b_end: impl CalendarDay,
) -> bool {
    a_start.calendar_day() <= b_end.calendar_day()
        && b_start.calendar_day() <= a_end.calendar_day()
}

/// A proposed leave period for one employee
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaveCandidate {
    pub employee_id: EmployeeId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl LeaveCandidate {
    pub fn new(
        employee_id: impl Into<EmployeeId>,
        start_date: impl CalendarDay,
        end_date: impl CalendarDay,
    ) -> Self {
        Self {
            employee_id: employee_id.into(),
            start_date: start_date.calendar_day(),
            end_date: end_date.calendar_day(),
        }
    }

    pub fn day_count(&self) -> u32 {
        day_count(self.start_date, self.end_date)
    }

    fn overlaps(&self, period: &LeavePeriod) -> bool {
        overlaps(self.start_date, self.end_date, period.start_date, period.end_date)
    }
}

/// First active period of the same employee overlapping `candidate`.
///
/// Vacations are checked before permissions; within each list the first
/// match wins.
pub fn find_conflict<'a>(
    candidate: &LeaveCandidate,
    vacations: &'a [LeavePeriod],
    permissions: &'a [LeavePeriod],
) -> Option<&'a LeavePeriod> {
    vacations
        .iter()
        .chain(permissions.iter())
        .filter(|p| p.is_active() && p.employee_id == candidate.employee_id)
        .find(|p| candidate.overlaps(p))
}

/// Result of [`evaluate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveEvaluation {
    pub day_count: u32,
    pub conflict: Option<LeavePeriod>,
}

impl LeaveEvaluation {
    pub fn is_clear(&self) -> bool {
        self.conflict.is_none()
    }
}

/// Day count and first conflict of `candidate` against `snapshot`
pub fn evaluate(candidate: &LeaveCandidate, snapshot: &LeaveSnapshot) -> LeaveEvaluation {
    LeaveEvaluation {
        day_count: candidate.day_count(),
        conflict: find_conflict(candidate, &snapshot.vacations, &snapshot.permissions).cloned(),
    }
}

/// User-facing message for a conflicting period
pub fn conflict_message(period: &LeavePeriod) -> String {
    let what = match period.kind() {
        LeaveKind::Vacation => "vacation",
        LeaveKind::Permission => "permission",
    };
    format!(
        "This request overlaps an active {} ({} to {})",
        what, period.start_date, period.end_date
    )
}
