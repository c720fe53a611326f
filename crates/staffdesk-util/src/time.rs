//! Time utilities for staffdesk
//!
//! Session inactivity is measured on the wall clock because the last
//! activity timestamp has to survive a process restart. Leave periods are
//! measured in whole calendar days; anything carrying a time-of-day is
//! normalized through [`CalendarDay`] before it is compared.
//!
//! # Mock Time for Development
//!
//! In debug builds, the `STAFFDESK_MOCK_TIME` environment variable can be set
//! to override the system time for all time-sensitive operations.
//!
//! Format: `YYYY-MM-DD HH:MM:SS` (e.g., `2025-12-25 14:30:00`)
//!
//! Example:
//! ```bash
//! STAFFDESK_MOCK_TIME="2025-12-25 14:30:00" staffdesk session status --profile admin
//! ```

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use std::sync::OnceLock;
use std::time::Duration;

use crate::StaffdeskError;

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "STAFFDESK_MOCK_TIME";

/// Format accepted by [`MOCK_TIME_ENV_VAR`]
const MOCK_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Offset between mock time and real time, computed once per process.
static MOCK_TIME_OFFSET: OnceLock<Option<chrono::Duration>> = OnceLock::new();

#[allow(clippy::disallowed_methods)] // Internal implementation that wraps Local::now()
fn get_mock_time_offset() -> Option<chrono::Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            let mock_time_str = std::env::var(MOCK_TIME_ENV_VAR).ok()?;
            let Ok(naive_dt) = NaiveDateTime::parse_from_str(&mock_time_str, MOCK_TIME_FORMAT)
            else {
                tracing::warn!(
                    mock_time = %mock_time_str,
                    expected_format = MOCK_TIME_FORMAT,
                    "Invalid mock time format"
                );
                return None;
            };
            let Some(mock_dt) = Local.from_local_datetime(&naive_dt).single() else {
                tracing::warn!(
                    mock_time = %mock_time_str,
                    "Failed to convert mock time to local timezone"
                );
                return None;
            };
            let offset = mock_dt.signed_duration_since(chrono::Local::now());
            tracing::info!(
                mock_time = %mock_time_str,
                offset_secs = offset.num_seconds(),
                "Mock time enabled"
            );
            Some(offset)
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

/// Returns whether mock time is currently active.
pub fn is_mock_time_active() -> bool {
    get_mock_time_offset().is_some()
}

/// Get the current local time, respecting mock time settings in debug builds.
#[allow(clippy::disallowed_methods)] // The wrapper that provides mock time support
pub fn now() -> DateTime<Local> {
    let real_now = chrono::Local::now();

    match get_mock_time_offset() {
        Some(offset) => real_now + offset,
        None => real_now,
    }
}

/// Milliseconds since the Unix epoch, the persisted form of activity timestamps.
pub fn to_epoch_millis(dt: &DateTime<Local>) -> i64 {
    dt.timestamp_millis()
}

/// Inverse of [`to_epoch_millis`]. `None` when the value is out of range.
pub fn from_epoch_millis(millis: i64) -> Option<DateTime<Local>> {
    Local.timestamp_millis_opt(millis).single()
}

/// Time elapsed from `earlier` to `now`, saturating at zero when `earlier`
/// lies in the future.
pub fn elapsed_between(earlier: &DateTime<Local>, now: &DateTime<Local>) -> Duration {
    now.signed_duration_since(*earlier)
        .to_std()
        .unwrap_or(Duration::ZERO)
}

/// Format a DateTime for display with full date and time.
pub fn format_datetime_full(dt: &DateTime<Local>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Helper to format durations in human-readable form
pub fn format_duration(d: Duration) -> String {
    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Anything that can be reduced to a calendar day (time-of-day stripped).
pub trait CalendarDay {
    fn calendar_day(&self) -> NaiveDate;
}

impl CalendarDay for NaiveDate {
    fn calendar_day(&self) -> NaiveDate {
        *self
    }
}

impl CalendarDay for NaiveDateTime {
    fn calendar_day(&self) -> NaiveDate {
        self.date()
    }
}

impl<Tz: TimeZone> CalendarDay for DateTime<Tz> {
    fn calendar_day(&self) -> NaiveDate {
        self.date_naive()
    }
}

impl<T: CalendarDay + ?Sized> CalendarDay for &T {
    fn calendar_day(&self) -> NaiveDate {
        (**self).calendar_day()
    }
}

/// Parse a date as entered in a form or returned by the HR API.
///
/// Accepts a plain `YYYY-MM-DD` date, an RFC 3339 timestamp, or a naive
/// `YYYY-MM-DDTHH:MM:SS` / `YYYY-MM-DD HH:MM:SS` timestamp. Any time-of-day
/// is discarded.
pub fn parse_calendar_day(value: &str) -> Result<NaiveDate, StaffdeskError> {
    let trimmed = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.calendar_day());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(dt.calendar_day());
        }
    }

    Err(StaffdeskError::InvalidDate {
        value: value.to_string(),
        message: "expected YYYY-MM-DD or an ISO 8601 timestamp".into(),
    })
}
