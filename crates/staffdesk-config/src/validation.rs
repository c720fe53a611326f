//! Configuration validation

use crate::policy::{
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_MS, DEFAULT_WARNING_WINDOW_MS,
    DEFAULT_WORK_HOURS_PER_DAY,
};
use crate::schema::{RawConfig, RawLeaveConfig, RawSessionConfig};
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("session.timeout_ms must be greater than zero")]
    ZeroTimeout,

    #[error("session.warning_window_ms ({warning_window_ms}) must be shorter than session.timeout_ms ({timeout_ms})")]
    WarningExceedsTimeout {
        warning_window_ms: u64,
        timeout_ms: u64,
    },

    #[error("session.poll_interval_ms must be greater than zero")]
    ZeroPollInterval,

    #[error("leave.work_hours_per_day must be between 1 and 24, got {0}")]
    InvalidWorkHours(u32),
}

/// Validate a raw configuration, collecting every problem found
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = validate_session(&config.session);
    errors.extend(validate_leave(&config.leave));
    errors
}

fn validate_session(session: &RawSessionConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let timeout_ms = session.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS);
    let warning_window_ms = session.warning_window_ms.unwrap_or(DEFAULT_WARNING_WINDOW_MS);
    let poll_interval_ms = session.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS);

    if timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout);
    } else if warning_window_ms >= timeout_ms {
        errors.push(ValidationError::WarningExceedsTimeout {
            warning_window_ms,
            timeout_ms,
        });
    }

    if poll_interval_ms == 0 {
        errors.push(ValidationError::ZeroPollInterval);
    }

    errors
}

fn validate_leave(leave: &RawLeaveConfig) -> Vec<ValidationError> {
    let hours = leave.work_hours_per_day.unwrap_or(DEFAULT_WORK_HOURS_PER_DAY);
    if (1..=24).contains(&hours) {
        Vec::new()
    } else {
        vec![ValidationError::InvalidWorkHours(hours)]
    }
}
