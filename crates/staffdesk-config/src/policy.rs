//! Validated policy structures

use crate::schema::{RawConfig, RawLeaveConfig, RawServiceConfig, RawSessionConfig};
use std::path::PathBuf;
use std::time::Duration;

/// Default inactivity timeout (15 minutes)
pub const DEFAULT_TIMEOUT_MS: u64 = 900_000;

/// Default warning window (2 minutes)
pub const DEFAULT_WARNING_WINDOW_MS: u64 = 120_000;

/// Default poll interval (30 seconds)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 30_000;

/// Default delay between the expiry notice and logout
pub const DEFAULT_EXPIRY_GRACE_MS: u64 = 2_000;

/// Default hours per working day
pub const DEFAULT_WORK_HOURS_PER_DAY: u32 = 8;

/// Validated policy ready for use by the engines
#[derive(Debug, Clone, Default)]
pub struct Policy {
    /// Service configuration
    pub service: ServiceConfig,

    /// Session inactivity timings
    pub session: SessionTimings,

    /// Leave request settings
    pub leave: LeaveSettings,
}

impl Policy {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            service: ServiceConfig::from_raw(raw.service),
            session: SessionTimings::from_raw(&raw.session),
            leave: LeaveSettings::from_raw(&raw.leave),
        }
    }
}

/// Service configuration
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    /// Data directory override. None means use the platform default.
    pub data_dir: Option<PathBuf>,
}

impl ServiceConfig {
    fn from_raw(raw: RawServiceConfig) -> Self {
        Self {
            data_dir: raw.data_dir,
        }
    }
}

/// Inactivity timings for the session monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimings {
    /// Inactivity after which the session expires
    pub timeout: Duration,
    /// Trailing part of the timeout during which the user is warned
    pub warning_window: Duration,
    /// Interval of the periodic state recomputation
    pub poll_interval: Duration,
    /// Delay between the expiry notice and logout
    pub expiry_grace: Duration,
}

impl SessionTimings {
    pub(crate) fn from_raw(raw: &RawSessionConfig) -> Self {
        Self {
            timeout: Duration::from_millis(raw.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS)),
            warning_window: Duration::from_millis(
                raw.warning_window_ms.unwrap_or(DEFAULT_WARNING_WINDOW_MS),
            ),
            poll_interval: Duration::from_millis(
                raw.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS),
            ),
            expiry_grace: Duration::from_millis(
                raw.expiry_grace_ms.unwrap_or(DEFAULT_EXPIRY_GRACE_MS),
            ),
        }
    }

    /// Elapsed inactivity at which the warning window opens
    pub fn warning_starts_after(&self) -> Duration {
        self.timeout.saturating_sub(self.warning_window)
    }
}

impl Default for SessionTimings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            warning_window: Duration::from_millis(DEFAULT_WARNING_WINDOW_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            expiry_grace: Duration::from_millis(DEFAULT_EXPIRY_GRACE_MS),
        }
    }
}

/// Leave request settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaveSettings {
    /// Fallback for permission hours: days * work_hours_per_day
    pub work_hours_per_day: u32,
}

impl LeaveSettings {
    fn from_raw(raw: &RawLeaveConfig) -> Self {
        Self {
            work_hours_per_day: raw
                .work_hours_per_day
                .unwrap_or(DEFAULT_WORK_HOURS_PER_DAY),
        }
    }
}

impl Default for LeaveSettings {
    fn default() -> Self {
        Self {
            work_hours_per_day: DEFAULT_WORK_HOURS_PER_DAY,
        }
    }
}
