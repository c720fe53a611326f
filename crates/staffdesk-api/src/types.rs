//! Shared types for the staffdesk API

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use staffdesk_util::{EmployeeId, LeaveId, SessionId, SessionKey};
use std::fmt;
use std::time::Duration;

/// Which kind of leave record a period came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveKind {
    Vacation,
    Permission,
}

impl fmt::Display for LeaveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeaveKind::Vacation => write!(f, "vacation"),
            LeaveKind::Permission => write!(f, "permission"),
        }
    }
}

impl std::str::FromStr for LeaveKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "vacation" => Ok(LeaveKind::Vacation),
            "permission" => Ok(LeaveKind::Permission),
            other => Err(format!("Unknown leave kind: {}", other)),
        }
    }
}

/// Lifecycle of a vacation record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VacationStatus {
    Planned,
    InProgress,
    Completed,
    Canceled,
}

impl VacationStatus {
    /// Planned and in-progress vacations still block overlapping requests
    pub fn is_active(self) -> bool {
        matches!(self, VacationStatus::Planned | VacationStatus::InProgress)
    }
}

/// Lifecycle of a permission record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    Pending,
    Approved,
    Rejected,
}

impl PermissionStatus {
    /// Pending and approved permissions still block overlapping requests
    pub fn is_active(self) -> bool {
        matches!(self, PermissionStatus::Pending | PermissionStatus::Approved)
    }
}

/// Status of a leave record, discriminated by record kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "status", rename_all = "snake_case")]
pub enum LeaveStatus {
    Vacation(VacationStatus),
    Permission(PermissionStatus),
}

impl LeaveStatus {
    pub fn kind(&self) -> LeaveKind {
        match self {
            LeaveStatus::Vacation(_) => LeaveKind::Vacation,
            LeaveStatus::Permission(_) => LeaveKind::Permission,
        }
    }

    pub fn is_active(&self) -> bool {
        match self {
            LeaveStatus::Vacation(status) => status.is_active(),
            LeaveStatus::Permission(status) => status.is_active(),
        }
    }
}

/// A vacation or permission record as read from the HR directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeavePeriod {
    pub id: LeaveId,
    pub employee_id: EmployeeId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: LeaveStatus,
}

impl LeavePeriod {
    pub fn vacation(
        id: impl Into<LeaveId>,
        employee_id: impl Into<EmployeeId>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        status: VacationStatus,
    ) -> Self {
        Self {
            id: id.into(),
            employee_id: employee_id.into(),
            start_date,
            end_date,
            status: LeaveStatus::Vacation(status),
        }
    }

    pub fn permission(
        id: impl Into<LeaveId>,
        employee_id: impl Into<EmployeeId>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        status: PermissionStatus,
    ) -> Self {
        Self {
            id: id.into(),
            employee_id: employee_id.into(),
            start_date,
            end_date,
            status: LeaveStatus::Permission(status),
        }
    }

    pub fn kind(&self) -> LeaveKind {
        self.status.kind()
    }

    /// Only active periods participate in conflict checks
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// Read-only view of an employee's existing leave, fetched once per form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveSnapshot {
    #[serde(default)]
    pub vacations: Vec<LeavePeriod>,
    #[serde(default)]
    pub permissions: Vec<LeavePeriod>,
}

impl LeaveSnapshot {
    pub fn new(vacations: Vec<LeavePeriod>, permissions: Vec<LeavePeriod>) -> Self {
        Self {
            vacations,
            permissions,
        }
    }

    /// Snapshot used while nothing has been fetched yet
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.vacations.len() + self.permissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vacations.is_empty() && self.permissions.is_empty()
    }
}

/// Payload for creating a vacation record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacationPayload {
    pub employee_id: EmployeeId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days_granted: u32,
    pub days_taken: u32,
    pub reason: Option<String>,
}

/// Payload for creating a permission record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionPayload {
    pub employee_id: EmployeeId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: u32,
    pub hours: u32,
    pub reason: Option<String>,
}

/// Receipt returned by the directory after a leave record was created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedLeave {
    pub id: LeaveId,
    pub kind: LeaveKind,
    pub employee_id: EmployeeId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub day_count: u32,
}

/// Inactivity state of an authenticated session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Recent interaction, nothing to report
    Active,
    /// Inside the trailing warning window of the timeout
    Warning,
    /// Timeout reached; logout is imminent
    Expired,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Active => write!(f, "active"),
            SessionState::Warning => write!(f, "warning"),
            SessionState::Expired => write!(f, "expired"),
        }
    }
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEndReason {
    /// User logged out explicitly
    Logout,
    /// Inactivity timeout reached
    Expired,
}

/// Session info for status display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_key: SessionKey,
    pub session_id: SessionId,
    pub state: SessionState,
    pub last_activity_at: DateTime<Local>,
    pub time_remaining: Duration,
}
