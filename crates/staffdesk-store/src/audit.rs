//! Audit event types

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use staffdesk_api::{LeaveKind, SessionEndReason};
use staffdesk_util::{EmployeeId, LeaveId, SessionId, SessionKey};

/// Types of audit events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEventType {
    /// Successful login started a session
    SessionStarted {
        session_key: SessionKey,
        session_id: SessionId,
    },

    /// A persisted session was resumed after a restart
    SessionRestored {
        session_key: SessionKey,
        session_id: SessionId,
        last_activity_at: DateTime<Local>,
    },

    /// Session entered the warning window
    SessionWarning {
        session_id: SessionId,
        minutes_remaining: u64,
    },

    /// Session ended
    SessionEnded {
        session_key: SessionKey,
        session_id: SessionId,
        reason: SessionEndReason,
    },

    /// Persisted session entries were stale or malformed and got cleared
    StaleSessionCleared {
        session_key: SessionKey,
        detail: String,
    },

    /// A leave request was accepted by the directory
    LeaveSubmitted {
        leave_id: LeaveId,
        kind: LeaveKind,
        employee_id: EmployeeId,
        start_date: NaiveDate,
        end_date: NaiveDate,
        day_count: u32,
    },

    /// A leave request was blocked before reaching the directory
    LeaveBlocked {
        kind: LeaveKind,
        employee_id: EmployeeId,
        reasons: Vec<String>,
    },
}

/// Full audit event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID
    pub id: i64,

    /// Event timestamp
    pub timestamp: DateTime<Local>,

    /// Event type and details
    pub event: AuditEventType,
}

impl AuditEvent {
    pub fn new(event: AuditEventType) -> Self {
        Self {
            id: 0, // Set by store
            timestamp: staffdesk_util::now(),
            event,
        }
    }
}
