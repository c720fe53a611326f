//! Leave request form state
//!
//! Holds the draft being edited, the last loaded snapshot of existing
//! periods, and the current validation status. Every date edit re-runs
//! validation and the conflict engine synchronously; submission re-runs
//! them once more before anything is sent to the directory.

use chrono::NaiveDate;
use staffdesk_api::{
    CreatedLeave, LeaveKind, LeavePeriod, LeaveSnapshot, PermissionPayload, VacationPayload,
};
use staffdesk_config::LeaveSettings;
use staffdesk_host_api::{DirectoryResult, LeaveDirectory};
use staffdesk_util::EmployeeId;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{conflict_message, evaluate, LeaveCandidate};

/// Field-level validation errors of a draft
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("Start date is required")]
    MissingStartDate,

    #[error("End date is required")]
    MissingEndDate,

    #[error("End date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
}

/// Leave request being edited
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveRequestDraft {
    pub employee_id: EmployeeId,
    pub kind: LeaveKind,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Explicit permission hours; ignored for vacations
    pub hours: Option<u32>,
    pub reason: Option<String>,
}

impl LeaveRequestDraft {
    pub fn new(employee_id: EmployeeId, kind: LeaveKind) -> Self {
        Self {
            employee_id,
            kind,
            start_date: None,
            end_date: None,
            hours: None,
            reason: None,
        }
    }

    /// Validated date range, checked before any conflict evaluation
    pub fn candidate(&self) -> Result<LeaveCandidate, DraftError> {
        let start = self.start_date.ok_or(DraftError::MissingStartDate)?;
        let end = self.end_date.ok_or(DraftError::MissingEndDate)?;

        if end < start {
            return Err(DraftError::EndBeforeStart { start, end });
        }

        Ok(LeaveCandidate::new(self.employee_id, start, end))
    }

    /// Day count of the draft, 0 while the range is incomplete or invalid
    pub fn day_count(&self) -> u32 {
        self.candidate().map(|c| c.day_count()).unwrap_or(0)
    }
}

/// Validation status shown next to the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormStatus {
    /// A boundary date is still missing
    Incomplete(DraftError),

    /// End date precedes start date
    InvalidRange(DraftError),

    /// Overlaps an existing active period
    Conflict {
        day_count: u32,
        period: LeavePeriod,
        message: String,
    },

    /// No conflict found in the loaded snapshot
    Ready { day_count: u32 },
}

impl FormStatus {
    pub fn day_count(&self) -> u32 {
        match self {
            FormStatus::Conflict { day_count, .. } | FormStatus::Ready { day_count } => *day_count,
            FormStatus::Incomplete(_) | FormStatus::InvalidRange(_) => 0,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, FormStatus::Ready { .. })
    }
}

/// Why a submission was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockReason {
    /// Existing periods have never been loaded successfully
    SnapshotNotLoaded,

    /// Draft failed field validation
    InvalidDraft(DraftError),

    /// Draft overlaps an active period
    Conflict { period: LeavePeriod, message: String },
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockReason::SnapshotNotLoaded => {
                write!(f, "Existing vacations and permissions could not be loaded")
            }
            BlockReason::InvalidDraft(e) => write!(f, "{}", e),
            BlockReason::Conflict { message, .. } => write!(f, "{}", message),
        }
    }
}

/// Outcome of [`LeaveRequestForm::submit`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitDecision {
    /// Directory accepted the request
    Submitted(CreatedLeave),

    /// Refused before reaching the directory
    Blocked { reasons: Vec<BlockReason> },
}

/// Leave request form for one employee and one kind of leave
pub struct LeaveRequestForm {
    draft: LeaveRequestDraft,
    settings: LeaveSettings,
    snapshot: Option<LeaveSnapshot>,
    status: FormStatus,
}

impl LeaveRequestForm {
    pub fn new(employee_id: EmployeeId, kind: LeaveKind, settings: LeaveSettings) -> Self {
        let draft = LeaveRequestDraft::new(employee_id, kind);
        let status = FormStatus::Incomplete(DraftError::MissingStartDate);

        Self {
            draft,
            settings,
            snapshot: None,
            status,
        }
    }

    /// Install the result of a snapshot fetch.
    ///
    /// A failed fetch keeps whatever snapshot was loaded before.
    pub fn apply_snapshot(&mut self, result: DirectoryResult<LeaveSnapshot>) -> &FormStatus {
        match result {
            Ok(snapshot) => {
                debug!(
                    employee_id = %self.draft.employee_id,
                    periods = snapshot.len(),
                    "Leave snapshot loaded"
                );
                self.snapshot = Some(snapshot);
            }
            Err(e) => {
                warn!(
                    employee_id = %self.draft.employee_id,
                    error = %e,
                    keeping_previous = self.snapshot.is_some(),
                    "Failed to load leave snapshot"
                );
            }
        }

        self.reevaluate()
    }

    /// Fetch the employee's periods from `directory` and apply them
    pub async fn refresh(&mut self, directory: &dyn LeaveDirectory) -> &FormStatus {
        let result = directory.list_leave_periods(self.draft.employee_id).await;
        self.apply_snapshot(result)
    }

    pub fn set_start_date(&mut self, date: Option<NaiveDate>) -> &FormStatus {
        self.draft.start_date = date;
        self.reevaluate()
    }

    pub fn set_end_date(&mut self, date: Option<NaiveDate>) -> &FormStatus {
        self.draft.end_date = date;
        self.reevaluate()
    }

    pub fn set_hours(&mut self, hours: Option<u32>) {
        self.draft.hours = hours;
    }

    pub fn set_reason(&mut self, reason: Option<String>) {
        self.draft.reason = reason;
    }

    /// Discard the draft dates and free-text fields
    pub fn cancel(&mut self) {
        let employee_id = self.draft.employee_id;
        let kind = self.draft.kind;
        self.draft = LeaveRequestDraft::new(employee_id, kind);
        self.reevaluate();
    }

    pub fn draft(&self) -> &LeaveRequestDraft {
        &self.draft
    }

    pub fn status(&self) -> &FormStatus {
        &self.status
    }

    pub fn snapshot(&self) -> Option<&LeaveSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn can_submit(&self) -> bool {
        self.snapshot.is_some() && self.status.is_ready()
    }

    fn reevaluate(&mut self) -> &FormStatus {
        let empty = LeaveSnapshot::empty();
        let snapshot = self.snapshot.as_ref().unwrap_or(&empty);

        self.status = match self.draft.candidate() {
            Err(e @ DraftError::EndBeforeStart { .. }) => FormStatus::InvalidRange(e),
            Err(e) => FormStatus::Incomplete(e),
            Ok(candidate) => {
                let evaluation = evaluate(&candidate, snapshot);
                match evaluation.conflict {
                    Some(period) => FormStatus::Conflict {
                        day_count: evaluation.day_count,
                        message: conflict_message(&period),
                        period,
                    },
                    None => FormStatus::Ready {
                        day_count: evaluation.day_count,
                    },
                }
            }
        };

        debug!(employee_id = %self.draft.employee_id, status = ?self.status, "Leave draft evaluated");
        &self.status
    }

    /// Submit the draft to `directory`.
    ///
    /// Validation and the conflict check run again first; if either fails
    /// (or no snapshot was ever loaded) nothing is sent and the reasons are
    /// returned. Directory errors are propagated and the draft is kept for
    /// a retry. On success the draft is discarded.
    pub async fn submit(&mut self, directory: &dyn LeaveDirectory) -> DirectoryResult<SubmitDecision> {
        self.reevaluate();

        let mut reasons = Vec::new();
        if self.snapshot.is_none() {
            reasons.push(BlockReason::SnapshotNotLoaded);
        }

        let candidate = match &self.status {
            FormStatus::Incomplete(e) | FormStatus::InvalidRange(e) => {
                reasons.push(BlockReason::InvalidDraft(*e));
                None
            }
            FormStatus::Conflict { period, message, .. } => {
                reasons.push(BlockReason::Conflict {
                    period: period.clone(),
                    message: message.clone(),
                });
                None
            }
            FormStatus::Ready { .. } => self.draft.candidate().ok(),
        };

        let candidate = match candidate {
            Some(candidate) if reasons.is_empty() => candidate,
            _ => {
                info!(
                    employee_id = %self.draft.employee_id,
                    kind = %self.draft.kind,
                    reasons = reasons.len(),
                    "Leave request blocked"
                );
                return Ok(SubmitDecision::Blocked { reasons });
            }
        };

        let day_count = candidate.day_count();
        let created = match self.draft.kind {
            LeaveKind::Vacation => {
                directory
                    .create_vacation(VacationPayload {
                        employee_id: candidate.employee_id,
                        start_date: candidate.start_date,
                        end_date: candidate.end_date,
                        days_granted: day_count,
                        days_taken: day_count,
                        reason: self.draft.reason.clone(),
                    })
                    .await?
            }
            LeaveKind::Permission => {
                let hours = self
                    .draft
                    .hours
                    .unwrap_or_else(|| day_count.saturating_mul(self.settings.work_hours_per_day));

                directory
                    .create_permission(PermissionPayload {
                        employee_id: candidate.employee_id,
                        start_date: candidate.start_date,
                        end_date: candidate.end_date,
                        days: day_count,
                        hours,
                        reason: self.draft.reason.clone(),
                    })
                    .await?
            }
        };

        info!(
            leave_id = %created.id,
            employee_id = %created.employee_id,
            kind = %created.kind,
            day_count = created.day_count,
            "Leave request submitted"
        );

        self.cancel();
        Ok(SubmitDecision::Submitted(created))
    }
}
