//! Host interface traits

use async_trait::async_trait;
use staffdesk_api::{
    CreatedLeave, LeaveSnapshot, PermissionPayload, SessionNotice, VacationPayload,
};
use staffdesk_util::EmployeeId;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::ActivityEvent;

/// Errors from host-side operations
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Activity source already attached")]
    AlreadyAttached,

    #[error("Activity source unavailable: {0}")]
    Unavailable(String),
}

pub type HostResult<T> = Result<T, HostError>;

/// Errors from the HR directory
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Directory unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Source of qualifying user interactions (pointer, key, scroll, touch)
pub trait ActivitySource: Send + Sync {
    /// Register listeners and start delivering events.
    ///
    /// Called once per session lifetime; a second call before [`detach`]
    /// fails with [`HostError::AlreadyAttached`].
    ///
    /// [`detach`]: ActivitySource::detach
    fn attach(&self) -> HostResult<mpsc::UnboundedReceiver<ActivityEvent>>;

    /// Unregister listeners. Calling it while detached does nothing.
    fn detach(&self);
}

/// Observable side effects of the session monitor
pub trait SessionSignals: Send + Sync {
    /// Show a warning or expiry notice
    fn notify(&self, notice: SessionNotice);

    /// Session is over; the host should return to the logged-out screen
    fn terminate(&self);
}

/// Read/create access to vacation and permission records
#[async_trait]
pub trait LeaveDirectory: Send + Sync {
    /// Fetch the employee's existing vacations and permissions
    async fn list_leave_periods(&self, employee_id: EmployeeId) -> DirectoryResult<LeaveSnapshot>;

    /// Create a vacation record
    async fn create_vacation(&self, payload: VacationPayload) -> DirectoryResult<CreatedLeave>;

    /// Create a permission record
    async fn create_permission(&self, payload: PermissionPayload)
        -> DirectoryResult<CreatedLeave>;
}
