//! Events emitted by the session monitor

use staffdesk_api::SessionNotice;
use staffdesk_util::SessionId;
use std::time::Duration;

/// Events emitted by [`SessionMonitor::tick`](crate::SessionMonitor::tick)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Show a notice to the user
    Notify(SessionNotice),

    /// Timeout reached; logout is due once `grace` has passed
    ExpireDue {
        session_id: SessionId,
        grace: Duration,
    },
}
