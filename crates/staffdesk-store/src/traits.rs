//! Store trait definitions

use staffdesk_util::SessionKey;

use crate::{AuditEvent, StoreResult};

/// Entry holding the authenticated-session marker
pub const SESSION_MARKER_ENTRY: &str = "authenticated";

/// Entry holding the last qualifying activity, as epoch milliseconds
pub const LAST_ACTIVITY_ENTRY: &str = "last_activity_at";

/// Value written to [`SESSION_MARKER_ENTRY`] while a session is live
pub const SESSION_MARKER_VALUE: &str = "true";

/// Main store trait
pub trait Store: Send + Sync {
    // Session entries

    /// Read one scalar entry of a session. Values are returned verbatim;
    /// interpreting them is up to the caller.
    fn get_session_value(&self, key: &SessionKey, entry: &str) -> StoreResult<Option<String>>;

    /// Write one scalar entry of a session
    fn set_session_value(&self, key: &SessionKey, entry: &str, value: &str) -> StoreResult<()>;

    /// Remove every entry of a session in one step
    fn clear_session(&self, key: &SessionKey) -> StoreResult<()>;

    // Audit log

    /// Append an audit event
    fn append_audit(&self, event: AuditEvent) -> StoreResult<()>;

    /// Get recent audit events, newest first
    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>>;
}
