//! Session inactivity state machine

use chrono::{DateTime, Local};
use staffdesk_api::{SessionEndReason, SessionInfo, SessionNotice, SessionState};
use staffdesk_config::SessionTimings;
use staffdesk_store::{
    AuditEvent, AuditEventType, Store, LAST_ACTIVITY_ENTRY, SESSION_MARKER_ENTRY,
    SESSION_MARKER_VALUE,
};
use staffdesk_util::{elapsed_between, from_epoch_millis, to_epoch_millis, SessionId, SessionKey};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::SessionEvent;

/// State implied by `elapsed` inactivity.
///
/// `Expired` iff `elapsed >= timeout`; `Warning` iff
/// `timeout - warning_window <= elapsed < timeout`; otherwise `Active`.
pub fn classify(elapsed: Duration, timings: &SessionTimings) -> SessionState {
    if elapsed >= timings.timeout {
        SessionState::Expired
    } else if elapsed >= timings.warning_starts_after() {
        SessionState::Warning
    } else {
        SessionState::Active
    }
}

/// Whole minutes left before expiry, rounded up
pub fn minutes_remaining(elapsed: Duration, timings: &SessionTimings) -> u64 {
    let remaining_ms = timings.timeout.saturating_sub(elapsed).as_millis() as u64;
    remaining_ms.div_ceil(60_000)
}

/// Inactivity tracker for one authenticated session.
///
/// Created at login (or restored from the store after a restart) and
/// consumed by [`end`](SessionMonitor::end). All time inputs are passed in
/// explicitly so the machine can be driven without a real clock.
pub struct SessionMonitor {
    key: SessionKey,
    session_id: SessionId,
    timings: SessionTimings,
    store: Arc<dyn Store>,
    last_activity_at: DateTime<Local>,
    state: SessionState,
    warning_issued: bool,
    ended: Option<SessionEndReason>,
}

impl SessionMonitor {
    /// Start a fresh session after a successful login
    pub fn login(
        key: SessionKey,
        timings: SessionTimings,
        store: Arc<dyn Store>,
        now: DateTime<Local>,
    ) -> Self {
        let monitor = Self::build(key, timings, store, now);

        if let Err(e) = monitor
            .store
            .set_session_value(&monitor.key, SESSION_MARKER_ENTRY, SESSION_MARKER_VALUE)
        {
            warn!(session_key = %monitor.key, error = %e, "Failed to persist session marker");
        }
        monitor.persist_activity();

        let _ = monitor.store.append_audit(AuditEvent::new(AuditEventType::SessionStarted {
            session_key: monitor.key.clone(),
            session_id: monitor.session_id.clone(),
        }));

        info!(
            session_key = %monitor.key,
            session_id = %monitor.session_id,
            timeout_secs = timings.timeout.as_secs(),
            "Session started"
        );

        monitor
    }

    /// Resume a persisted session, if one is still within the timeout.
    ///
    /// Missing, partial, malformed or timed-out entries are cleared and
    /// `None` is returned; the caller then requires a fresh login. A
    /// timestamp in the future is clamped to `now`.
    pub fn restore(
        key: SessionKey,
        timings: SessionTimings,
        store: Arc<dyn Store>,
        now: DateTime<Local>,
    ) -> Option<Self> {
        let stored_at = match read_entries(store.as_ref(), &key) {
            PersistedEntries::Missing => {
                debug!(session_key = %key, "No persisted session");
                return None;
            }
            PersistedEntries::Invalid(detail) => {
                clear_stale(&store, &key, detail);
                return None;
            }
            PersistedEntries::Valid(stored_at) => stored_at,
        };

        let last_activity_at = stored_at.min(now);
        let elapsed = elapsed_between(&last_activity_at, &now);
        if elapsed >= timings.timeout {
            clear_stale(
                &store,
                &key,
                format!("session timed out {}s ago", (elapsed - timings.timeout).as_secs()),
            );
            return None;
        }

        let monitor = Self::build(key, timings, store, last_activity_at);
        if stored_at > now {
            warn!(session_key = %monitor.key, "Persisted activity lies in the future, clamping");
            monitor.persist_activity();
        }

        let _ = monitor.store.append_audit(AuditEvent::new(AuditEventType::SessionRestored {
            session_key: monitor.key.clone(),
            session_id: monitor.session_id.clone(),
            last_activity_at,
        }));

        info!(
            session_key = %monitor.key,
            session_id = %monitor.session_id,
            idle_secs = elapsed.as_secs(),
            "Session restored"
        );

        Some(monitor)
    }

    fn build(
        key: SessionKey,
        timings: SessionTimings,
        store: Arc<dyn Store>,
        last_activity_at: DateTime<Local>,
    ) -> Self {
        Self {
            key,
            session_id: SessionId::new(),
            timings,
            store,
            last_activity_at,
            state: SessionState::Active,
            warning_issued: false,
            ended: None,
        }
    }

    /// Record a qualifying interaction.
    ///
    /// Resets the inactivity clock and returns the session to `Active`.
    /// Returns false (and changes nothing) once the session has expired or
    /// ended, including when the timeout has passed but no poll has
    /// observed it yet; the next [`tick`](Self::tick) then expires it.
    pub fn on_activity(&mut self, now: DateTime<Local>) -> bool {
        if self.ended.is_some() || self.state == SessionState::Expired {
            return false;
        }

        let elapsed = elapsed_between(&self.last_activity_at, &now);
        if elapsed >= self.timings.timeout {
            debug!(
                session_id = %self.session_id,
                idle_secs = elapsed.as_secs(),
                "Activity after timeout ignored"
            );
            return false;
        }

        if self.state == SessionState::Warning {
            info!(session_id = %self.session_id, "Activity during warning, session active again");
        }

        self.last_activity_at = now;
        self.state = SessionState::Active;
        self.warning_issued = false;
        self.persist_activity();
        true
    }

    /// Recompute the state from elapsed inactivity.
    ///
    /// The warning notice fires only on the transition into `Warning`; the
    /// expiry notice and [`SessionEvent::ExpireDue`] fire exactly once.
    /// Ticks after expiry or after [`end`](Self::end) are no-ops.
    pub fn tick(&mut self, now: DateTime<Local>) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        if self.ended.is_some() || self.state == SessionState::Expired {
            return events;
        }

        let elapsed = elapsed_between(&self.last_activity_at, &now);
        let next = classify(elapsed, &self.timings);

        debug!(
            session_id = %self.session_id,
            elapsed_ms = elapsed.as_millis() as u64,
            state = %next,
            "Session tick"
        );

        match next {
            SessionState::Expired => {
                self.state = SessionState::Expired;

                info!(
                    session_id = %self.session_id,
                    idle_secs = elapsed.as_secs(),
                    "Session expired"
                );

                events.push(SessionEvent::Notify(SessionNotice::expired()));
                events.push(SessionEvent::ExpireDue {
                    session_id: self.session_id.clone(),
                    grace: self.timings.expiry_grace,
                });
            }
            SessionState::Warning => {
                self.state = SessionState::Warning;

                if !self.warning_issued {
                    self.warning_issued = true;
                    let minutes = minutes_remaining(elapsed, &self.timings);

                    let _ = self.store.append_audit(AuditEvent::new(
                        AuditEventType::SessionWarning {
                            session_id: self.session_id.clone(),
                            minutes_remaining: minutes,
                        },
                    ));

                    info!(
                        session_id = %self.session_id,
                        minutes_remaining = minutes,
                        "Session warning issued"
                    );

                    events.push(SessionEvent::Notify(SessionNotice::expiring_in(minutes)));
                }
            }
            SessionState::Active => {
                self.state = SessionState::Active;
                self.warning_issued = false;
            }
        }

        events
    }

    /// End the session and clear its persisted entries.
    ///
    /// Returns false if the session had already ended, so a late expiry
    /// racing an explicit logout terminates only once.
    pub fn end(&mut self, reason: SessionEndReason) -> bool {
        if self.ended.is_some() {
            return false;
        }

        self.ended = Some(reason);
        if reason == SessionEndReason::Expired {
            self.state = SessionState::Expired;
        }

        if let Err(e) = self.store.clear_session(&self.key) {
            warn!(session_key = %self.key, error = %e, "Failed to clear session entries");
        }

        let _ = self.store.append_audit(AuditEvent::new(AuditEventType::SessionEnded {
            session_key: self.key.clone(),
            session_id: self.session_id.clone(),
            reason,
        }));

        info!(
            session_key = %self.key,
            session_id = %self.session_id,
            reason = ?reason,
            "Session ended"
        );

        true
    }

    fn persist_activity(&self) {
        let millis = to_epoch_millis(&self.last_activity_at).to_string();
        if let Err(e) = self
            .store
            .set_session_value(&self.key, LAST_ACTIVITY_ENTRY, &millis)
        {
            warn!(session_key = %self.key, error = %e, "Failed to persist last activity");
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn session_key(&self) -> &SessionKey {
        &self.key
    }

    pub fn timings(&self) -> &SessionTimings {
        &self.timings
    }

    pub fn last_activity_at(&self) -> DateTime<Local> {
        self.last_activity_at
    }

    pub fn is_ended(&self) -> bool {
        self.ended.is_some()
    }

    pub fn end_reason(&self) -> Option<SessionEndReason> {
        self.ended
    }

    /// Time left before the inactivity timeout
    pub fn time_remaining(&self, now: DateTime<Local>) -> Duration {
        self.timings
            .timeout
            .saturating_sub(elapsed_between(&self.last_activity_at, &now))
    }

    /// Get session info for display
    pub fn to_session_info(&self, now: DateTime<Local>) -> SessionInfo {
        SessionInfo {
            session_key: self.key.clone(),
            session_id: self.session_id.clone(),
            state: self.state,
            last_activity_at: self.last_activity_at,
            time_remaining: self.time_remaining(now),
        }
    }
}

/// Read-only view of a persisted session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPeek {
    pub last_activity_at: DateTime<Local>,
    pub state: SessionState,
    pub time_remaining: Duration,
}

/// Inspect the persisted entries for `key` without restoring them.
///
/// Unlike [`SessionMonitor::restore`] nothing is written: stale entries
/// are reported as `Expired` rather than cleared, and a future timestamp
/// is clamped only in the returned view. Missing or unreadable entries
/// yield `None`.
pub fn peek_session(
    store: &Arc<dyn Store>,
    key: &SessionKey,
    timings: &SessionTimings,
    now: DateTime<Local>,
) -> Option<SessionPeek> {
    let last_activity_at = match read_entries(store.as_ref(), key) {
        PersistedEntries::Valid(stored_at) => stored_at.min(now),
        PersistedEntries::Missing => return None,
        PersistedEntries::Invalid(detail) => {
            debug!(session_key = %key, detail = %detail, "Persisted session unreadable");
            return None;
        }
    };

    let elapsed = elapsed_between(&last_activity_at, &now);
    Some(SessionPeek {
        last_activity_at,
        state: classify(elapsed, timings),
        time_remaining: timings.timeout.saturating_sub(elapsed),
    })
}

enum PersistedEntries {
    Missing,
    Invalid(String),
    Valid(DateTime<Local>),
}

fn read_entries(store: &dyn Store, key: &SessionKey) -> PersistedEntries {
    let marker = store.get_session_value(key, SESSION_MARKER_ENTRY);
    let last_activity = store.get_session_value(key, LAST_ACTIVITY_ENTRY);

    let raw = match (marker, last_activity) {
        (Ok(None), Ok(None)) => return PersistedEntries::Missing,
        (Ok(Some(marker)), Ok(Some(raw))) if marker == SESSION_MARKER_VALUE => raw,
        (Ok(marker), Ok(raw)) => {
            return PersistedEntries::Invalid(format!(
                "incomplete session entries (marker: {:?}, last activity: {:?})",
                marker, raw
            ));
        }
        (Err(e), _) | (_, Err(e)) => {
            return PersistedEntries::Invalid(format!("failed to read session entries: {}", e));
        }
    };

    match raw.trim().parse::<i64>().ok().and_then(from_epoch_millis) {
        Some(stored_at) => PersistedEntries::Valid(stored_at),
        None => PersistedEntries::Invalid(format!("malformed last activity timestamp {:?}", raw)),
    }
}

fn clear_stale(store: &Arc<dyn Store>, key: &SessionKey, detail: String) {
    warn!(session_key = %key, detail = %detail, "Discarding persisted session");

    if let Err(e) = store.clear_session(key) {
        warn!(session_key = %key, error = %e, "Failed to clear stale session entries");
    }

    let _ = store.append_audit(AuditEvent::new(AuditEventType::StaleSessionCleared {
        session_key: key.clone(),
        detail,
    }));
}
