//! Session runtime: drives a [`SessionMonitor`] from a poll timer, an
//! activity source and explicit commands on a single task.

use chrono::{DateTime, Local};
use staffdesk_api::{SessionEndReason, SessionState};
use staffdesk_core::{SessionEvent, SessionMonitor};
use staffdesk_host_api::{ActivitySource, HostResult, SessionSignals};
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, Sleep};
use tracing::{debug, info, warn};

/// Commands accepted by a running session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuntimeCommand {
    /// Explicit logout: clears persisted state and terminates
    Logout,
    /// Component teardown: stops timers and listeners, keeps persisted state
    Shutdown,
}

/// How a runtime finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeExit {
    LoggedOut,
    Expired,
    Shutdown,
}

/// Wall clock anchored to the tokio clock, so that paused test time and
/// the session timestamps advance together.
#[derive(Debug, Clone, Copy)]
struct RuntimeClock {
    wall_base: DateTime<Local>,
    mono_base: Instant,
}

impl RuntimeClock {
    fn starting_now() -> Self {
        Self {
            wall_base: staffdesk_util::now(),
            mono_base: Instant::now(),
        }
    }

    fn now(&self) -> DateTime<Local> {
        let elapsed = Instant::now().duration_since(self.mono_base);
        self.wall_base + chrono::Duration::from_std(elapsed).unwrap_or_else(|_| chrono::Duration::zero())
    }
}

/// Detaches the activity source when the session task ends, however it ends
struct DetachGuard(Arc<dyn ActivitySource>);

impl Drop for DetachGuard {
    fn drop(&mut self) {
        self.0.detach();
        debug!("Activity source detached");
    }
}

/// Handle to a running session task
pub struct SessionRuntime {
    commands: mpsc::UnboundedSender<RuntimeCommand>,
    state: watch::Receiver<SessionState>,
    task: JoinHandle<RuntimeExit>,
    exit: Option<RuntimeExit>,
}

impl SessionRuntime {
    /// Attach to `activity` and start polling.
    ///
    /// The first poll runs immediately, so a restored session that is
    /// already inside the warning window is announced right away.
    pub fn spawn(
        monitor: SessionMonitor,
        activity: Arc<dyn ActivitySource>,
        signals: Arc<dyn SessionSignals>,
    ) -> HostResult<Self> {
        let activity_rx = activity.attach()?;
        let guard = DetachGuard(activity);

        let (commands, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(monitor.state());

        info!(
            session_id = %monitor.session_id(),
            poll_interval_ms = monitor.timings().poll_interval.as_millis() as u64,
            "Session runtime started"
        );

        let task = tokio::spawn(run_session(
            monitor,
            activity_rx,
            command_rx,
            signals,
            state_tx,
            guard,
            RuntimeClock::starting_now(),
        ));

        Ok(Self {
            commands,
            state,
            task,
            exit: None,
        })
    }

    /// Last published state
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Request an explicit logout; [`wait`](Self::wait) to observe it
    pub fn logout(&self) {
        if self.commands.send(RuntimeCommand::Logout).is_err() {
            debug!("Logout requested after session task finished");
        }
    }

    /// Wait until the session ends on its own (expiry or logout)
    pub async fn wait(&mut self) -> RuntimeExit {
        if let Some(exit) = self.exit {
            return exit;
        }

        let exit = match (&mut self.task).await {
            Ok(exit) => exit,
            Err(e) => {
                warn!(error = %e, "Session task failed");
                RuntimeExit::Shutdown
            }
        };
        self.exit = Some(exit);
        exit
    }

    /// Tear down timers and listeners without ending the session
    pub async fn shutdown(mut self) -> RuntimeExit {
        if self.exit.is_none() {
            let _ = self.commands.send(RuntimeCommand::Shutdown);
        }
        self.wait().await
    }
}

async fn expiry_elapsed(expiry: &mut Option<Pin<Box<Sleep>>>) {
    match expiry {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}

async fn run_session(
    mut monitor: SessionMonitor,
    mut activity_rx: mpsc::UnboundedReceiver<staffdesk_host_api::ActivityEvent>,
    mut command_rx: mpsc::UnboundedReceiver<RuntimeCommand>,
    signals: Arc<dyn SessionSignals>,
    state_tx: watch::Sender<SessionState>,
    _guard: DetachGuard,
    clock: RuntimeClock,
) -> RuntimeExit {
    let mut ticker = tokio::time::interval(monitor.timings().poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut expiry: Option<Pin<Box<Sleep>>> = None;
    let mut activity_open = true;

    let exit = loop {
        tokio::select! {
            _ = ticker.tick() => {
                for event in monitor.tick(clock.now()) {
                    match event {
                        SessionEvent::Notify(notice) => signals.notify(notice),
                        SessionEvent::ExpireDue { session_id, grace } => {
                            debug!(session_id = %session_id, grace_ms = grace.as_millis() as u64, "Logout scheduled");
                            expiry = Some(Box::pin(tokio::time::sleep(grace)));
                        }
                    }
                }
            }

            event = activity_rx.recv(), if activity_open => {
                match event {
                    Some(event) => {
                        if monitor.on_activity(clock.now()) {
                            debug!(kind = %event.kind, "Activity");
                        }
                    }
                    None => {
                        warn!("Activity source closed");
                        activity_open = false;
                    }
                }
            }

            _ = expiry_elapsed(&mut expiry) => {
                if monitor.end(SessionEndReason::Expired) {
                    signals.terminate();
                }
                break RuntimeExit::Expired;
            }

            command = command_rx.recv() => {
                match command {
                    Some(RuntimeCommand::Logout) => {
                        if monitor.end(SessionEndReason::Logout) {
                            signals.terminate();
                        }
                        break RuntimeExit::LoggedOut;
                    }
                    Some(RuntimeCommand::Shutdown) | None => {
                        break RuntimeExit::Shutdown;
                    }
                }
            }
        }

        state_tx.send_replace(monitor.state());
    };

    state_tx.send_replace(monitor.state());
    info!(session_id = %monitor.session_id(), exit = ?exit, "Session runtime stopped");
    exit
}

/// Owns at most one running session.
///
/// Mounting a new session first shuts down the previous one, so no two
/// poll timers or listener sets are ever live at once.
#[derive(Default)]
pub struct SessionSupervisor {
    current: Option<SessionRuntime>,
}

impl SessionSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn mount(
        &mut self,
        monitor: SessionMonitor,
        activity: Arc<dyn ActivitySource>,
        signals: Arc<dyn SessionSignals>,
    ) -> HostResult<&mut SessionRuntime> {
        if let Some(previous) = self.current.take() {
            let exit = previous.shutdown().await;
            debug!(exit = ?exit, "Previous session runtime stopped");
        }

        let runtime = SessionRuntime::spawn(monitor, activity, signals)?;
        Ok(self.current.insert(runtime))
    }

    pub async fn unmount(&mut self) -> Option<RuntimeExit> {
        match self.current.take() {
            Some(runtime) => Some(runtime.shutdown().await),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use staffdesk_api::NoticeKind;
    use staffdesk_config::SessionTimings;
    use staffdesk_host_api::{ActivityKind, MockActivitySource, RecordingSignals};
    use staffdesk_store::{SqliteStore, Store, LAST_ACTIVITY_ENTRY, SESSION_MARKER_ENTRY};
    use staffdesk_util::SessionKey;
    use std::time::Duration;

    struct Harness {
        store: Arc<dyn Store>,
        activity: Arc<MockActivitySource>,
        signals: Arc<RecordingSignals>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                store: Arc::new(SqliteStore::in_memory().unwrap()),
                activity: Arc::new(MockActivitySource::new()),
                signals: Arc::new(RecordingSignals::new()),
            }
        }

        fn login(&self) -> SessionMonitor {
            SessionMonitor::login(
                SessionKey::new("admin"),
                SessionTimings::default(),
                self.store.clone(),
                staffdesk_util::now(),
            )
        }

        fn spawn(&self) -> SessionRuntime {
            SessionRuntime::spawn(self.login(), self.activity.clone(), self.signals.clone()).unwrap()
        }

        fn has_session_entries(&self) -> bool {
            let key = SessionKey::new("admin");
            self.store.get_session_value(&key, SESSION_MARKER_ENTRY).unwrap().is_some()
                || self.store.get_session_value(&key, LAST_ACTIVITY_ENTRY).unwrap().is_some()
        }
    }

    async fn minutes(m: u64) {
        tokio::time::sleep(Duration::from_secs(m * 60)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn warns_once_then_expires_after_grace() {
        let h = Harness::new();
        let mut runtime = h.spawn();

        minutes(14).await;
        let notices = h.signals.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, NoticeKind::Warning);
        assert_eq!(runtime.state(), SessionState::Warning);

        // The poll at 15:00 expires the session; logout waits out the grace
        tokio::time::sleep(Duration::from_secs(60) + Duration::from_millis(1900)).await;
        let notices = h.signals.notices();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[1].kind, NoticeKind::Expired);
        assert_eq!(runtime.state(), SessionState::Expired);
        assert_eq!(h.signals.terminations(), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(h.signals.terminations(), 1);

        assert_eq!(runtime.wait().await, RuntimeExit::Expired);

        let notices = h.signals.notices();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[1].kind, NoticeKind::Expired);
        assert_eq!(h.signals.terminations(), 1);
        assert_eq!(runtime.state(), SessionState::Expired);
        assert!(!h.has_session_entries());
        assert!(!h.activity.is_attached());
    }

    #[tokio::test(start_paused = true)]
    async fn activity_keeps_session_alive() {
        let h = Harness::new();
        let runtime = h.spawn();

        for _ in 0..4 {
            minutes(10).await;
            assert!(h.activity.emit(ActivityKind::Pointer));
        }

        minutes(5).await;
        assert!(h.signals.notices().is_empty());
        assert_eq!(h.signals.terminations(), 0);
        assert_eq!(runtime.state(), SessionState::Active);

        assert_eq!(runtime.shutdown().await, RuntimeExit::Shutdown);
    }

    #[tokio::test(start_paused = true)]
    async fn activity_during_warning_returns_to_active() {
        let h = Harness::new();
        let runtime = h.spawn();

        minutes(14).await;
        assert_eq!(runtime.state(), SessionState::Warning);

        h.activity.emit(ActivityKind::Key);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(runtime.state(), SessionState::Active);

        // Next poll stays quiet
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(h.signals.notices().len(), 1);
        assert_eq!(runtime.state(), SessionState::Active);

        runtime.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn activity_after_timeout_does_not_revive_session() {
        let h = Harness::new();
        let mut runtime = h.spawn();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(h.activity.emit(ActivityKind::Pointer));

        // 15:20, ten seconds past the timeout and before the 15:30 poll
        minutes(15).await;
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(runtime.state(), SessionState::Warning);
        assert!(h.activity.emit(ActivityKind::Key));

        assert_eq!(runtime.wait().await, RuntimeExit::Expired);
        assert_eq!(h.signals.terminations(), 1);

        let notices = h.signals.notices();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[1].kind, NoticeKind::Expired);
        assert!(!h.has_session_entries());
    }

    #[tokio::test(start_paused = true)]
    async fn logout_clears_state_and_terminates_once() {
        let h = Harness::new();
        let mut runtime = h.spawn();

        minutes(1).await;
        runtime.logout();
        runtime.logout();

        assert_eq!(runtime.wait().await, RuntimeExit::LoggedOut);
        assert_eq!(h.signals.terminations(), 1);
        assert!(!h.has_session_entries());
        assert_eq!(h.activity.detach_count(), 1);

        // No late tick fires after logout
        minutes(20).await;
        assert_eq!(h.signals.terminations(), 1);
        assert!(h.signals.notices().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn logout_during_grace_cancels_expiry() {
        let h = Harness::new();
        let mut runtime = h.spawn();

        minutes(15).await;
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(runtime.state(), SessionState::Expired);
        assert_eq!(h.signals.terminations(), 0);

        runtime.logout();
        assert_eq!(runtime.wait().await, RuntimeExit::LoggedOut);

        minutes(1).await;
        assert_eq!(h.signals.terminations(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_keeps_persisted_session() {
        let h = Harness::new();
        let runtime = h.spawn();

        minutes(3).await;
        assert_eq!(runtime.shutdown().await, RuntimeExit::Shutdown);

        assert!(h.has_session_entries());
        assert_eq!(h.signals.terminations(), 0);
        assert!(!h.activity.is_attached());
    }

    #[tokio::test(start_paused = true)]
    async fn remount_replaces_previous_runtime() {
        let h = Harness::new();
        let mut supervisor = SessionSupervisor::new();

        supervisor
            .mount(h.login(), h.activity.clone(), h.signals.clone())
            .await
            .unwrap();
        supervisor
            .mount(h.login(), h.activity.clone(), h.signals.clone())
            .await
            .unwrap();

        assert_eq!(h.activity.attach_count(), 2);
        assert_eq!(h.activity.detach_count(), 1);
        assert!(h.activity.is_attached());

        assert_eq!(supervisor.unmount().await, Some(RuntimeExit::Shutdown));
        assert_eq!(supervisor.unmount().await, None);
        assert_eq!(h.activity.detach_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn second_attach_fails_while_mounted() {
        let h = Harness::new();
        let runtime = h.spawn();

        let second = SessionRuntime::spawn(h.login(), h.activity.clone(), h.signals.clone());
        assert!(second.is_err());

        runtime.shutdown().await;
    }
}
