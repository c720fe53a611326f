//! Mock host implementations for testing

use async_trait::async_trait;
use staffdesk_api::{
    CreatedLeave, LeaveKind, LeavePeriod, LeaveSnapshot, PermissionPayload, PermissionStatus,
    SessionNotice, VacationPayload, VacationStatus,
};
use staffdesk_util::{EmployeeId, LeaveId};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;

use crate::{
    ActivityEvent, ActivityKind, ActivitySource, DirectoryError, DirectoryResult, HostError,
    HostResult, LeaveDirectory, SessionSignals,
};

/// Activity source driven by the test
#[derive(Default)]
pub struct MockActivitySource {
    sender: Mutex<Option<mpsc::UnboundedSender<ActivityEvent>>>,
    attach_count: AtomicUsize,
    detach_count: AtomicUsize,
}

impl MockActivitySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a user interaction. Returns false while detached.
    pub fn emit(&self, kind: ActivityKind) -> bool {
        match self.sender.lock().unwrap().as_ref() {
            Some(tx) => tx.send(ActivityEvent::new(kind)).is_ok(),
            None => false,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.sender.lock().unwrap().is_some()
    }

    pub fn attach_count(&self) -> usize {
        self.attach_count.load(Ordering::SeqCst)
    }

    pub fn detach_count(&self) -> usize {
        self.detach_count.load(Ordering::SeqCst)
    }
}

impl ActivitySource for MockActivitySource {
    fn attach(&self) -> HostResult<mpsc::UnboundedReceiver<ActivityEvent>> {
        let mut sender = self.sender.lock().unwrap();
        if sender.is_some() {
            return Err(HostError::AlreadyAttached);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        *sender = Some(tx);
        self.attach_count.fetch_add(1, Ordering::SeqCst);
        Ok(rx)
    }

    fn detach(&self) {
        if self.sender.lock().unwrap().take().is_some() {
            self.detach_count.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Signals sink that records everything it receives
#[derive(Default)]
pub struct RecordingSignals {
    notices: Mutex<Vec<SessionNotice>>,
    terminations: AtomicUsize,
}

impl RecordingSignals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<SessionNotice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn terminations(&self) -> usize {
        self.terminations.load(Ordering::SeqCst)
    }
}

impl SessionSignals for RecordingSignals {
    fn notify(&self, notice: SessionNotice) {
        self.notices.lock().unwrap().push(notice);
    }

    fn terminate(&self) {
        self.terminations.fetch_add(1, Ordering::SeqCst);
    }
}

/// Create request seen by [`MockDirectory`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateRequest {
    Vacation(VacationPayload),
    Permission(PermissionPayload),
}

/// In-memory HR directory
pub struct MockDirectory {
    periods: Mutex<LeaveSnapshot>,
    created: Mutex<Vec<CreateRequest>>,
    next_id: AtomicI64,

    /// Configure list_leave_periods to fail
    pub fail_list: AtomicBool,

    /// Configure create_* to fail
    pub fail_create: AtomicBool,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self::with_snapshot(LeaveSnapshot::empty())
    }

    pub fn with_snapshot(snapshot: LeaveSnapshot) -> Self {
        let next_id = snapshot
            .vacations
            .iter()
            .chain(snapshot.permissions.iter())
            .map(|p| p.id.get())
            .max()
            .unwrap_or(0)
            + 1;

        Self {
            periods: Mutex::new(snapshot),
            created: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(next_id),
            fail_list: AtomicBool::new(false),
            fail_create: AtomicBool::new(false),
        }
    }

    /// Create requests received so far
    pub fn created(&self) -> Vec<CreateRequest> {
        self.created.lock().unwrap().clone()
    }

    fn check_create(&self) -> DirectoryResult<LeaveId> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(DirectoryError::Unavailable("Mock create failure".into()));
        }
        Ok(LeaveId::new(self.next_id.fetch_add(1, Ordering::SeqCst)))
    }
}

impl Default for MockDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LeaveDirectory for MockDirectory {
    async fn list_leave_periods(&self, employee_id: EmployeeId) -> DirectoryResult<LeaveSnapshot> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(DirectoryError::Unavailable("Mock list failure".into()));
        }

        let periods = self.periods.lock().unwrap();
        let mine = |p: &&LeavePeriod| p.employee_id == employee_id;
        Ok(LeaveSnapshot::new(
            periods.vacations.iter().filter(mine).cloned().collect(),
            periods.permissions.iter().filter(mine).cloned().collect(),
        ))
    }

    async fn create_vacation(&self, payload: VacationPayload) -> DirectoryResult<CreatedLeave> {
        let id = self.check_create()?;

        self.periods.lock().unwrap().vacations.push(LeavePeriod::vacation(
            id,
            payload.employee_id,
            payload.start_date,
            payload.end_date,
            VacationStatus::Planned,
        ));

        let created = CreatedLeave {
            id,
            kind: LeaveKind::Vacation,
            employee_id: payload.employee_id,
            start_date: payload.start_date,
            end_date: payload.end_date,
            day_count: payload.days_granted,
        };
        self.created.lock().unwrap().push(CreateRequest::Vacation(payload));
        Ok(created)
    }

    async fn create_permission(
        &self,
        payload: PermissionPayload,
    ) -> DirectoryResult<CreatedLeave> {
        let id = self.check_create()?;

        self.periods.lock().unwrap().permissions.push(LeavePeriod::permission(
            id,
            payload.employee_id,
            payload.start_date,
            payload.end_date,
            PermissionStatus::Pending,
        ));

        let created = CreatedLeave {
            id,
            kind: LeaveKind::Permission,
            employee_id: payload.employee_id,
            start_date: payload.start_date,
            end_date: payload.end_date,
            day_count: payload.days,
        };
        self.created.lock().unwrap().push(CreateRequest::Permission(payload));
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn activity_source_attaches_once() {
        let source = MockActivitySource::new();
        assert!(!source.emit(ActivityKind::Key));

        let mut rx = source.attach().unwrap();
        assert!(matches!(source.attach(), Err(HostError::AlreadyAttached)));

        assert!(source.emit(ActivityKind::Key));
        assert_eq!(rx.try_recv().unwrap().kind, ActivityKind::Key);

        source.detach();
        source.detach();
        assert_eq!(source.attach_count(), 1);
        assert_eq!(source.detach_count(), 1);
        assert!(!source.is_attached());
    }

    #[test]
    fn recording_signals_collects() {
        let signals = RecordingSignals::new();
        signals.notify(SessionNotice::expired());
        signals.terminate();

        assert_eq!(signals.notices().len(), 1);
        assert_eq!(signals.terminations(), 1);
    }

    #[tokio::test]
    async fn directory_scopes_listing_to_employee() {
        let directory = MockDirectory::with_snapshot(LeaveSnapshot::new(
            vec![
                LeavePeriod::vacation(1, 1, day("2024-01-01"), day("2024-01-02"), VacationStatus::Planned),
                LeavePeriod::vacation(2, 2, day("2024-01-01"), day("2024-01-02"), VacationStatus::Planned),
            ],
            vec![],
        ));

        let snapshot = directory.list_leave_periods(EmployeeId::new(1)).await.unwrap();
        assert_eq!(snapshot.vacations.len(), 1);
        assert_eq!(snapshot.vacations[0].id, LeaveId::new(1));
    }

    #[tokio::test]
    async fn directory_assigns_fresh_ids() {
        let directory = MockDirectory::with_snapshot(LeaveSnapshot::new(
            vec![LeavePeriod::vacation(5, 1, day("2024-01-01"), day("2024-01-02"), VacationStatus::Planned)],
            vec![],
        ));

        let created = directory
            .create_permission(PermissionPayload {
                employee_id: EmployeeId::new(1),
                start_date: day("2024-02-01"),
                end_date: day("2024-02-01"),
                days: 1,
                hours: 8,
                reason: None,
            })
            .await
            .unwrap();

        assert_eq!(created.id, LeaveId::new(6));
        assert_eq!(directory.created().len(), 1);
    }
}
