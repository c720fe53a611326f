//! Integration tests for staffdesk
//!
//! These tests drive the engines end to end through the store and the
//! host interfaces, the way the command line wires them.

use chrono::{DateTime, Local, NaiveDate, TimeZone};
use staffdesk_api::{
    LeaveKind, LeavePeriod, LeaveSnapshot, NoticeKind, PermissionStatus, SessionEndReason,
    SessionState, VacationStatus,
};
use staffdesk_config::{parse_config, LeaveSettings, SessionTimings};
use staffdesk_core::{
    evaluate, BlockReason, FormStatus, LeaveCandidate, LeaveRequestForm, SessionEvent,
    SessionMonitor, SubmitDecision,
};
use staffdesk_host_api::{
    CreateRequest, LeaveDirectory, MockDirectory, RecordingSignals, SessionSignals,
};
use staffdesk_store::{AuditEventType, SqliteStore, Store};
use staffdesk_util::{EmployeeId, SessionKey};
use std::sync::Arc;
use std::time::Duration;

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn t0() -> DateTime<Local> {
    Local.with_ymd_and_hms(2024, 3, 11, 8, 30, 0).unwrap()
}

fn at_minutes(m: i64) -> DateTime<Local> {
    t0() + chrono::Duration::minutes(m)
}

/// Forward monitor events to signals the way the runtime does, firing
/// the deferred logout immediately
fn dispatch(monitor: &mut SessionMonitor, events: Vec<SessionEvent>, signals: &RecordingSignals) {
    for event in events {
        match event {
            SessionEvent::Notify(notice) => signals.notify(notice),
            SessionEvent::ExpireDue { .. } => {
                if monitor.end(SessionEndReason::Expired) {
                    signals.terminate();
                }
            }
        }
    }
}

#[test]
fn test_idle_session_warns_then_logs_out() {
    let store: Arc<dyn Store> = Arc::new(SqliteStore::in_memory().unwrap());
    let signals = RecordingSignals::new();
    let key = SessionKey::new("hr-admin");

    let mut monitor = SessionMonitor::login(key.clone(), SessionTimings::default(), store.clone(), t0());

    // Poll every 30s for 16 minutes with no activity
    for step in 1..=32 {
        let now = t0() + chrono::Duration::seconds(30 * step);
        let events = monitor.tick(now);
        dispatch(&mut monitor, events, &signals);
    }

    let notices = signals.notices();
    assert_eq!(notices.len(), 2);
    assert_eq!(notices[0].kind, NoticeKind::Warning);
    assert!(notices[0].message.contains("2 minutes"));
    assert_eq!(notices[1].kind, NoticeKind::Expired);
    assert_eq!(signals.terminations(), 1);
    assert_eq!(monitor.state(), SessionState::Expired);

    // Nothing left to restore after expiry
    assert!(SessionMonitor::restore(key, SessionTimings::default(), store.clone(), at_minutes(17)).is_none());

    let audits = store.get_recent_audits(10).unwrap();
    assert!(audits.iter().any(|a| matches!(
        a.event,
        AuditEventType::SessionEnded { reason: SessionEndReason::Expired, .. }
    )));
    assert!(audits.iter().any(|a| matches!(a.event, AuditEventType::SessionWarning { .. })));
}

#[test]
fn test_session_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("staffdesk.db");
    let key = SessionKey::new("hr-admin");

    {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::open(&db_path).unwrap());
        let mut monitor = SessionMonitor::login(key.clone(), SessionTimings::default(), store, t0());
        monitor.on_activity(at_minutes(4));
    }

    let store: Arc<dyn Store> = Arc::new(SqliteStore::open(&db_path).unwrap());
    let mut monitor =
        SessionMonitor::restore(key.clone(), SessionTimings::default(), store.clone(), at_minutes(16))
            .expect("session should resume within the timeout");

    assert_eq!(monitor.last_activity_at(), at_minutes(4));

    // 12 minutes idle: still active
    assert!(monitor.tick(at_minutes(16)).is_empty());
    assert_eq!(monitor.state(), SessionState::Active);

    // 13 minutes idle: warning
    let events = monitor.tick(at_minutes(17));
    assert!(matches!(&events[..], [SessionEvent::Notify(n)] if n.kind == NoticeKind::Warning));

    // Explicit logout clears the persisted mirror
    assert!(monitor.end(SessionEndReason::Logout));
    assert!(SessionMonitor::restore(key, SessionTimings::default(), store, at_minutes(18)).is_none());
}

#[test]
fn test_restore_after_long_absence_requires_login() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("staffdesk.db");
    let key = SessionKey::new("hr-admin");

    {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::open(&db_path).unwrap());
        SessionMonitor::login(key.clone(), SessionTimings::default(), store, t0());
    }

    let store: Arc<dyn Store> = Arc::new(SqliteStore::open(&db_path).unwrap());
    assert!(SessionMonitor::restore(key.clone(), SessionTimings::default(), store.clone(), at_minutes(60)).is_none());

    let audits = store.get_recent_audits(1).unwrap();
    assert!(matches!(audits[0].event, AuditEventType::StaleSessionCleared { .. }));
}

#[test]
fn test_configured_timings_drive_monitor() {
    let policy = parse_config(
        r#"
        config_version = 1

        [session]
        timeout_ms = 300000
        warning_window_ms = 60000
        "#,
    )
    .unwrap();

    let store: Arc<dyn Store> = Arc::new(SqliteStore::in_memory().unwrap());
    let mut monitor = SessionMonitor::login("kiosk".into(), policy.session, store, t0());

    assert!(monitor.tick(at_minutes(3)).is_empty());
    assert_eq!(monitor.tick(at_minutes(4)).len(), 1);
    assert_eq!(monitor.state(), SessionState::Warning);
    assert_eq!(monitor.time_remaining(at_minutes(4)), Duration::from_secs(60));
}

#[tokio::test]
async fn test_permission_conflict_blocks_vacation() {
    let directory = MockDirectory::with_snapshot(LeaveSnapshot::new(
        vec![],
        vec![LeavePeriod::permission(
            11,
            1,
            day("2024-03-10"),
            day("2024-03-10"),
            PermissionStatus::Approved,
        )],
    ));

    let mut form = LeaveRequestForm::new(EmployeeId::new(1), LeaveKind::Vacation, LeaveSettings::default());
    form.refresh(&directory).await;
    form.set_start_date(Some(day("2024-03-09")));
    let status = form.set_end_date(Some(day("2024-03-11")));
    assert!(matches!(status, FormStatus::Conflict { day_count: 3, .. }));

    let decision = form.submit(&directory).await.unwrap();
    match decision {
        SubmitDecision::Blocked { reasons } => {
            assert_eq!(reasons.len(), 1);
            match &reasons[0] {
                BlockReason::Conflict { period, message } => {
                    assert_eq!(period.kind(), LeaveKind::Permission);
                    assert!(message.contains("overlaps an active permission"));
                }
                other => panic!("unexpected reason: {:?}", other),
            }
        }
        other => panic!("expected block, got {:?}", other),
    }

    assert!(directory.created().is_empty());
}

#[tokio::test]
async fn test_clear_vacation_is_created_with_day_count() {
    let directory = MockDirectory::new();

    let mut form = LeaveRequestForm::new(EmployeeId::new(1), LeaveKind::Vacation, LeaveSettings::default());
    form.refresh(&directory).await;
    form.set_start_date(Some(day("2024-06-01")));
    let status = form.set_end_date(Some(day("2024-06-05")));
    assert_eq!(status, &FormStatus::Ready { day_count: 5 });

    let decision = form.submit(&directory).await.unwrap();
    assert!(matches!(decision, SubmitDecision::Submitted(ref created) if created.day_count == 5));

    match &directory.created()[..] {
        [CreateRequest::Vacation(payload)] => {
            assert_eq!(payload.days_granted, 5);
            assert_eq!(payload.days_taken, 5);
            assert_eq!(payload.start_date, day("2024-06-01"));
            assert_eq!(payload.end_date, day("2024-06-05"));
        }
        other => panic!("unexpected requests: {:?}", other),
    }
}

#[tokio::test]
async fn test_submitted_vacation_blocks_next_request() {
    let directory = MockDirectory::new();
    let employee = EmployeeId::new(3);

    let mut form = LeaveRequestForm::new(employee, LeaveKind::Vacation, LeaveSettings::default());
    form.refresh(&directory).await;
    form.set_start_date(Some(day("2024-08-01")));
    form.set_end_date(Some(day("2024-08-10")));
    assert!(matches!(form.submit(&directory).await.unwrap(), SubmitDecision::Submitted(_)));

    // Touching the new vacation on its last day still conflicts
    let mut next = LeaveRequestForm::new(employee, LeaveKind::Permission, LeaveSettings::default());
    next.refresh(&directory).await;
    next.set_start_date(Some(day("2024-08-10")));
    let status = next.set_end_date(Some(day("2024-08-10")));
    assert!(matches!(status, FormStatus::Conflict { .. }));

    // Another employee is unaffected by the same records
    let snapshot = directory.list_leave_periods(employee).await.unwrap();
    assert_eq!(snapshot.vacations.len(), 1);
    let evaluation = evaluate(
        &LeaveCandidate::new(4, day("2024-08-05"), day("2024-08-06")),
        &snapshot,
    );
    assert!(evaluation.is_clear());
}

#[tokio::test]
async fn test_canceled_vacation_does_not_block() {
    let directory = MockDirectory::with_snapshot(LeaveSnapshot::new(
        vec![LeavePeriod::vacation(
            1,
            1,
            day("2024-03-09"),
            day("2024-03-11"),
            VacationStatus::Canceled,
        )],
        vec![],
    ));

    let mut form = LeaveRequestForm::new(EmployeeId::new(1), LeaveKind::Vacation, LeaveSettings::default());
    form.refresh(&directory).await;
    form.set_start_date(Some(day("2024-03-10")));
    form.set_end_date(Some(day("2024-03-10")));

    assert!(matches!(
        form.submit(&directory).await.unwrap(),
        SubmitDecision::Submitted(ref created) if created.day_count == 1
    ));
}
