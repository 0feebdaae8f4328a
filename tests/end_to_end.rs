//! Full visit lifecycle through the public API.

mod common;

use chrono::Duration;
use common::{at, issue, manager, tenant, TestClock};
use gatepass::{
    ApprovalEvent, FileStore, GatepassConfig, GatepassError, InMemoryStore, PassManager,
    PassPayload, ScanOutcome, ScanRequest, ScanResponse, ScanState, ScanStatus,
};
use std::sync::Arc;

#[test]
fn approve_enter_exit_then_completed() {
    let clock = TestClock::at(at(8, 0));
    let manager = manager(Arc::new(InMemoryStore::new()), clock.clone());
    let acme = tenant("acme");

    let issued = issue(&manager, &acme, "Ravi", "09:00", "09:30");
    assert_eq!(issued.payload.pass_id.as_str(), "VIS0000000001");
    let scan = ScanRequest::new(issued.payload.pass_id.clone(), "gate-1");

    clock.set(at(9, 10));
    assert!(matches!(manager.scan(&acme, &scan), Ok(ScanOutcome::EntryRecorded { .. })));

    clock.set(at(9, 20));
    assert!(matches!(manager.scan(&acme, &scan), Ok(ScanOutcome::ExitRecorded { .. })));

    clock.set(at(9, 25));
    assert!(matches!(manager.scan(&acme, &scan), Err(GatepassError::AlreadyCompleted { .. })));

    let views = manager.reports().all_scans(&acme).unwrap();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].record.entry_at, Some(at(9, 10)));
    assert_eq!(views[0].record.exit_at, Some(at(9, 20)));
    assert_eq!(views[0].record.state(), ScanState::Completed);
}

#[test]
fn two_gates_tapping_at_once_record_only_the_entry() {
    let clock = TestClock::at(at(8, 0));
    let manager = manager(Arc::new(InMemoryStore::new()), clock.clone());
    let acme = tenant("acme");
    let pass_id = issue(&manager, &acme, "Ravi", "09:00", "09:30").payload.pass_id;

    clock.set(at(9, 10));
    let first = manager.scan(&acme, &ScanRequest::new(pass_id.clone(), "gate-1"));
    let second = manager.scan(&acme, &ScanRequest::new(pass_id.clone(), "gate-2"));
    assert!(matches!(first, Ok(ScanOutcome::EntryRecorded { .. })));
    assert!(matches!(second, Err(GatepassError::ConcurrentScan { .. })));
    assert_eq!(ScanResponse::from_result(&second).status, ScanStatus::Conflict);

    let record = manager.reports().all_scans(&acme).unwrap().remove(0).record;
    assert_eq!(record.state(), ScanState::Inside);
    assert_eq!(record.entry_actor, "gate-1");
}

#[test]
fn completed_pass_stays_completed_after_its_window() {
    let clock = TestClock::at(at(9, 10));
    let manager = manager(Arc::new(InMemoryStore::new()), clock.clone());
    let acme = tenant("acme");
    let scan = ScanRequest::new(issue(&manager, &acme, "Ravi", "09:00", "09:30").payload.pass_id, "gate-1");

    manager.scan(&acme, &scan).unwrap();
    clock.set(at(9, 20));
    manager.scan(&acme, &scan).unwrap();

    clock.set(at(9, 45));
    assert!(matches!(manager.scan(&acme, &scan), Err(GatepassError::AlreadyCompleted { .. })));
}

#[test]
fn early_visitor_needs_explicit_override() {
    let clock = TestClock::at(at(8, 0));
    let manager = manager(Arc::new(InMemoryStore::new()), clock.clone());
    let acme = tenant("acme");
    let issued = issue(&manager, &acme, "Meera", "09:00", "10:00");
    let scan = ScanRequest::new(issued.payload.pass_id.clone(), "gate-1");

    clock.set(at(8, 59));
    let result = manager.scan(&acme, &scan);
    let response = ScanResponse::from_result(&result);
    assert_eq!(response.status, ScanStatus::EarlyArrival);
    assert_eq!(response.visitor.map(|v| v.name), Some("Meera".to_string()));

    // Rescanning without override changes nothing
    assert!(matches!(manager.scan(&acme, &scan), Ok(ScanOutcome::EarlyArrival(_))));
    assert_eq!(manager.reports().visitors_today(&acme).unwrap(), 0);

    let outcome = manager.scan(&acme, &scan.clone().with_override()).unwrap();
    assert!(matches!(outcome, ScanOutcome::EntryRecorded { early_override: true, .. }));
}

#[test]
fn expired_pass_is_refused_even_with_override() {
    let clock = TestClock::at(at(8, 0));
    let manager = manager(Arc::new(InMemoryStore::new()), clock.clone());
    let acme = tenant("acme");
    let issued = issue(&manager, &acme, "Ravi", "09:00", "10:00");

    clock.set(at(10, 1));
    let scan = ScanRequest::new(issued.payload.pass_id, "gate-1").with_override();
    let response = ScanResponse::from_result(&manager.scan(&acme, &scan));
    assert_eq!(response.status, ScanStatus::ExpiredOrInvalid);
    assert!(!response.retryable);

    clock.advance(Duration::days(1));
    let err = manager.scan(&acme, &scan).unwrap_err();
    assert!(matches!(err, GatepassError::ExpiredOrInvalid { .. }));
}

#[test]
fn payload_round_trips_to_the_gate() {
    let clock = TestClock::at(at(9, 5));
    let manager = manager(Arc::new(InMemoryStore::new()), clock);
    let acme = tenant("acme");
    let issued = issue(&manager, &acme, "Ravi", "09:00", "09:30");

    let scanned = PassPayload::from_json(&issued.payload.to_json().unwrap()).unwrap();
    let outcome = manager.scan(&acme, &ScanRequest::new(scanned.pass_id, "gate-1")).unwrap();
    assert!(matches!(outcome, ScanOutcome::EntryRecorded { .. }));
}

#[test]
fn rejected_request_never_gets_a_pass() {
    let clock = TestClock::at(at(8, 0));
    let manager = manager(Arc::new(InMemoryStore::new()), clock);
    let acme = tenant("acme");

    let pending = manager.submit_request(&acme, common::form("Ravi", "09:00", "09:30")).unwrap();
    manager.reject(&acme, pending.id).unwrap();
    let result = manager.approve(&ApprovalEvent {
        tenant_id: acme.clone(),
        request_id: pending.id,
        visit_date: pending.visit_date,
        window_start: pending.window.start(),
        window_end: pending.window.end(),
    });
    assert!(matches!(result, Err(GatepassError::AlreadyDecided { .. })));

    // The next approval still gets serial 1
    let issued = issue(&manager, &acme, "Meera", "09:00", "09:30");
    assert_eq!(issued.payload.pass_id.as_str(), "VIS0000000001");
}

#[test]
fn file_store_survives_restart_mid_visit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gatepass.json");
    let clock = TestClock::at(at(9, 10));
    let acme = tenant("acme");

    let pass_id = {
        let store = Arc::new(FileStore::open(&path).unwrap());
        let manager = PassManager::with_clock(GatepassConfig::utc(), store, clock.clone()).unwrap();
        let issued = issue(&manager, &acme, "Ravi", "09:00", "09:30");
        manager
            .scan(&acme, &ScanRequest::new(issued.payload.pass_id.clone(), "gate-1"))
            .unwrap();
        issued.payload.pass_id
    };

    let store = Arc::new(FileStore::open(&path).unwrap());
    let manager = PassManager::with_clock(GatepassConfig::utc(), store, clock.clone()).unwrap();
    clock.set(at(9, 20));
    let outcome = manager.scan(&acme, &ScanRequest::new(pass_id, "gate-2")).unwrap();
    assert!(matches!(outcome, ScanOutcome::ExitRecorded { .. }));

    let next = issue(&manager, &acme, "Meera", "09:00", "09:30");
    assert_eq!(next.payload.pass_id.as_str(), "VIS0000000002");
}
