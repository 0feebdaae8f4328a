//! Shared fixtures for integration tests.

#![allow(dead_code)]

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use gatepass::{
    ApprovalEvent, Clock, GatepassConfig, InMemoryStore, IssuedPass, PassManager, TenantId,
    ValidityWindow, VisitRequestForm, VisitorContact,
};
use parking_lot::Mutex;
use std::sync::Arc;

/// Settable clock; the library's own mock is only built with `test-seams`.
pub struct TestClock {
    now: Mutex<DateTime<Utc>>,
}

impl TestClock {
    pub fn at(now: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(now),
        })
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock() = to;
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Clock for TestClock {
    fn now_utc(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

pub fn visit_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
}

/// `hh:mm` UTC on the visit day.
pub fn at(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, h, m, 0).unwrap()
}

pub fn tenant(id: &str) -> TenantId {
    TenantId::new(id).unwrap()
}

pub fn form(name: &str, start: &str, end: &str) -> VisitRequestForm {
    VisitRequestForm {
        visitor: VisitorContact {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: "555-0199".to_string(),
            photo_url: None,
        },
        reason: "Site visit".to_string(),
        department: None,
        person_to_meet: None,
        visit_date: visit_day(),
        window: ValidityWindow::parse(start, end).unwrap(),
    }
}

pub fn manager(store: Arc<InMemoryStore>, clock: Arc<TestClock>) -> PassManager {
    PassManager::with_clock(GatepassConfig::utc(), store, clock).unwrap()
}

/// Submit and approve a request with the given window.
pub fn issue(manager: &PassManager, tenant: &TenantId, name: &str, start: &str, end: &str) -> IssuedPass {
    let pending = manager.submit_request(tenant, form(name, start, end)).unwrap();
    manager
        .approve(&ApprovalEvent {
            tenant_id: tenant.clone(),
            request_id: pending.id,
            visit_date: pending.visit_date,
            window_start: pending.window.start(),
            window_end: pending.window.end(),
        })
        .unwrap()
}
