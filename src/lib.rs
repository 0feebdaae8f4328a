//! # Gatepass
//!
//! **Visitor pass issuance and gate admission for multi-tenant sites.**
//!
//! Gatepass turns approved visit requests into scannable pass ids and runs
//! the gate-side admission state machine: one entry, one exit, then the
//! pass is spent.
//!
//! ## Features
//!
//! - **Unique serials** - pass ids come from an atomic store counter, never from local state
//! - **Typed validity windows** - minute-resolution time-of-day values, no string comparison
//! - **Early-arrival override** - visitors before their window need an explicit staff decision
//! - **Race-safe scanning** - each scan is one conditional update keyed by pass id
//! - **Tenant isolation** - every store query requires a tenant id
//!
//! ## Quickstart
//!
//! ```no_run
//! use gatepass::{
//!     ApprovalEvent, GatepassConfig, InMemoryStore, PassManager, ScanOutcome, ScanRequest,
//!     TenantId, ValidityWindow, VisitRequestForm, VisitorContact,
//! };
//! use chrono::NaiveDate;
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), gatepass::GatepassError> {
//!     let manager = PassManager::new(GatepassConfig::default(), Arc::new(InMemoryStore::new()))?;
//!     let tenant = TenantId::new("acme")?;
//!
//!     let window = ValidityWindow::parse("09:00", "09:30")?;
//!     let visit_date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap_or_default();
//!     let request = manager.submit_request(
//!         &tenant,
//!         VisitRequestForm {
//!             visitor: VisitorContact {
//!                 name: "Asha Rao".into(),
//!                 email: "asha@example.com".into(),
//!                 phone: "9876543210".into(),
//!                 photo_url: None,
//!             },
//!             reason: "Interview".into(),
//!             department: None,
//!             person_to_meet: None,
//!             visit_date,
//!             window,
//!         },
//!     )?;
//!
//!     let issued = manager.approve(&ApprovalEvent {
//!         tenant_id: tenant.clone(),
//!         request_id: request.id,
//!         visit_date,
//!         window_start: window.start(),
//!         window_end: window.end(),
//!     })?;
//!     println!("render this: {}", issued.payload.to_json()?);
//!
//!     match manager.scan(&tenant, &ScanRequest::new(issued.payload.pass_id, "gate-1"))? {
//!         ScanOutcome::EarlyArrival(visitor) => println!("{} is early", visitor.name),
//!         outcome => println!("{:?}", outcome),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Time
//!
//! Windows and "today" are evaluated on the calendar of
//! [`GatepassConfig::utc_offset`], which defaults to the server's local
//! offset. Both window bounds are inclusive at minute resolution.
//!
//! See [`GatepassConfig`] for full documentation.

#![warn(missing_docs)]

// Core modules
pub mod clock;
pub mod config;
pub mod errors;
pub mod model;

// Policy layer
pub mod policy;

// Protocol layer
pub mod protocol;

// Storage layer
pub mod store;

// Issuance
pub mod issue;

// Admission
pub mod scan;

// Reporting
pub mod report;

// Manager (main public API)
pub mod manager;

// Re-exports for public API
pub use clock::{Clock, SystemClock};
pub use config::GatepassConfig;
pub use errors::{ErrorKind, GatepassError};
pub use issue::issuer::IssuedPass;
pub use manager::PassManager;
pub use model::{
    ApprovalStatus, PassId, RequestId, ScanRecord, ScanState, TenantId, VisitRequestForm,
    VisitorContact, VisitorPass,
};
pub use policy::time::{TimeOfDay, ValidityWindow};
pub use policy::window::WindowVerdict;
pub use protocol::models::{ApprovalEvent, PassPayload, ScanRequest, ScanResponse, ScanStatus};
pub use report::aggregate::{Reports, ScanView};
pub use scan::gate::{EarlyArrival, ScanOutcome};
pub use store::{Directory, FileStore, InMemoryStore, StaticDirectory};

#[cfg(any(test, feature = "test-seams"))]
pub use clock::MockClock;
