//! In-process store.
//!
//! Suitable for tests and single-node deployments. Availability can be
//! switched off to exercise `StorageUnavailable` handling.

use crate::model::{ApprovalStatus, PassId, RequestId, ScanRecord, ScanState, TenantId, VisitorPass};
use crate::store::tables::Tables;
use crate::store::{CasOutcome, PassStore, ScanLedger, SequenceStore};
use crate::GatepassError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Mutex-guarded tables held in memory.
#[derive(Debug)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    available: AtomicBool,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate an outage (`false`) or recovery (`true`).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn with_tables<T>(
        &self,
        f: impl FnOnce(&mut Tables) -> Result<T, GatepassError>,
    ) -> Result<T, GatepassError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(GatepassError::StorageUnavailable(
                "in-memory store is offline".to_string(),
            ));
        }
        let mut tables = self.tables.lock();
        f(&mut tables)
    }
}

impl SequenceStore for InMemoryStore {
    fn next_value(&self, counter: &str) -> Result<u64, GatepassError> {
        self.with_tables(|t| t.next_value(counter))
    }
}

impl PassStore for InMemoryStore {
    fn insert_pass(&self, pass: VisitorPass) -> Result<(), GatepassError> {
        self.with_tables(|t| t.insert_pass(pass))
    }

    fn get_pass(&self, tenant: &TenantId, id: RequestId) -> Result<Option<VisitorPass>, GatepassError> {
        self.with_tables(|t| Ok(t.get_pass(tenant, id)))
    }

    fn find_by_pass_id(
        &self,
        tenant: &TenantId,
        pass_id: &PassId,
    ) -> Result<Option<VisitorPass>, GatepassError> {
        self.with_tables(|t| Ok(t.find_by_pass_id(tenant, pass_id)))
    }

    fn conditional_decide(
        &self,
        tenant: &TenantId,
        id: RequestId,
        expected: ApprovalStatus,
        decided: VisitorPass,
    ) -> Result<CasOutcome<VisitorPass>, GatepassError> {
        self.with_tables(|t| t.conditional_decide(tenant, id, expected, decided))
    }

    fn list_passes(&self, tenant: &TenantId) -> Result<Vec<VisitorPass>, GatepassError> {
        self.with_tables(|t| Ok(t.list_passes(tenant)))
    }
}

impl ScanLedger for InMemoryStore {
    fn get_scan(&self, tenant: &TenantId, pass_id: &PassId) -> Result<Option<ScanRecord>, GatepassError> {
        self.with_tables(|t| Ok(t.get_scan(tenant, pass_id)))
    }

    fn conditional_update(
        &self,
        tenant: &TenantId,
        pass_id: &PassId,
        expected: ScanState,
        record: ScanRecord,
    ) -> Result<CasOutcome<ScanRecord>, GatepassError> {
        self.with_tables(|t| t.conditional_update(tenant, pass_id, expected, record))
    }

    fn list_scans(&self, tenant: &TenantId) -> Result<Vec<ScanRecord>, GatepassError> {
        self.with_tables(|t| Ok(t.list_scans(tenant)))
    }
}
