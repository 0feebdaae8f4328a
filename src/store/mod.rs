//! Storage seams.
//!
//! Components receive explicit store handles built once at the composition
//! root. Every query touching passes or scan records takes a mandatory
//! tenant, and every mutation the core depends on for correctness is a
//! conditional write guarded by the previously observed state.

pub mod directory;
pub mod file;
pub mod memory;
pub mod tables;

use crate::model::{ApprovalStatus, PassId, RequestId, ScanRecord, ScanState, TenantId, VisitorPass};
use crate::GatepassError;

pub use directory::{Directory, StaticDirectory};
pub use file::FileStore;
pub use memory::InMemoryStore;

/// Result of a conditional write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CasOutcome<T> {
    /// The guard matched and the write was applied.
    Applied,
    /// The guard did not match; nothing was written.
    Conflict {
        /// What the store holds now.
        current: Option<T>,
    },
}

impl<T> CasOutcome<T> {
    /// Whether the write landed.
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Named monotonic counters.
pub trait SequenceStore: Send + Sync {
    /// Atomically increment `counter` and return the new value.
    ///
    /// The first call for a counter returns 1.
    fn next_value(&self, counter: &str) -> Result<u64, GatepassError>;
}

/// Visit requests and their passes.
pub trait PassStore: Send + Sync {
    /// Store a new request. Its id must be unused.
    fn insert_pass(&self, pass: VisitorPass) -> Result<(), GatepassError>;

    /// Look up a request by id within a tenant.
    fn get_pass(&self, tenant: &TenantId, id: RequestId) -> Result<Option<VisitorPass>, GatepassError>;

    /// Look up an approved pass by its pass id within a tenant.
    fn find_by_pass_id(
        &self,
        tenant: &TenantId,
        pass_id: &PassId,
    ) -> Result<Option<VisitorPass>, GatepassError>;

    /// Replace a request with its decided form if its status is still `expected`.
    fn conditional_decide(
        &self,
        tenant: &TenantId,
        id: RequestId,
        expected: ApprovalStatus,
        decided: VisitorPass,
    ) -> Result<CasOutcome<VisitorPass>, GatepassError>;

    /// All requests of a tenant.
    fn list_passes(&self, tenant: &TenantId) -> Result<Vec<VisitorPass>, GatepassError>;
}

/// The admission ledger.
pub trait ScanLedger: Send + Sync {
    /// Ledger entry for a pass within a tenant.
    fn get_scan(&self, tenant: &TenantId, pass_id: &PassId) -> Result<Option<ScanRecord>, GatepassError>;

    /// Write `record` for `pass_id` only if the entry is still in `expected` state.
    fn conditional_update(
        &self,
        tenant: &TenantId,
        pass_id: &PassId,
        expected: ScanState,
        record: ScanRecord,
    ) -> Result<CasOutcome<ScanRecord>, GatepassError>;

    /// All ledger entries of a tenant.
    fn list_scans(&self, tenant: &TenantId) -> Result<Vec<ScanRecord>, GatepassError>;
}
