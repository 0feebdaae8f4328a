//! File-backed store with atomic writes.
//!
//! Keeps the tables in memory and rewrites a JSON snapshot under
//! `dirs::data_dir()/<namespace>/` after every mutation, using temp file +
//! rename. A mutation is only visible once its snapshot is on disk.
//!
//! One process should own a snapshot file at a time; the in-process mutex
//! is what makes conditional writes atomic.

use crate::clock::{Clock, SystemClock};
use crate::model::{ApprovalStatus, PassId, RequestId, ScanRecord, ScanState, TenantId, VisitorPass};
use crate::store::tables::{Snapshot, Tables};
use crate::store::{CasOutcome, PassStore, ScanLedger, SequenceStore};
use crate::GatepassError;
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

const SNAPSHOT_FILE: &str = "gatepass.json";

/// Snapshot-persisting store.
pub struct FileStore {
    path: PathBuf,
    tables: Mutex<Tables>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore").field("path", &self.path).finish()
    }
}

impl FileStore {
    /// Open the store for a namespace under the platform data directory.
    pub fn with_namespace(namespace: &str) -> Result<Self, GatepassError> {
        let base_dir = dirs::data_dir().ok_or_else(|| {
            GatepassError::StorageUnavailable("Could not find data directory".to_string())
        })?;
        Self::open(base_dir.join(namespace).join(SNAPSHOT_FILE))
    }

    /// Open (or create) the store at an explicit snapshot path.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, GatepassError> {
        Self::open_with_clock(path, Arc::new(SystemClock))
    }

    /// Open with a custom clock for snapshot timestamps.
    pub fn open_with_clock(
        path: impl Into<PathBuf>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, GatepassError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                GatepassError::StorageUnavailable(format!("Failed to create store dir: {}", e))
            })?;
        }

        let tables = if path.exists() {
            Tables::from_snapshot(read_snapshot(&path)?)?
        } else {
            Tables::default()
        };

        Ok(Self {
            path,
            tables: Mutex::new(tables),
            clock,
        })
    }

    /// Location of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> T {
        f(&self.tables.lock())
    }

    /// Apply `f` to a copy of the tables, persist it, then publish it.
    ///
    /// Calls that leave the tables unchanged, such as a conditional write
    /// that lost its guard, do not touch the disk.
    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut Tables) -> Result<T, GatepassError>,
    ) -> Result<T, GatepassError> {
        let mut tables = self.tables.lock();
        let mut next = tables.clone();
        let result = f(&mut next)?;
        if next != *tables {
            self.persist(&next)?;
            *tables = next;
        }
        Ok(result)
    }

    fn persist(&self, tables: &Tables) -> Result<(), GatepassError> {
        let snapshot = tables.to_snapshot(self.clock.now_utc());
        let json = serde_json::to_string_pretty(&snapshot).map_err(|e| {
            GatepassError::StorageUnavailable(format!("Failed to serialize snapshot: {}", e))
        })?;

        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, &json).map_err(|e| {
            GatepassError::StorageUnavailable(format!("Failed to write temp file: {}", e))
        })?;
        fs::rename(&temp_path, &self.path).map_err(|e| {
            GatepassError::StorageUnavailable(format!("Failed to rename snapshot: {}", e))
        })?;

        debug!(
            path = %self.path.display(),
            passes = snapshot.passes.len(),
            scans = snapshot.scans.len(),
            "snapshot persisted"
        );
        Ok(())
    }
}

fn read_snapshot(path: &Path) -> Result<Snapshot, GatepassError> {
    let json = fs::read_to_string(path).map_err(|e| {
        GatepassError::StorageUnavailable(format!("Failed to read snapshot: {}", e))
    })?;
    serde_json::from_str(&json).map_err(|e| {
        GatepassError::StorageUnavailable(format!("Failed to parse snapshot: {}", e))
    })
}

impl SequenceStore for FileStore {
    fn next_value(&self, counter: &str) -> Result<u64, GatepassError> {
        self.mutate(|t| t.next_value(counter))
    }
}

impl PassStore for FileStore {
    fn insert_pass(&self, pass: VisitorPass) -> Result<(), GatepassError> {
        self.mutate(|t| t.insert_pass(pass))
    }

    fn get_pass(&self, tenant: &TenantId, id: RequestId) -> Result<Option<VisitorPass>, GatepassError> {
        Ok(self.read(|t| t.get_pass(tenant, id)))
    }

    fn find_by_pass_id(
        &self,
        tenant: &TenantId,
        pass_id: &PassId,
    ) -> Result<Option<VisitorPass>, GatepassError> {
        Ok(self.read(|t| t.find_by_pass_id(tenant, pass_id)))
    }

    fn conditional_decide(
        &self,
        tenant: &TenantId,
        id: RequestId,
        expected: ApprovalStatus,
        decided: VisitorPass,
    ) -> Result<CasOutcome<VisitorPass>, GatepassError> {
        self.mutate(|t| t.conditional_decide(tenant, id, expected, decided))
    }

    fn list_passes(&self, tenant: &TenantId) -> Result<Vec<VisitorPass>, GatepassError> {
        Ok(self.read(|t| t.list_passes(tenant)))
    }
}

impl ScanLedger for FileStore {
    fn get_scan(&self, tenant: &TenantId, pass_id: &PassId) -> Result<Option<ScanRecord>, GatepassError> {
        Ok(self.read(|t| t.get_scan(tenant, pass_id)))
    }

    fn conditional_update(
        &self,
        tenant: &TenantId,
        pass_id: &PassId,
        expected: ScanState,
        record: ScanRecord,
    ) -> Result<CasOutcome<ScanRecord>, GatepassError> {
        self.mutate(|t| t.conditional_update(tenant, pass_id, expected, record))
    }

    fn list_scans(&self, tenant: &TenantId) -> Result<Vec<ScanRecord>, GatepassError> {
        Ok(self.read(|t| t.list_scans(tenant)))
    }
}
