//! Table logic shared by the in-memory and file-backed stores.
//!
//! Callers hold the store's lock for the duration of each call, which is
//! what makes the conditional writes here atomic.

use crate::model::{
    scan_state, ApprovalStatus, PassId, RequestId, ScanRecord, ScanState, TenantId, VisitorPass,
};
use crate::store::CasOutcome;
use crate::GatepassError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Counters, requests, and scan records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tables {
    counters: BTreeMap<String, u64>,
    passes: HashMap<RequestId, VisitorPass>,
    by_pass_id: HashMap<PassId, RequestId>,
    scans: HashMap<PassId, ScanRecord>,
}

/// Serialized form of [`Tables`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Format version.
    pub version: u32,
    /// When the snapshot was written.
    pub saved_at: DateTime<Utc>,
    /// Counter values by name.
    pub counters: BTreeMap<String, u64>,
    /// Every request.
    pub passes: Vec<VisitorPass>,
    /// Every ledger entry.
    pub scans: Vec<ScanRecord>,
}

impl Tables {
    /// Rebuild tables from a snapshot, re-deriving the pass id index.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, GatepassError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(GatepassError::StorageUnavailable(format!(
                "unsupported snapshot version {}",
                snapshot.version
            )));
        }

        let mut tables = Self {
            counters: snapshot.counters,
            ..Self::default()
        };
        for pass in snapshot.passes {
            tables.insert_pass(pass)?;
        }
        for scan in snapshot.scans {
            tables.scans.insert(scan.pass_id.clone(), scan);
        }
        Ok(tables)
    }

    /// Capture the tables for persistence.
    pub fn to_snapshot(&self, saved_at: DateTime<Utc>) -> Snapshot {
        let mut passes: Vec<VisitorPass> = self.passes.values().cloned().collect();
        passes.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at).then(a.id.cmp(&b.id)));
        let mut scans: Vec<ScanRecord> = self.scans.values().cloned().collect();
        scans.sort_by(|a, b| a.pass_id.cmp(&b.pass_id));

        Snapshot {
            version: SNAPSHOT_VERSION,
            saved_at,
            counters: self.counters.clone(),
            passes,
            scans,
        }
    }

    /// Increment and read a counter.
    pub fn next_value(&mut self, counter: &str) -> Result<u64, GatepassError> {
        let value = self.counters.entry(counter.to_string()).or_insert(0);
        *value = value.checked_add(1).ok_or_else(|| {
            GatepassError::StorageUnavailable(format!("counter {} overflowed", counter))
        })?;
        Ok(*value)
    }

    /// Insert a new request.
    pub fn insert_pass(&mut self, pass: VisitorPass) -> Result<(), GatepassError> {
        if self.passes.contains_key(&pass.id) {
            return Err(GatepassError::ValidationError(format!(
                "request {} already exists",
                pass.id
            )));
        }
        if let Some(pass_id) = &pass.pass_id {
            if self.by_pass_id.contains_key(pass_id) {
                return Err(GatepassError::ValidationError(format!(
                    "pass id {} already assigned",
                    pass_id
                )));
            }
            self.by_pass_id.insert(pass_id.clone(), pass.id);
        }
        self.passes.insert(pass.id, pass);
        Ok(())
    }

    /// Tenant-scoped request lookup.
    pub fn get_pass(&self, tenant: &TenantId, id: RequestId) -> Option<VisitorPass> {
        self.passes
            .get(&id)
            .filter(|pass| &pass.tenant == tenant)
            .cloned()
    }

    /// Tenant-scoped pass id lookup.
    pub fn find_by_pass_id(&self, tenant: &TenantId, pass_id: &PassId) -> Option<VisitorPass> {
        self.by_pass_id
            .get(pass_id)
            .and_then(|id| self.get_pass(tenant, *id))
    }

    /// Compare-and-swap on a request's status.
    pub fn conditional_decide(
        &mut self,
        tenant: &TenantId,
        id: RequestId,
        expected: ApprovalStatus,
        decided: VisitorPass,
    ) -> Result<CasOutcome<VisitorPass>, GatepassError> {
        if decided.id != id || &decided.tenant != tenant {
            return Err(GatepassError::ValidationError(
                "decided request does not match its key".to_string(),
            ));
        }

        let current = match self.get_pass(tenant, id) {
            Some(current) => current,
            None => return Err(GatepassError::NotFound(format!("request {}", id))),
        };
        if current.status != expected {
            return Ok(CasOutcome::Conflict {
                current: Some(current),
            });
        }

        if let Some(pass_id) = &decided.pass_id {
            if self.by_pass_id.get(pass_id).is_some_and(|owner| *owner != id) {
                return Err(GatepassError::ValidationError(format!(
                    "pass id {} already assigned",
                    pass_id
                )));
            }
            self.by_pass_id.insert(pass_id.clone(), id);
        }
        self.passes.insert(id, decided);
        Ok(CasOutcome::Applied)
    }

    /// All requests of a tenant.
    pub fn list_passes(&self, tenant: &TenantId) -> Vec<VisitorPass> {
        self.passes
            .values()
            .filter(|pass| &pass.tenant == tenant)
            .cloned()
            .collect()
    }

    /// Tenant-scoped ledger lookup.
    pub fn get_scan(&self, tenant: &TenantId, pass_id: &PassId) -> Option<ScanRecord> {
        self.scans
            .get(pass_id)
            .filter(|scan| &scan.tenant == tenant)
            .cloned()
    }

    /// Compare-and-swap on a ledger entry's admission state.
    ///
    /// Only forward transitions are accepted: `NoRecord -> Inside` and
    /// `Inside -> Completed`.
    pub fn conditional_update(
        &mut self,
        tenant: &TenantId,
        pass_id: &PassId,
        expected: ScanState,
        record: ScanRecord,
    ) -> Result<CasOutcome<ScanRecord>, GatepassError> {
        if &record.pass_id != pass_id || &record.tenant != tenant {
            return Err(GatepassError::ValidationError(
                "scan record does not match its key".to_string(),
            ));
        }
        let successor = match expected {
            ScanState::NoRecord => ScanState::Inside,
            ScanState::Inside => ScanState::Completed,
            ScanState::Completed => {
                return Err(GatepassError::ValidationError(format!(
                    "scan record for {} is completed and frozen",
                    pass_id
                )))
            }
        };
        if record.state() != successor {
            return Err(GatepassError::ValidationError(format!(
                "cannot move {} from {} to {}",
                pass_id,
                expected,
                record.state()
            )));
        }

        let existing = self.scans.get(pass_id);
        if existing.is_some_and(|scan| &scan.tenant != tenant) {
            return Err(GatepassError::NotFound(format!("pass {}", pass_id)));
        }
        if scan_state(existing) != expected {
            return Ok(CasOutcome::Conflict {
                current: existing.cloned(),
            });
        }

        self.scans.insert(pass_id.clone(), record);
        Ok(CasOutcome::Applied)
    }

    /// All ledger entries of a tenant.
    pub fn list_scans(&self, tenant: &TenantId) -> Vec<ScanRecord> {
        self.scans
            .values()
            .filter(|scan| &scan.tenant == tenant)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{VisitRequestForm, VisitorContact};
    use crate::policy::time::ValidityWindow;
    use chrono::{NaiveDate, TimeZone};

    fn tenant(id: &str) -> TenantId {
        TenantId::new(id).unwrap()
    }

    fn pending(tenant_id: &str) -> VisitorPass {
        let form = VisitRequestForm {
            visitor: VisitorContact {
                name: "Lee".to_string(),
                email: "lee@example.com".to_string(),
                phone: "555".to_string(),
                photo_url: None,
            },
            reason: "Delivery".to_string(),
            department: None,
            person_to_meet: None,
            visit_date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            window: ValidityWindow::parse("09:00", "10:00").unwrap(),
        };
        VisitorPass::pending(tenant(tenant_id), form, Utc.with_ymd_and_hms(2025, 3, 13, 8, 0, 0).unwrap())
    }

    fn approved(mut pass: VisitorPass, serial: u64) -> VisitorPass {
        pass.status = ApprovalStatus::Approved;
        pass.pass_id = Some(PassId::from_serial("VIS", serial, 10).unwrap());
        pass
    }

    #[test]
    fn counters_start_at_one_and_are_independent() {
        let mut tables = Tables::default();
        assert_eq!(tables.next_value("a").unwrap(), 1);
        assert_eq!(tables.next_value("a").unwrap(), 2);
        assert_eq!(tables.next_value("b").unwrap(), 1);
    }

    #[test]
    fn lookups_are_tenant_scoped() {
        let mut tables = Tables::default();
        let pass = approved(pending("acme"), 1);
        let id = pass.id;
        let pass_id = pass.pass_id.clone().unwrap();
        tables.insert_pass(pass).unwrap();

        assert!(tables.get_pass(&tenant("acme"), id).is_some());
        assert!(tables.get_pass(&tenant("globex"), id).is_none());
        assert!(tables.find_by_pass_id(&tenant("acme"), &pass_id).is_some());
        assert!(tables.find_by_pass_id(&tenant("globex"), &pass_id).is_none());
        assert_eq!(tables.list_passes(&tenant("globex")).len(), 0);
    }

    #[test]
    fn decide_applies_once() {
        let mut tables = Tables::default();
        let pass = pending("acme");
        let id = pass.id;
        tables.insert_pass(pass.clone()).unwrap();

        let first = tables
            .conditional_decide(&tenant("acme"), id, ApprovalStatus::Pending, approved(pass.clone(), 1))
            .unwrap();
        assert!(first.is_applied());

        let second = tables
            .conditional_decide(&tenant("acme"), id, ApprovalStatus::Pending, approved(pass, 2))
            .unwrap();
        match second {
            CasOutcome::Conflict { current: Some(current) } => {
                assert_eq!(current.pass_id.unwrap().as_str(), "VIS0000000001");
            }
            other => panic!("expected conflict, got {:?}", other),
        }
        let second_id = PassId::from_serial("VIS", 2, 10).unwrap();
        assert!(tables.find_by_pass_id(&tenant("acme"), &second_id).is_none());
    }

    #[test]
    fn decide_unknown_request_is_not_found() {
        let mut tables = Tables::default();
        let pass = pending("acme");
        let result = tables.conditional_decide(&tenant("acme"), pass.id, ApprovalStatus::Pending, pass);
        assert!(matches!(result, Err(GatepassError::NotFound(_))));
    }

    #[test]
    fn scan_updates_only_move_forward() {
        let mut tables = Tables::default();
        let pass = approved(pending("acme"), 1);
        let pass_id = pass.pass_id.clone().unwrap();
        let at = Utc.with_ymd_and_hms(2025, 3, 14, 9, 10, 0).unwrap();
        let entered = ScanRecord::entered(&pass, pass_id.clone(), "g1", at, false);

        // Guard mismatch: nothing exists yet, caller thinks the visitor is inside.
        let exited = entered.exited("g1", at);
        let result = tables
            .conditional_update(&tenant("acme"), &pass_id, ScanState::Inside, exited.clone())
            .unwrap();
        assert_eq!(result, CasOutcome::Conflict { current: None });

        let result = tables
            .conditional_update(&tenant("acme"), &pass_id, ScanState::NoRecord, entered.clone())
            .unwrap();
        assert!(result.is_applied());

        // A second entry loses.
        let result = tables
            .conditional_update(&tenant("acme"), &pass_id, ScanState::NoRecord, entered)
            .unwrap();
        assert!(!result.is_applied());

        assert!(tables
            .conditional_update(&tenant("acme"), &pass_id, ScanState::Inside, exited.clone())
            .unwrap()
            .is_applied());
        assert!(matches!(
            tables.conditional_update(&tenant("acme"), &pass_id, ScanState::Completed, exited),
            Err(GatepassError::ValidationError(_))
        ));
    }

    #[test]
    fn snapshot_rebuilds_index() {
        let mut tables = Tables::default();
        let pass = approved(pending("acme"), 3);
        let pass_id = pass.pass_id.clone().unwrap();
        tables.insert_pass(pass).unwrap();
        tables.next_value("pass_serial").unwrap();

        let snapshot = tables.to_snapshot(Utc.with_ymd_and_hms(2025, 3, 14, 0, 0, 0).unwrap());
        let mut restored = Tables::from_snapshot(snapshot).unwrap();
        assert!(restored.find_by_pass_id(&tenant("acme"), &pass_id).is_some());
        assert_eq!(restored.next_value("pass_serial").unwrap(), 2);
    }

    #[test]
    fn snapshot_with_unknown_version_is_refused() {
        let mut snapshot = Tables::default().to_snapshot(Utc.with_ymd_and_hms(2025, 3, 14, 0, 0, 0).unwrap());
        snapshot.version = 99;
        assert!(matches!(
            Tables::from_snapshot(snapshot),
            Err(GatepassError::StorageUnavailable(_))
        ));
    }
}
