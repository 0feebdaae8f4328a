//! Pass Manager - the main public API for Gatepass.
//!
//! The `PassManager` wires one store handle into every component:
//! - Request intake, approval and rejection
//! - Gate scanning with early-arrival override
//! - Tenant-scoped dashboard reports

use crate::clock::{Clock, SystemClock};
use crate::config::GatepassConfig;
use crate::issue::issuer::{IssuedPass, PassIssuer};
use crate::issue::sequence::SequenceAllocator;
use crate::model::{RequestId, TenantId, VisitRequestForm, VisitorPass};
use crate::protocol::models::{ApprovalEvent, ScanRequest};
use crate::report::aggregate::Reports;
use crate::scan::gate::{ScanGate, ScanOutcome};
use crate::store::{Directory, PassStore, ScanLedger, SequenceStore, StaticDirectory};
use crate::GatepassError;
use std::sync::Arc;

/// Main entry point for Gatepass.
///
/// Create one instance per process and share it; all methods take `&self`.
/// Replicas sharing the same backing store stay consistent because every
/// mutation goes through the store's atomic primitives.
pub struct PassManager {
    config: GatepassConfig,
    clock: Arc<dyn Clock>,
    passes: Arc<dyn PassStore>,
    scans: Arc<dyn ScanLedger>,
    issuer: PassIssuer,
    gate: ScanGate,
    reports: Reports,
}

impl PassManager {
    /// Create a manager over `store` using the system clock.
    ///
    /// # Errors
    /// - `ConfigError` - configuration validation fails
    pub fn new<S>(config: GatepassConfig, store: Arc<S>) -> Result<Self, GatepassError>
    where
        S: PassStore + ScanLedger + SequenceStore + 'static,
    {
        Self::with_clock(config, store, Arc::new(SystemClock))
    }

    /// Create a manager with a custom clock.
    ///
    /// # Errors
    /// - `ConfigError` - configuration validation fails
    pub fn with_clock<S>(
        config: GatepassConfig,
        store: Arc<S>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, GatepassError>
    where
        S: PassStore + ScanLedger + SequenceStore + 'static,
    {
        config.validate()?;

        let passes: Arc<dyn PassStore> = store.clone();
        let scans: Arc<dyn ScanLedger> = store.clone();
        let sequence: Arc<dyn SequenceStore> = store;

        let allocator = SequenceAllocator::new(sequence, config.serial_counter);
        let issuer = PassIssuer::new(config.clone(), allocator, passes.clone(), clock.clone());
        let gate = ScanGate::new(passes.clone(), scans.clone(), clock.clone(), config.utc_offset);
        let reports = Reports::new(
            passes.clone(),
            scans.clone(),
            Arc::new(StaticDirectory::new()),
            clock.clone(),
            config.clone(),
        );

        Ok(Self {
            config,
            clock,
            passes,
            scans,
            issuer,
            gate,
            reports,
        })
    }

    /// Use `directory` to decorate report rows with department and staff names.
    pub fn with_directory(mut self, directory: Arc<dyn Directory>) -> Self {
        self.reports = Reports::new(
            self.passes.clone(),
            self.scans.clone(),
            directory,
            self.clock.clone(),
            self.config.clone(),
        );
        self
    }

    /// Record a new pending visit request.
    ///
    /// # Errors
    /// - `ValidationError` - a required field is blank or the email is malformed
    /// - `StorageUnavailable` - the store could not be reached
    pub fn submit_request(&self, tenant: &TenantId, form: VisitRequestForm) -> Result<VisitorPass, GatepassError> {
        self.issuer.submit(tenant, form)
    }

    /// Approve a request, allocating its pass id.
    ///
    /// # Errors
    /// See [`PassIssuer::issue`].
    pub fn approve(&self, event: &ApprovalEvent) -> Result<IssuedPass, GatepassError> {
        self.issuer.issue(event)
    }

    /// Reject a pending request.
    ///
    /// # Errors
    /// See [`PassIssuer::reject`].
    pub fn reject(&self, tenant: &TenantId, request_id: RequestId) -> Result<VisitorPass, GatepassError> {
        self.issuer.reject(tenant, request_id)
    }

    /// Fetch one request of `tenant` by id, whatever its status.
    ///
    /// # Errors
    /// - `NotFound` - no such request for this tenant
    /// - `StorageUnavailable` - the store could not be reached
    pub fn request(&self, tenant: &TenantId, id: RequestId) -> Result<VisitorPass, GatepassError> {
        self.passes
            .get_pass(tenant, id)?
            .ok_or_else(|| GatepassError::NotFound(format!("request {}", id)))
    }

    /// Process one gate scan for `tenant`.
    ///
    /// # Errors
    /// See [`ScanGate::scan`].
    pub fn scan(&self, tenant: &TenantId, request: &ScanRequest) -> Result<ScanOutcome, GatepassError> {
        self.gate.scan(tenant, request)
    }

    /// Dashboard queries.
    pub fn reports(&self) -> &Reports {
        &self.reports
    }

    /// The active configuration.
    pub fn config(&self) -> &GatepassConfig {
        &self.config
    }
}
