//! Request intake and pass issuance.
//!
//! A request is decided exactly once. Approval allocates one serial and
//! attaches the resulting pass id through a conditional write on the
//! request's `Pending` status, so repeated or concurrent approvals can never
//! attach a second pass id.

use crate::clock::Clock;
use crate::config::GatepassConfig;
use crate::issue::sequence::SequenceAllocator;
use crate::model::{ApprovalStatus, PassId, RequestId, TenantId, VisitRequestForm, VisitorPass};
use crate::protocol::models::{ApprovalEvent, PassPayload};
use crate::store::{CasOutcome, PassStore};
use crate::GatepassError;
use std::sync::Arc;
use tracing::{info, warn};

/// An approved pass and the payload to render into its scannable code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedPass {
    /// The approved request.
    pub pass: VisitorPass,
    /// Payload for the rendering collaborator.
    pub payload: PassPayload,
}

/// Turns approval events into passes.
pub struct PassIssuer {
    config: GatepassConfig,
    allocator: SequenceAllocator,
    passes: Arc<dyn PassStore>,
    clock: Arc<dyn Clock>,
}

impl PassIssuer {
    /// Create an issuer.
    pub fn new(
        config: GatepassConfig,
        allocator: SequenceAllocator,
        passes: Arc<dyn PassStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            allocator,
            passes,
            clock,
        }
    }

    /// Record a new pending visit request.
    ///
    /// # Errors
    /// - `ValidationError` - a required field is blank or the email is malformed
    /// - `StorageUnavailable` - the store could not be reached
    pub fn submit(&self, tenant: &TenantId, form: VisitRequestForm) -> Result<VisitorPass, GatepassError> {
        let form = form.normalize()?;
        let pass = VisitorPass::pending(tenant.clone(), form, self.clock.now_utc());
        self.passes.insert_pass(pass.clone())?;
        info!(tenant = %tenant, request = %pass.id, visit_date = %pass.visit_date, "visit request submitted");
        Ok(pass)
    }

    /// Approve a request and issue its pass.
    ///
    /// Allocates exactly one serial per successful call.
    ///
    /// # Errors
    /// - `ValidationError` - window start is not before window end
    /// - `NotFound` - no such request for this tenant
    /// - `AlreadyDecided` - the request was already approved or rejected
    /// - `SerialExhausted` - the serial no longer fits the configured width
    /// - `StorageUnavailable` - the store could not be reached
    pub fn issue(&self, event: &ApprovalEvent) -> Result<IssuedPass, GatepassError> {
        let window = event.window()?;
        let tenant = &event.tenant_id;
        let current = self.load(tenant, event.request_id)?;
        ensure_pending(&current)?;

        let serial = self.allocator.allocate()?;
        let pass_id = PassId::from_serial(self.config.pass_prefix, serial, self.config.serial_width)?;

        let approved = VisitorPass {
            status: ApprovalStatus::Approved,
            pass_id: Some(pass_id.clone()),
            visit_date: event.visit_date,
            window,
            decided_at: Some(self.clock.now_utc()),
            ..current
        };

        match self.passes.conditional_decide(
            tenant,
            event.request_id,
            ApprovalStatus::Pending,
            approved.clone(),
        )? {
            CasOutcome::Applied => {
                info!(
                    tenant = %tenant,
                    request = %event.request_id,
                    pass_id = %pass_id,
                    window = %window,
                    "pass issued"
                );
                let payload = PassPayload::new(pass_id, approved.visit_date, &window);
                Ok(IssuedPass {
                    pass: approved,
                    payload,
                })
            }
            CasOutcome::Conflict { current } => {
                warn!(
                    tenant = %tenant,
                    request = %event.request_id,
                    unused_serial = serial,
                    "request decided concurrently, serial left unassigned"
                );
                Err(already_decided(event.request_id, current.as_ref()))
            }
        }
    }

    /// Reject a pending request. No serial is allocated.
    ///
    /// # Errors
    /// - `NotFound` - no such request for this tenant
    /// - `AlreadyDecided` - the request was already approved or rejected
    /// - `StorageUnavailable` - the store could not be reached
    pub fn reject(&self, tenant: &TenantId, request_id: RequestId) -> Result<VisitorPass, GatepassError> {
        let current = self.load(tenant, request_id)?;
        ensure_pending(&current)?;

        let rejected = VisitorPass {
            status: ApprovalStatus::Rejected,
            decided_at: Some(self.clock.now_utc()),
            ..current
        };

        match self
            .passes
            .conditional_decide(tenant, request_id, ApprovalStatus::Pending, rejected.clone())?
        {
            CasOutcome::Applied => {
                info!(tenant = %tenant, request = %request_id, "visit request rejected");
                Ok(rejected)
            }
            CasOutcome::Conflict { current } => Err(already_decided(request_id, current.as_ref())),
        }
    }

    fn load(&self, tenant: &TenantId, request_id: RequestId) -> Result<VisitorPass, GatepassError> {
        self.passes
            .get_pass(tenant, request_id)?
            .ok_or_else(|| GatepassError::NotFound(format!("request {}", request_id)))
    }
}

fn ensure_pending(pass: &VisitorPass) -> Result<(), GatepassError> {
    if pass.status == ApprovalStatus::Pending {
        Ok(())
    } else {
        Err(already_decided(pass.id, Some(pass)))
    }
}

fn already_decided(request_id: RequestId, current: Option<&VisitorPass>) -> GatepassError {
    GatepassError::AlreadyDecided {
        request_id: request_id.to_string(),
        status: current
            .map(|pass| pass.status.to_string())
            .unwrap_or_else(|| "decided".to_string()),
    }
}
