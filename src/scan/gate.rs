//! Gate admission state machine.
//!
//! Each pass id moves `NoRecord -> Inside -> Completed`, one step per
//! successful scan. A scan:
//! 1. Resolves the approved pass within the gate's tenant
//! 2. Refuses a completed pass outright, whatever the time
//! 3. Evaluates the validity window against the server-local time
//! 4. Advances the ledger entry with a single conditional update keyed by
//!    pass id and guarded by the state read in step 2
//!
//! When two gates scan the same pass at the same instant, exactly one
//! conditional update lands; the other scan fails with `ConcurrentScan`
//! and writes nothing. An exit in the same minute as the entry is treated
//! as that same duplicate tap, so one tap never yields both an entry and
//! an exit.

use crate::clock::Clock;
use crate::model::{scan_state, PassId, ScanRecord, ScanState, TenantId, VisitorPass};
use crate::policy::time::TimeOfDay;
use crate::policy::window::{evaluate, WindowVerdict};
use crate::protocol::models::ScanRequest;
use crate::store::{CasOutcome, PassStore, ScanLedger};
use crate::GatepassError;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Visitor details shown to staff deciding on an early arrival.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarlyArrival {
    /// The scanned pass.
    pub pass_id: PassId,
    /// Visitor name.
    pub name: String,
    /// Visitor photo, if one was uploaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    /// Calendar day of the visit.
    pub visit_date: NaiveDate,
    /// Window opening time.
    pub window_start: TimeOfDay,
    /// Window closing time.
    pub window_end: TimeOfDay,
}

impl EarlyArrival {
    fn from_pass(pass_id: PassId, pass: &VisitorPass) -> Self {
        Self {
            pass_id,
            name: pass.visitor.name.clone(),
            photo_url: pass.visitor.photo_url.clone(),
            visit_date: pass.visit_date,
            window_start: pass.window.start(),
            window_end: pass.window.end(),
        }
    }
}

/// Successful or actionable scan results.
///
/// Failures (unknown pass, expired, completed, lost race) are errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The window has not opened; nothing was recorded. Staff may rescan
    /// with override approval.
    EarlyArrival(EarlyArrival),
    /// The visitor is now inside.
    EntryRecorded {
        /// The scanned pass.
        pass_id: PassId,
        /// Entry time.
        at: DateTime<Utc>,
        /// Admitted before the window opened.
        early_override: bool,
    },
    /// The visitor has left; the pass is spent.
    ExitRecorded {
        /// The scanned pass.
        pass_id: PassId,
        /// Exit time.
        at: DateTime<Utc>,
    },
}

/// Scan admission engine.
pub struct ScanGate {
    passes: Arc<dyn PassStore>,
    ledger: Arc<dyn ScanLedger>,
    clock: Arc<dyn Clock>,
    utc_offset: FixedOffset,
}

impl ScanGate {
    /// Create a gate evaluating windows at `utc_offset`.
    pub fn new(
        passes: Arc<dyn PassStore>,
        ledger: Arc<dyn ScanLedger>,
        clock: Arc<dyn Clock>,
        utc_offset: FixedOffset,
    ) -> Self {
        Self {
            passes,
            ledger,
            clock,
            utc_offset,
        }
    }

    /// Process one scan for a gate operating on behalf of `tenant`.
    ///
    /// # Errors
    /// - `ValidationError` - blank actor id
    /// - `NotFound` - unknown pass id, another tenant's pass, or not approved
    /// - `ExpiredOrInvalid` - wrong day or window closed; override does not apply
    /// - `AlreadyCompleted` - entry and exit were both recorded already
    /// - `ConcurrentScan` - another gate advanced this pass first
    /// - `StorageUnavailable` - the store could not be reached
    pub fn scan(&self, tenant: &TenantId, request: &ScanRequest) -> Result<ScanOutcome, GatepassError> {
        if request.actor_id.trim().is_empty() {
            return Err(GatepassError::ValidationError(
                "actor id is required".to_string(),
            ));
        }
        let pass_id = &request.pass_id;

        let pass = self
            .passes
            .find_by_pass_id(tenant, pass_id)?
            .filter(VisitorPass::is_approved)
            .ok_or_else(|| GatepassError::NotFound(format!("pass {}", pass_id)))?;

        let current = self.ledger.get_scan(tenant, pass_id)?;
        if scan_state(current.as_ref()) == ScanState::Completed {
            warn!(tenant = %tenant, pass_id = %pass_id, "scan of completed pass");
            return Err(GatepassError::AlreadyCompleted {
                pass_id: pass_id.to_string(),
            });
        }

        let now = self.clock.now_utc();
        let local = now.with_timezone(&self.utc_offset).naive_local();
        let verdict = evaluate(&pass.window, pass.visit_date, local);
        match verdict {
            WindowVerdict::WrongDay | WindowVerdict::Expired => {
                warn!(tenant = %tenant, pass_id = %pass_id, %verdict, "scan refused");
                return Err(GatepassError::ExpiredOrInvalid {
                    pass_id: pass_id.to_string(),
                    verdict,
                });
            }
            WindowVerdict::TooEarly if !request.override_approval => {
                debug!(tenant = %tenant, pass_id = %pass_id, "early arrival, awaiting staff decision");
                return Ok(ScanOutcome::EarlyArrival(EarlyArrival::from_pass(
                    pass_id.clone(),
                    &pass,
                )));
            }
            WindowVerdict::TooEarly => {
                info!(
                    tenant = %tenant,
                    pass_id = %pass_id,
                    actor = %request.actor_id,
                    "early entry approved by staff"
                );
            }
            WindowVerdict::Valid => {}
        }

        self.advance(tenant, &pass, current, request, now, verdict == WindowVerdict::TooEarly)
    }

    /// Current admission state of a pass.
    pub fn state(&self, tenant: &TenantId, pass_id: &PassId) -> Result<ScanState, GatepassError> {
        Ok(scan_state(self.ledger.get_scan(tenant, pass_id)?.as_ref()))
    }

    fn advance(
        &self,
        tenant: &TenantId,
        pass: &VisitorPass,
        current: Option<ScanRecord>,
        request: &ScanRequest,
        now: DateTime<Utc>,
        early: bool,
    ) -> Result<ScanOutcome, GatepassError> {
        let pass_id = &request.pass_id;
        let actor = request.actor_id.as_str();

        let (expected, next, outcome) = match current {
            None => (
                ScanState::NoRecord,
                ScanRecord::entered(pass, pass_id.clone(), actor, now, early),
                ScanOutcome::EntryRecorded {
                    pass_id: pass_id.clone(),
                    at: now,
                    early_override: early,
                },
            ),
            Some(record) if record.entry_at.is_some_and(|entry| same_minute(entry, now)) => {
                warn!(
                    tenant = %tenant,
                    pass_id = %pass_id,
                    actor,
                    "exit refused in the entry minute, treating as duplicate tap"
                );
                return Err(GatepassError::ConcurrentScan {
                    pass_id: pass_id.to_string(),
                });
            }
            Some(record) if record.state() == ScanState::Inside => (
                ScanState::Inside,
                record.exited(actor, now),
                ScanOutcome::ExitRecorded {
                    pass_id: pass_id.clone(),
                    at: now,
                },
            ),
            Some(_) => {
                warn!(tenant = %tenant, pass_id = %pass_id, "scan of completed pass");
                return Err(GatepassError::AlreadyCompleted {
                    pass_id: pass_id.to_string(),
                });
            }
        };

        match self.ledger.conditional_update(tenant, pass_id, expected, next)? {
            CasOutcome::Applied => {
                match &outcome {
                    ScanOutcome::EntryRecorded { .. } => {
                        info!(tenant = %tenant, pass_id = %pass_id, actor, early, "entry recorded")
                    }
                    ScanOutcome::ExitRecorded { .. } => {
                        info!(tenant = %tenant, pass_id = %pass_id, actor, "exit recorded")
                    }
                    ScanOutcome::EarlyArrival(_) => {}
                }
                Ok(outcome)
            }
            CasOutcome::Conflict { current } => {
                warn!(
                    tenant = %tenant,
                    pass_id = %pass_id,
                    expected = %expected,
                    found = %scan_state(current.as_ref()),
                    "concurrent scan lost the race"
                );
                Err(GatepassError::ConcurrentScan {
                    pass_id: pass_id.to_string(),
                })
            }
        }
    }
}

/// Whether two instants share a wall-clock minute.
fn same_minute(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a.timestamp().div_euclid(60) == b.timestamp().div_euclid(60)
}
