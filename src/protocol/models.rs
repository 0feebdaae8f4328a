//! Boundary messages: approval events in, pass payloads and scan responses out.

use crate::errors::ErrorKind;
use crate::model::{PassId, RequestId, TenantId};
use crate::policy::time::{TimeOfDay, ValidityWindow};
use crate::scan::gate::{EarlyArrival, ScanOutcome};
use crate::GatepassError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Confirmed approval from the external review workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalEvent {
    /// Tenant owning the request.
    pub tenant_id: TenantId,
    /// The approved request.
    pub request_id: RequestId,
    /// Calendar day of the visit.
    pub visit_date: NaiveDate,
    /// Window opening time.
    pub window_start: TimeOfDay,
    /// Window closing time.
    pub window_end: TimeOfDay,
}

impl ApprovalEvent {
    /// The event's window; fails if start is not before end.
    pub fn window(&self) -> Result<ValidityWindow, GatepassError> {
        ValidityWindow::new(self.window_start, self.window_end)
    }
}

/// Structured record embedded in a pass's scannable code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassPayload {
    /// Pass identifier.
    pub pass_id: PassId,
    /// Calendar day of the visit.
    pub visit_date: NaiveDate,
    /// Window opening time.
    pub window_start: TimeOfDay,
    /// Window closing time.
    pub window_end: TimeOfDay,
}

impl PassPayload {
    /// Build the payload for an issued pass.
    pub fn new(pass_id: PassId, visit_date: NaiveDate, window: &ValidityWindow) -> Self {
        Self {
            pass_id,
            visit_date,
            window_start: window.start(),
            window_end: window.end(),
        }
    }

    /// Serialize for the rendering collaborator.
    pub fn to_json(&self) -> Result<String, GatepassError> {
        serde_json::to_string(self).map_err(|e| {
            GatepassError::ValidationError(format!("Failed to serialize payload: {}", e))
        })
    }

    /// Decode a payload read back from a scanned code.
    pub fn from_json(json: &str) -> Result<Self, GatepassError> {
        serde_json::from_str(json)
            .map_err(|e| GatepassError::ValidationError(format!("Invalid pass payload: {}", e)))
    }
}

/// Gate-side scan request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    /// The scanned pass.
    pub pass_id: PassId,
    /// Staff approved admitting an early visitor.
    #[serde(default)]
    pub override_approval: bool,
    /// Staff member operating the gate.
    pub actor_id: String,
}

impl ScanRequest {
    /// A plain scan without override.
    pub fn new(pass_id: PassId, actor_id: impl Into<String>) -> Self {
        Self {
            pass_id,
            override_approval: false,
            actor_id: actor_id.into(),
        }
    }

    /// The same scan with staff override set.
    pub fn with_override(mut self) -> Self {
        self.override_approval = true;
        self
    }
}

/// Stable tag for each scan response kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScanStatus {
    /// Entry recorded.
    EntryRecorded,
    /// Exit recorded.
    ExitRecorded,
    /// Needs a staff decision; nothing recorded.
    EarlyArrival,
    /// Pass already used for entry and exit.
    AlreadyCompleted,
    /// Wrong day or expired.
    ExpiredOrInvalid,
    /// Unknown or unapproved pass.
    NotFound,
    /// Lost a race with another gate.
    Conflict,
    /// Store unreachable; retry later.
    StorageUnavailable,
    /// Malformed request or configuration.
    InvalidRequest,
}

/// Serializable scan result for gate devices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    /// What happened.
    pub status: ScanStatus,
    /// Human-readable explanation.
    pub message: String,
    /// Whether the gate may retry the same scan.
    pub retryable: bool,
    /// When the entry or exit was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<DateTime<Utc>>,
    /// Visitor details for an early-arrival decision.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visitor: Option<EarlyArrival>,
}

impl ScanResponse {
    /// Render a gate result for the wire.
    pub fn from_result(result: &Result<ScanOutcome, GatepassError>) -> Self {
        match result {
            Ok(outcome) => Self::from_outcome(outcome),
            Err(error) => Self::from_error(error),
        }
    }

    fn from_outcome(outcome: &ScanOutcome) -> Self {
        let (status, message, recorded_at, visitor) = match outcome {
            ScanOutcome::EntryRecorded { at, .. } => (
                ScanStatus::EntryRecorded,
                "Entry time recorded successfully.",
                Some(*at),
                None,
            ),
            ScanOutcome::ExitRecorded { at, .. } => (
                ScanStatus::ExitRecorded,
                "Exit time recorded successfully.",
                Some(*at),
                None,
            ),
            ScanOutcome::EarlyArrival(details) => (
                ScanStatus::EarlyArrival,
                "Visitor is early. Security can approve entry.",
                None,
                Some(details.clone()),
            ),
        };
        Self {
            status,
            message: message.to_string(),
            retryable: false,
            recorded_at,
            visitor,
        }
    }

    fn from_error(error: &GatepassError) -> Self {
        let status = match error {
            GatepassError::AlreadyCompleted { .. } => ScanStatus::AlreadyCompleted,
            GatepassError::ExpiredOrInvalid { .. } => ScanStatus::ExpiredOrInvalid,
            _ => match error.kind() {
                ErrorKind::NotFound => ScanStatus::NotFound,
                ErrorKind::Conflict => ScanStatus::Conflict,
                ErrorKind::StorageUnavailable => ScanStatus::StorageUnavailable,
                ErrorKind::PolicyViolation => ScanStatus::ExpiredOrInvalid,
                ErrorKind::Config | ErrorKind::Validation => ScanStatus::InvalidRequest,
            },
        };
        Self {
            status,
            message: error.to_string(),
            retryable: error.is_retryable(),
            recorded_at: None,
            visitor: None,
        }
    }
}
