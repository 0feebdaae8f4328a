//! Domain records: visit requests, passes, and the scan ledger.

use crate::policy::time::ValidityWindow;
use crate::GatepassError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of an isolated customer organization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Wrap a tenant identifier; it must not be blank.
    pub fn new(id: impl Into<String>) -> Result<Self, GatepassError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(GatepassError::ValidationError(
                "tenant id cannot be empty".to_string(),
            ));
        }
        Ok(Self(id))
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a submitted visit request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Scannable pass identifier: a fixed prefix plus a zero-padded serial.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PassId(String);

impl PassId {
    /// Format a serial as `<prefix><serial padded to width>`.
    pub fn from_serial(prefix: &str, serial: u64, width: usize) -> Result<Self, GatepassError> {
        let digits = serial.to_string();
        if digits.len() > width {
            return Err(GatepassError::SerialExhausted { serial, width });
        }
        Ok(Self(format!("{}{:0>width$}", prefix, digits, width = width)))
    }

    /// Wrap a pass id read from a scanned code.
    pub fn parse(raw: &str) -> Result<Self, GatepassError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(GatepassError::ValidationError(
                "pass id is required".to_string(),
            ));
        }
        Ok(Self(raw.to_string()))
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Contact details a visitor submits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorContact {
    /// Display name.
    pub name: String,
    /// Lowercased email address.
    pub email: String,
    /// Phone number as entered.
    pub phone: String,
    /// Link to an uploaded photo, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

/// Input for a new visit request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitRequestForm {
    /// Who is visiting.
    pub visitor: VisitorContact,
    /// Purpose of the visit.
    pub reason: String,
    /// Department being visited (reference data id).
    #[serde(default)]
    pub department: Option<String>,
    /// Staff member being visited (reference data id).
    #[serde(default)]
    pub person_to_meet: Option<String>,
    /// Calendar day of the visit.
    pub visit_date: NaiveDate,
    /// Requested admission window.
    pub window: ValidityWindow,
}

impl VisitRequestForm {
    /// Check required fields and normalize the email address.
    pub fn normalize(mut self) -> Result<Self, GatepassError> {
        let required = [
            ("name", &self.visitor.name),
            ("email", &self.visitor.email),
            ("phone", &self.visitor.phone),
            ("reason", &self.reason),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(GatepassError::ValidationError(format!(
                "{} is required",
                field
            )));
        }

        self.visitor.email = self.visitor.email.trim().to_lowercase();
        if !self.visitor.email.contains('@') {
            return Err(GatepassError::ValidationError(format!(
                "invalid email address: {}",
                self.visitor.email
            )));
        }
        Ok(self)
    }
}

/// Decision state of a visit request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApprovalStatus {
    /// Awaiting staff decision.
    Pending,
    /// Approved; a pass id has been allocated.
    Approved,
    /// Rejected; no pass id exists.
    Rejected,
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        };
        f.write_str(text)
    }
}

/// One visit request and, once approved, its pass.
///
/// Never deleted; the status changes at most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorPass {
    /// Request identifier.
    pub id: RequestId,
    /// Owning tenant.
    pub tenant: TenantId,
    /// Visitor contact details.
    pub visitor: VisitorContact,
    /// Purpose of the visit.
    pub reason: String,
    /// Department being visited.
    pub department: Option<String>,
    /// Staff member being visited.
    pub person_to_meet: Option<String>,
    /// Calendar day of the visit.
    pub visit_date: NaiveDate,
    /// Admission window.
    pub window: ValidityWindow,
    /// Decision state.
    pub status: ApprovalStatus,
    /// Allocated pass id; present exactly when `status` is `Approved`.
    pub pass_id: Option<PassId>,
    /// When the request was submitted.
    pub submitted_at: DateTime<Utc>,
    /// When the request was approved or rejected.
    pub decided_at: Option<DateTime<Utc>>,
}

impl VisitorPass {
    /// A new pending request from a validated form.
    pub fn pending(tenant: TenantId, form: VisitRequestForm, submitted_at: DateTime<Utc>) -> Self {
        Self {
            id: RequestId::generate(),
            tenant,
            visitor: form.visitor,
            reason: form.reason,
            department: form.department,
            person_to_meet: form.person_to_meet,
            visit_date: form.visit_date,
            window: form.window,
            status: ApprovalStatus::Pending,
            pass_id: None,
            submitted_at,
            decided_at: None,
        }
    }

    /// Whether the pass can be scanned.
    pub fn is_approved(&self) -> bool {
        self.status == ApprovalStatus::Approved && self.pass_id.is_some()
    }
}

/// Visitor fields copied into the ledger at first scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorSnapshot {
    /// Visitor contact details.
    pub contact: VisitorContact,
    /// Department being visited.
    pub department: Option<String>,
    /// Staff member being visited.
    pub person_to_meet: Option<String>,
    /// Calendar day of the visit.
    pub visit_date: NaiveDate,
    /// Admission window.
    pub window: ValidityWindow,
}

impl From<&VisitorPass> for VisitorSnapshot {
    fn from(pass: &VisitorPass) -> Self {
        Self {
            contact: pass.visitor.clone(),
            department: pass.department.clone(),
            person_to_meet: pass.person_to_meet.clone(),
            visit_date: pass.visit_date,
            window: pass.window,
        }
    }
}

/// Admission state of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScanState {
    /// Never scanned.
    NoRecord,
    /// Entered, not yet exited.
    Inside,
    /// Entered and exited. Terminal.
    Completed,
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NoRecord => "no record",
            Self::Inside => "inside",
            Self::Completed => "completed",
        };
        f.write_str(text)
    }
}

/// Ledger entry for one pass id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRecord {
    /// The scanned pass.
    pub pass_id: PassId,
    /// Owning tenant.
    pub tenant: TenantId,
    /// Display fields captured at first scan.
    pub visitor: VisitorSnapshot,
    /// Time of the first successful scan.
    pub scanned_at: DateTime<Utc>,
    /// Entry time.
    pub entry_at: Option<DateTime<Utc>>,
    /// Exit time.
    pub exit_at: Option<DateTime<Utc>>,
    /// Staff member who admitted the visitor.
    pub entry_actor: String,
    /// Staff member who recorded the exit.
    #[serde(default)]
    pub exit_actor: Option<String>,
    /// Entry was admitted before the window opened.
    #[serde(default)]
    pub early_override: bool,
}

impl ScanRecord {
    /// A fresh ledger entry for an admitted visitor.
    pub fn entered(
        pass: &VisitorPass,
        pass_id: PassId,
        actor: &str,
        at: DateTime<Utc>,
        early_override: bool,
    ) -> Self {
        Self {
            pass_id,
            tenant: pass.tenant.clone(),
            visitor: VisitorSnapshot::from(pass),
            scanned_at: at,
            entry_at: Some(at),
            exit_at: None,
            entry_actor: actor.to_string(),
            exit_actor: None,
            early_override,
        }
    }

    /// This entry with the exit recorded.
    pub fn exited(&self, actor: &str, at: DateTime<Utc>) -> Self {
        Self {
            exit_at: Some(at),
            exit_actor: Some(actor.to_string()),
            ..self.clone()
        }
    }

    /// Current admission state.
    pub fn state(&self) -> ScanState {
        match (self.entry_at, self.exit_at) {
            (_, Some(_)) => ScanState::Completed,
            (Some(_), None) => ScanState::Inside,
            (None, None) => ScanState::NoRecord,
        }
    }
}

/// Admission state of an optional ledger entry.
pub fn scan_state(record: Option<&ScanRecord>) -> ScanState {
    record.map_or(ScanState::NoRecord, ScanRecord::state)
}
