//! Gatepass error types.

use crate::policy::window::WindowVerdict;
use thiserror::Error;

/// Broad failure classes callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid configuration.
    Config,
    /// Malformed input.
    Validation,
    /// Unknown or unapproved pass, or unknown request.
    NotFound,
    /// Re-allocation attempt or duplicate terminal mutation.
    Conflict,
    /// Transient infrastructure fault, retryable by the caller.
    StorageUnavailable,
    /// Expired or wrong-day pass; the visitor needs a new pass.
    PolicyViolation,
}

/// Errors that can occur while issuing passes, scanning, or reporting.
#[derive(Debug, Error)]
pub enum GatepassError {
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Input failed validation.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The requested entity does not exist for this tenant.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request was already approved or rejected.
    #[error("Request {request_id} is already {status}")]
    AlreadyDecided {
        /// The request that was already decided.
        request_id: String,
        /// Its current status.
        status: String,
    },

    /// The pass has already been used for entry and exit.
    #[error("Pass {pass_id} has already been scanned for exit, no further scans allowed")]
    AlreadyCompleted {
        /// The completed pass.
        pass_id: String,
    },

    /// Another gate advanced this pass between read and write.
    #[error("Pass {pass_id} was scanned concurrently at another gate")]
    ConcurrentScan {
        /// The contended pass.
        pass_id: String,
    },

    /// The allocated serial no longer fits the configured width.
    #[error("Serial {serial} exceeds {width} digits")]
    SerialExhausted {
        /// The serial that overflowed.
        serial: u64,
        /// Configured digit count.
        width: usize,
    },

    /// The backing store could not be reached.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The pass is outside its validity day or window.
    #[error("Pass {pass_id} is not valid now ({verdict})")]
    ExpiredOrInvalid {
        /// The rejected pass.
        pass_id: String,
        /// Why the window check failed.
        verdict: WindowVerdict,
    },
}

impl GatepassError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigError(_) => ErrorKind::Config,
            Self::ValidationError(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::AlreadyDecided { .. }
            | Self::AlreadyCompleted { .. }
            | Self::ConcurrentScan { .. }
            | Self::SerialExhausted { .. } => ErrorKind::Conflict,
            Self::StorageUnavailable(_) => ErrorKind::StorageUnavailable,
            Self::ExpiredOrInvalid { .. } => ErrorKind::PolicyViolation,
        }
    }

    /// Whether the caller may retry with backoff.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::StorageUnavailable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_storage_faults_are_retryable() {
        assert!(GatepassError::StorageUnavailable("down".into()).is_retryable());
        assert!(!GatepassError::NotFound("VIS0000000001".into()).is_retryable());
        assert!(!GatepassError::ExpiredOrInvalid {
            pass_id: "VIS0000000001".into(),
            verdict: WindowVerdict::Expired,
        }
        .is_retryable());
    }

    #[test]
    fn conflicts_share_a_kind() {
        let completed = GatepassError::AlreadyCompleted {
            pass_id: "VIS0000000001".into(),
        };
        let raced = GatepassError::ConcurrentScan {
            pass_id: "VIS0000000001".into(),
        };
        assert_eq!(completed.kind(), ErrorKind::Conflict);
        assert_eq!(raced.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn policy_violation_message_names_verdict() {
        let err = GatepassError::ExpiredOrInvalid {
            pass_id: "VIS0000000007".into(),
            verdict: WindowVerdict::WrongDay,
        };
        assert_eq!(err.kind(), ErrorKind::PolicyViolation);
        assert!(err.to_string().contains("not valid for today"));
    }
}
