//! Gatepass configuration.

use chrono::{FixedOffset, Local, Offset, Utc};

/// Configuration for pass issuance and gate admission.
#[derive(Debug, Clone)]
pub struct GatepassConfig {
    /// Fixed textual prefix of every pass id (e.g., "VIS").
    pub pass_prefix: &'static str,

    /// Number of zero-padded decimal digits after the prefix.
    pub serial_width: usize,

    /// Name of the global counter pass serials are drawn from.
    pub serial_counter: &'static str,

    /// Offset defining the server-local calendar day.
    /// Visit dates, windows, and "today" reports are all evaluated at this offset.
    pub utc_offset: FixedOffset,

    /// How many scan records the recent-scans report returns.
    pub recent_scan_limit: usize,
}

impl Default for GatepassConfig {
    fn default() -> Self {
        Self {
            pass_prefix: "VIS",
            serial_width: 10,
            serial_counter: "pass_serial",
            utc_offset: Local::now().offset().fix(),
            recent_scan_limit: 5,
        }
    }
}

impl GatepassConfig {
    /// Default configuration pinned to UTC.
    pub fn utc() -> Self {
        Self {
            utc_offset: Utc.fix(),
            ..Self::default()
        }
    }

    /// Validate configuration for obvious errors.
    pub fn validate(&self) -> Result<(), crate::GatepassError> {
        if self.pass_prefix.is_empty()
            || !self.pass_prefix.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(crate::GatepassError::ConfigError(format!(
                "pass_prefix must be non-empty ASCII alphanumeric, got {:?}",
                self.pass_prefix
            )));
        }
        // u64::MAX has 20 digits; 19 keeps every padded serial representable
        if !(1..=19).contains(&self.serial_width) {
            return Err(crate::GatepassError::ConfigError(format!(
                "serial_width must be between 1 and 19, got {}",
                self.serial_width
            )));
        }
        if self.serial_counter.is_empty() {
            return Err(crate::GatepassError::ConfigError(
                "serial_counter cannot be empty".to_string(),
            ));
        }
        if self.recent_scan_limit == 0 {
            return Err(crate::GatepassError::ConfigError(
                "recent_scan_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
