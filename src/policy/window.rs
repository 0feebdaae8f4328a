//! Validity-window evaluation.
//!
//! Decides whether "now" falls inside, before, or after a pass's window:
//! - `WrongDay` when the server-local date differs from the visit date
//! - `TooEarly` before the window opens (soft, overridable by staff)
//! - `Expired` after the window closes (terminal)
//! - `Valid` otherwise
//!
//! Both window ends are inclusive at minute resolution, so a scan at
//! 10:00:59 against a window ending 10:00 is still valid.

use crate::policy::time::{TimeOfDay, ValidityWindow};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of evaluating a pass window against the current time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WindowVerdict {
    /// Inside the window on the visit day.
    Valid,
    /// Visit day, but before the window opens.
    TooEarly,
    /// Visit day, but after the window closed.
    Expired,
    /// Not the visit day.
    WrongDay,
}

impl WindowVerdict {
    /// Whether staff may admit anyway.
    pub fn is_overridable(self) -> bool {
        matches!(self, Self::TooEarly)
    }

    /// Whether no later scan can succeed for this pass.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Expired | Self::WrongDay)
    }
}

impl fmt::Display for WindowVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Valid => "pass is valid",
            Self::TooEarly => "window has not opened yet",
            Self::Expired => "pass has expired",
            Self::WrongDay => "pass is not valid for today",
        };
        f.write_str(text)
    }
}

/// Evaluate a window for `visit_date` against a server-local `now`.
pub fn evaluate(window: &ValidityWindow, visit_date: NaiveDate, now: NaiveDateTime) -> WindowVerdict {
    if now.date() != visit_date {
        return WindowVerdict::WrongDay;
    }

    let current = TimeOfDay::from_time(now.time());
    if current < window.start() {
        WindowVerdict::TooEarly
    } else if current > window.end() {
        WindowVerdict::Expired
    } else {
        WindowVerdict::Valid
    }
}

/// Whether a window can no longer be used at all: its day has passed, or it
/// is the visit day and the window has closed.
///
/// Future days are not lapsed, unlike `evaluate` which reports them as
/// `WrongDay`.
pub fn has_lapsed(window: &ValidityWindow, visit_date: NaiveDate, now: NaiveDateTime) -> bool {
    let today = now.date();
    if visit_date < today {
        return true;
    }
    visit_date == today && TimeOfDay::from_time(now.time()) > window.end()
}
