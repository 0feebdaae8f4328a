//! Minute-resolution time-of-day values and validity windows.
//!
//! Windows are compared as integers, never as `HH:mm` strings.

use crate::GatepassError;
use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A wall-clock time of day, truncated to the minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    /// Build from hour (0-23) and minute (0-59).
    pub fn new(hour: u8, minute: u8) -> Result<Self, GatepassError> {
        if hour > 23 || minute > 59 {
            return Err(GatepassError::ValidationError(format!(
                "time of day out of range: {:02}:{:02}",
                hour, minute
            )));
        }
        Ok(Self(u16::from(hour) * 60 + u16::from(minute)))
    }

    /// Truncate a `NaiveTime` to minute resolution.
    pub fn from_time(time: NaiveTime) -> Self {
        // hour() <= 23 and minute() <= 59, so this stays below 1440
        Self((time.hour() * 60 + time.minute()) as u16)
    }

    /// Minutes elapsed since midnight.
    pub fn minutes_since_midnight(self) -> u16 {
        self.0
    }

    /// Hour component.
    pub fn hour(self) -> u8 {
        (self.0 / 60) as u8
    }

    /// Minute component.
    pub fn minute(self) -> u8 {
        (self.0 % 60) as u8
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for TimeOfDay {
    type Err = GatepassError;

    /// Parse `H:mm` or `HH:mm`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GatepassError::ValidationError(format!("invalid time of day: {:?}", s));

        let (hour, minute) = s.trim().split_once(':').ok_or_else(invalid)?;
        if hour.is_empty() || hour.len() > 2 || minute.len() != 2 {
            return Err(invalid());
        }
        if !hour.bytes().chain(minute.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let hour: u8 = hour.parse().map_err(|_| invalid())?;
        let minute: u8 = minute.parse().map_err(|_| invalid())?;
        Self::new(hour, minute)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = GatepassError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

/// Interval of a day during which a pass admits entry. Both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WindowParts")]
pub struct ValidityWindow {
    start: TimeOfDay,
    end: TimeOfDay,
}

#[derive(Deserialize)]
struct WindowParts {
    start: TimeOfDay,
    end: TimeOfDay,
}

impl TryFrom<WindowParts> for ValidityWindow {
    type Error = GatepassError;

    fn try_from(parts: WindowParts) -> Result<Self, Self::Error> {
        Self::new(parts.start, parts.end)
    }
}

impl ValidityWindow {
    /// Build a window; `start` must be strictly before `end`.
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Result<Self, GatepassError> {
        if start >= end {
            return Err(GatepassError::ValidationError(format!(
                "window start {} must be before window end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse both ends from `HH:mm` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self, GatepassError> {
        Self::new(start.parse()?, end.parse()?)
    }

    /// Opening time.
    pub fn start(&self) -> TimeOfDay {
        self.start
    }

    /// Closing time.
    pub fn end(&self) -> TimeOfDay {
        self.end
    }

    /// Window length in minutes.
    pub fn duration_minutes(&self) -> u16 {
        self.end.0 - self.start.0
    }
}

impl fmt::Display for ValidityWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
