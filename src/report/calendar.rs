//! Calendar bucketing at the server-local offset.
//!
//! Timestamps are stored in UTC; every "today", "this week" and "this year"
//! question is answered on the local calendar defined by the configured offset.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Utc};

/// Local calendar day of a UTC instant.
pub fn local_date(at: DateTime<Utc>, offset: &FixedOffset) -> NaiveDate {
    at.with_timezone(offset).date_naive()
}

/// Whether `at` falls on the local day `day`.
pub fn is_on(at: DateTime<Utc>, day: NaiveDate, offset: &FixedOffset) -> bool {
    local_date(at, offset) == day
}

/// Monday of the ISO week containing `day`.
pub fn week_start(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.weekday().num_days_from_monday()))
}

/// Index 0 (Monday) through 6 (Sunday) if `day` is in the ISO week of `today`.
pub fn weekday_slot(day: NaiveDate, today: NaiveDate) -> Option<usize> {
    (day.iso_week() == today.iso_week()).then(|| day.weekday().num_days_from_monday() as usize)
}

/// Index 0 (January) through 11 (December) if `day` is in the year of `today`.
pub fn month_slot(day: NaiveDate, today: NaiveDate) -> Option<usize> {
    (day.year() == today.year()).then(|| day.month0() as usize)
}
