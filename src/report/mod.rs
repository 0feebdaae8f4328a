//! Dashboard reporting.

pub mod aggregate;
pub mod calendar;
