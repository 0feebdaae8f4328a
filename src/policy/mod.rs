//! Time-window admission policy.

pub mod time;
pub mod window;
