//! Wire-level message types.

pub mod models;
