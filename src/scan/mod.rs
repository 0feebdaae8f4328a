//! Gate-side scanning.

pub mod gate;
