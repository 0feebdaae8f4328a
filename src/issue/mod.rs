//! Serial allocation and pass issuance.

pub mod issuer;
pub mod sequence;
