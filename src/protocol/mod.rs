//! Redemption-script construction and legacy signing.

pub mod contract;
pub mod error;
