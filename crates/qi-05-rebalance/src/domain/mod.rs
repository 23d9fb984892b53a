//! Domain module for the rebalance orchestrator
//!
//! Failure taxonomy, audit records and the storage key layout.

pub mod audit;
pub mod errors;
pub mod keys;

pub use audit::*;
pub use errors::*;
