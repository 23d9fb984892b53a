//! # Integration Flows
//!
//! End-to-end runs of `RebalanceService` over the in-memory and file
//! adapters, crossing every pipeline stage.

pub mod epoch_flow;
pub mod fixtures;
pub mod persistence;
