//! Ports for the rebalance orchestrator
//!
//! - `inbound`: the API offered to schedulers, ledgers and ops tooling
//! - `outbound`: observation transport, stake oracle, persistence, audit log

pub mod inbound;
pub mod outbound;
