//! # qi-02-reputation
//!
//! Reputation Ledger closing the anti-gaming feedback loop.
//!
//! ## Overview
//!
//! - **Penalties**: every `OutlierOffense` emitted by the aggregator lowers the
//!   offending reporter's score; hard offenses also add a strike.
//! - **Suspension**: `suspend_threshold` strikes exclude the reporter entirely.
//! - **Recovery**: scores heal toward 1.0 at a fixed rate per elapsed hour.
//! - **Bounded blast radius**: the effective-stake multiplier never drops below
//!   0.5 for an active reporter.
//!
//! ## State Machine
//!
//! ```text
//! [ACTIVE(score, strikes)] ──strikes >= threshold──→ [SUSPENDED(since)]
//!           ↑                                                │
//!           └──── expiry or admin reinstate: ACTIVE(0, 0) ───┘
//! ```

pub mod config;
pub mod domain;

pub use config::ReputationConfig;
pub use domain::{
    LedgerEvent, LedgerEventKind, LedgerSnapshot, ReputationEntry, ReputationError,
    ReputationLedger, LEDGER_SNAPSHOT_VERSION,
};
