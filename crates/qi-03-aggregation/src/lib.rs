//! # QI-03 Aggregation
//!
//! Robust Aggregator and Rebalance Quorum Gate.
//!
//! **Subsystem ID:** 3  
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Turn many mutually-distrusting reports per asset into one consensus value:
//! - Time-window and staleness gating
//! - Median + MAD outlier rejection and a maximum-deviation band
//! - Stake-weighted median over survivors, scaled by reputation
//! - Quorum coverage against a fixed per-run stake denominator
//! - All-time fallback when the window is empty or under quorum
//!
//! Every rejected report becomes an `OutlierOffense` for the reputation ledger.
//!
//! ## Module Structure
//!
//! ```text
//! qi-03-aggregation/
//! ├── domain/       # ConsensusResult, AggregationContext, QuorumReport, errors
//! ├── algorithms/   # robust statistics, aggregator, quorum gate, daily series
//! └── config.rs     # AggregationParams, QuorumGateConfig
//! ```

#![warn(clippy::all)]

pub mod algorithms;
pub mod config;
pub mod domain;

pub use algorithms::{
    aggregate, aggregate_batch, check_rebalance_quorum, daily_consensus_series, mad, median,
    robust_consensus, weighted_median,
};
pub use config::{AggregationParams, QuorumGateConfig};
pub use domain::{
    AggregationContext, AggregationError, AggregationOutcome, BatchOutcome, ConsensusResult,
    ConsensusSource, QuorumReport,
};
