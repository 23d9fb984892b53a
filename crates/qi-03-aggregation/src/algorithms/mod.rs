//! # Aggregation Algorithms
//!
//! - `robust_stats`: median, MAD, stake-weighted median, outlier mask
//! - `aggregator`: per-asset and per-batch consensus
//! - `quorum_gate`: rebalance-level participation check
//! - `daily_series`: trailing per-day consensus used for eligibility

pub mod aggregator;
pub mod daily_series;
pub mod quorum_gate;
pub mod robust_stats;

pub use aggregator::{aggregate, aggregate_batch};
pub use daily_series::daily_consensus_series;
pub use quorum_gate::check_rebalance_quorum;
pub use robust_stats::{mad, median, outlier_mask, robust_consensus, weighted_median};
