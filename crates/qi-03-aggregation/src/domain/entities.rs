//! Consensus result types

use serde::{Deserialize, Serialize};
use shared_types::{AssetId, Metric, OutlierOffense, Timestamp};
use std::collections::{BTreeMap, BTreeSet};

/// Which path produced a consensus value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusSource {
    /// Stake-weighted median of in-window survivors
    Window,
    /// No in-window observations; all-time weighted median
    NoFreshData,
    /// In-window survivors fell short of quorum; all-time weighted median
    QuorumFallback,
}

/// Consensus value for one asset and metric in one run.
///
/// Derived, recomputed every run; an absent result means "no data", never zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub asset_id: AssetId,
    pub metric: Metric,
    pub value: f64,
    /// Surviving effective stake over total known stake, in `[0, 1]`
    pub quorum_coverage: f64,
    /// Seconds since the freshest observation considered
    pub staleness_seconds: u64,
    pub source: ConsensusSource,
}

impl ConsensusResult {
    /// True if the value came from the live window.
    pub fn is_fresh(&self) -> bool {
        self.source == ConsensusSource::Window
    }
}

/// Inputs fixed for the whole aggregation run.
///
/// INVARIANT: `total_known_stake` is the same denominator for every asset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AggregationContext {
    pub now: Timestamp,
    pub total_known_stake: f64,
}

/// Result of aggregating one asset.
#[derive(Clone, Debug, PartialEq)]
pub struct AggregationOutcome {
    pub result: ConsensusResult,
    pub offenses: Vec<OutlierOffense>,
}

/// Result of aggregating every asset of one metric.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchOutcome {
    pub results: BTreeMap<AssetId, ConsensusResult>,
    /// Offenses ordered by asset, then reporter
    pub offenses: Vec<OutlierOffense>,
}

/// Rebalance-level participation check.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QuorumReport {
    pub rebalance_id: u64,
    pub passed: bool,
    pub failed_asset_ids: BTreeSet<AssetId>,
    /// Fraction of each asset's stake that reported in this rebalance
    pub participation: BTreeMap<AssetId, f64>,
}
