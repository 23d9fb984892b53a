//! Inbound Ports (Driving Ports / API)

use crate::domain::RebalanceFailure;
use async_trait::async_trait;
use qi_02_reputation::{LedgerEvent, ReputationEntry};
use qi_03_aggregation::ConsensusResult;
use qi_04_index_construction::WeightSet;
use shared_types::{AssetId, Metric, ReporterId, Timestamp};
use std::collections::BTreeSet;

/// Primary rebalance API.
#[async_trait]
pub trait RebalanceApi: Send + Sync {
    /// Run the pipeline for the epoch containing `now`.
    ///
    /// Idempotent per epoch: once an epoch is published, repeated runs
    /// return the stored set without touching any state.
    async fn run_epoch(&self, now: Timestamp) -> Result<WeightSet, RebalanceFailure>;

    /// `run_epoch` at the injected clock's current instant.
    async fn run_current_epoch(&self) -> Result<WeightSet, RebalanceFailure>;

    /// Consensus from the last completed run; `None` means no data.
    fn consensus_value(&self, asset_id: AssetId, metric: Metric) -> Option<ConsensusResult>;

    /// Reputation of `reporter` as of the clock's current instant.
    async fn reporter_status(
        &self,
        reporter: &ReporterId,
    ) -> Result<ReputationEntry, RebalanceFailure>;

    /// Assets excluded by the rebalance quorum gate in the last run.
    fn paused_assets(&self) -> BTreeSet<AssetId>;

    /// Operator action: lift a suspension, resetting to score 0 and no strikes.
    async fn reinstate_reporter(&self, reporter: &ReporterId)
        -> Result<LedgerEvent, RebalanceFailure>;
}
