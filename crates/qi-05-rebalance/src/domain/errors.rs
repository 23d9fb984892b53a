//! Error types for the rebalance orchestrator

use qi_01_epoch_clock::EpochError;
use qi_04_index_construction::CanonicalizeError;
use shared_types::AssetId;
use std::collections::BTreeSet;
use thiserror::Error;

/// Persistence errors from a `StateStore` or `AuditLog`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(String),

    #[error("Failed to lock {path}: {reason}")]
    Lock { path: String, reason: String },

    /// Stored bytes do not decode to the expected record
    #[error("Corrupt record at {key}: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Failed to encode record for {key}: {reason}")]
    Encode { key: String, reason: String },
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}

/// Errors from the observation source or the stake oracle.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceError {
    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

/// Typed failure of an epoch run.
///
/// Degenerate weights are not a failure; they publish a frozen set.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RebalanceFailure {
    /// Assets short of rebalance quorum while failing closed
    #[error("Rebalance {rebalance_id} failed quorum for assets {assets:?}")]
    QuorumFailed {
        rebalance_id: u64,
        assets: BTreeSet<AssetId>,
    },

    #[error("Degenerate weights at epoch {epoch_id} and no prior weight set")]
    NoPriorSnapshot { epoch_id: u64 },

    /// A weight set broke its own invariants; nothing was published
    #[error("Invariant violation: {reason}")]
    InvariantViolation { reason: String },

    /// Persisted state failed to decode or validate
    #[error("Corrupt state at {key}: {reason}")]
    CorruptState { key: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(StoreError),

    #[error("Source error: {0}")]
    Source(String),

    #[error("Clock error: {0}")]
    Clock(#[from] EpochError),

    /// Requested epoch precedes the last published one
    #[error("Epoch {requested} precedes last published epoch {last}")]
    EpochRegression { last: u64, requested: u64 },
}

impl RebalanceFailure {
    /// Assets implicated by a quorum failure.
    pub fn failed_assets(&self) -> Option<&BTreeSet<AssetId>> {
        match self {
            RebalanceFailure::QuorumFailed { assets, .. } => Some(assets),
            _ => None,
        }
    }

    /// Short stable label, used as a metric dimension.
    pub fn label(&self) -> &'static str {
        match self {
            RebalanceFailure::QuorumFailed { .. } => "quorum_failed",
            RebalanceFailure::NoPriorSnapshot { .. } => "no_prior_snapshot",
            RebalanceFailure::InvariantViolation { .. } => "invariant_violation",
            RebalanceFailure::CorruptState { .. } => "corrupt_state",
            RebalanceFailure::Storage(_) => "storage",
            RebalanceFailure::Source(_) => "source",
            RebalanceFailure::Clock(_) => "clock",
            RebalanceFailure::EpochRegression { .. } => "epoch_regression",
        }
    }
}

impl From<StoreError> for RebalanceFailure {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Corrupt { key, reason } => RebalanceFailure::CorruptState { key, reason },
            other => RebalanceFailure::Storage(other),
        }
    }
}

impl From<SourceError> for RebalanceFailure {
    fn from(e: SourceError) -> Self {
        RebalanceFailure::Source(e.to_string())
    }
}

impl From<CanonicalizeError> for RebalanceFailure {
    fn from(e: CanonicalizeError) -> Self {
        match e {
            CanonicalizeError::NoPriorSnapshot { epoch_id } => {
                RebalanceFailure::NoPriorSnapshot { epoch_id }
            }
            other => RebalanceFailure::InvariantViolation {
                reason: other.to_string(),
            },
        }
    }
}
