//! Audit records
//!
//! Append-only facts written once per run, before state is persisted.

use qi_02_reputation::LedgerEvent;
use serde::{Deserialize, Serialize};
use shared_types::{AssetId, OutlierOffense, ReporterId, Timestamp};
use std::collections::BTreeSet;
use uuid::Uuid;

/// One line of the audit log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Correlates every entry written by one run
    pub run_id: Uuid,
    pub epoch_id: u64,
    pub at: Timestamp,
    pub record: AuditRecord,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditRecord {
    /// Observation rejected by schema validation
    Quarantined {
        reporter_id: ReporterId,
        asset_id: AssetId,
        reason: String,
    },
    /// Observation disqualified by the aggregator
    Offense(OutlierOffense),
    /// Reputation transition caused by an offense or an operator
    Reputation(LedgerEvent),
    /// Assets short of rebalance quorum
    QuorumFailed {
        rebalance_id: u64,
        assets: BTreeSet<AssetId>,
        fail_closed: bool,
    },
    /// Weight set committed for the epoch
    Published {
        content_hash: String,
        frozen: bool,
        constituents: Vec<AssetId>,
    },
}

impl AuditRecord {
    pub fn kind(&self) -> &'static str {
        match self {
            AuditRecord::Quarantined { .. } => "quarantined",
            AuditRecord::Offense(_) => "offense",
            AuditRecord::Reputation(_) => "reputation",
            AuditRecord::QuorumFailed { .. } => "quorum_failed",
            AuditRecord::Published { .. } => "published",
        }
    }
}
