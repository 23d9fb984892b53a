//! Eligibility and selection records

use serde::{Deserialize, Serialize};
use shared_types::AssetId;
use std::collections::BTreeMap;

/// Per-asset eligibility for one run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityRecord {
    /// Every day of the trailing window had positive consensus emission
    pub continuous_days_met: bool,
    /// Operator override; wins over the series when present
    #[serde(rename = "override")]
    pub override_: Option<bool>,
}

impl EligibilityRecord {
    pub fn is_eligible(&self) -> bool {
        self.override_.unwrap_or(self.continuous_days_met)
    }
}

/// Consecutive epochs each asset has spent in the naive top-N.
///
/// Absent assets count as zero.
pub type RankHistory = BTreeMap<AssetId, u32>;

/// Output of one selection round.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstituentSelection {
    /// Selected assets, by descending emission then ascending id
    pub constituents: Vec<AssetId>,
    /// History after this round, to persist for the next one
    pub rank_history: RankHistory,
}

impl ConstituentSelection {
    pub fn len(&self) -> usize {
        self.constituents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constituents.is_empty()
    }

    pub fn contains(&self, asset_id: AssetId) -> bool {
        self.constituents.contains(&asset_id)
    }
}
