//! # Weight Set
//!
//! The published artifact of one epoch. Immutable once sealed: every
//! constructor computes `content_hash` last, and `verify` recomputes it.

use super::canonical::{content_hash, format_weight, quantize_weight};
use super::errors::{CanonicalizeError, Result};
use chrono::SubsecRound;
use serde::{Deserialize, Serialize};
use shared_types::{AssetId, Timestamp};
use std::collections::BTreeMap;

/// Basis points in a complete weight set.
pub const TOTAL_BPS: u32 = 10_000;

/// Allowed drift of the decimal weights' sum from 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Current weight set schema.
pub const WEIGHT_SET_SCHEMA_VERSION: u16 = 1;

/// Where a weight set's weights came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightsSource {
    /// Computed from this epoch's consensus emissions
    Computed,
    /// Copied from the previous epoch after a degenerate computation
    PreviousSnapshot,
}

impl WeightsSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeightsSource::Computed => "computed",
            WeightsSource::PreviousSnapshot => "previous_snapshot",
        }
    }
}

/// Constituent weights for one epoch.
///
/// `weights` serialize as fixed-point decimal text so every copy reproduces
/// the same `content_hash`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeightSet {
    pub schema_version: u16,
    pub epoch_id: u64,
    pub as_of: Timestamp,
    #[serde(with = "decimal_weights")]
    pub weights: BTreeMap<AssetId, f64>,
    pub weights_bps: BTreeMap<AssetId, u32>,
    pub content_hash: String,
    pub frozen: bool,
    pub weights_source: WeightsSource,
}

impl WeightSet {
    /// Seal freshly computed weights.
    pub fn computed(
        epoch_id: u64,
        as_of: Timestamp,
        weights: BTreeMap<AssetId, f64>,
        weights_bps: BTreeMap<AssetId, u32>,
    ) -> Result<Self> {
        Self {
            schema_version: WEIGHT_SET_SCHEMA_VERSION,
            epoch_id,
            as_of,
            weights,
            weights_bps,
            content_hash: String::new(),
            frozen: false,
            weights_source: WeightsSource::Computed,
        }
        .seal()
    }

    /// Copy of `prior` re-issued for `epoch_id`.
    ///
    /// Weights and basis points are carried verbatim; only the epoch, the
    /// timestamp and the provenance fields change, and the hash follows them.
    pub fn frozen_from(prior: &WeightSet, epoch_id: u64, as_of: Timestamp) -> Result<Self> {
        Self {
            schema_version: WEIGHT_SET_SCHEMA_VERSION,
            epoch_id,
            as_of,
            weights: prior.weights.clone(),
            weights_bps: prior.weights_bps.clone(),
            content_hash: String::new(),
            frozen: true,
            weights_source: WeightsSource::PreviousSnapshot,
        }
        .seal()
    }

    fn seal(mut self) -> Result<Self> {
        self.as_of = self.as_of.trunc_subsecs(0);
        for weight in self.weights.values_mut() {
            *weight = quantize_weight(*weight);
        }
        self.content_hash = content_hash(&self)?;
        self.verify()?;
        Ok(self)
    }

    pub fn total_bps(&self) -> u32 {
        self.weights_bps.values().sum()
    }

    pub fn len(&self) -> usize {
        self.weights_bps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights_bps.is_empty()
    }

    pub fn constituents(&self) -> impl Iterator<Item = AssetId> + '_ {
        self.weights_bps.keys().copied()
    }

    /// Recompute the hash and check the structural invariants.
    pub fn verify(&self) -> Result<()> {
        if self.schema_version != WEIGHT_SET_SCHEMA_VERSION {
            return Err(violation(format!(
                "unsupported schema version {}",
                self.schema_version
            )));
        }
        if self.weights_bps.is_empty() {
            return Err(violation("empty weight set".to_string()));
        }
        if self.total_bps() != TOTAL_BPS {
            return Err(violation(format!(
                "basis points sum to {}, expected {}",
                self.total_bps(),
                TOTAL_BPS
            )));
        }
        if !self.weights.keys().eq(self.weights_bps.keys()) {
            return Err(violation("weights and weights_bps name different assets".to_string()));
        }
        if let Some((asset_id, weight)) = self
            .weights
            .iter()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(violation(format!("asset {asset_id} has weight {weight}")));
        }
        let weight_sum: f64 = self.weights.values().sum();
        if (weight_sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(violation(format!("weights sum to {weight_sum}, expected 1")));
        }
        if self.frozen != (self.weights_source == WeightsSource::PreviousSnapshot) {
            return Err(violation("frozen flag disagrees with weights_source".to_string()));
        }
        let expected = content_hash(self)?;
        if expected != self.content_hash {
            return Err(violation(format!(
                "content hash {} does not match canonical form {}",
                self.content_hash, expected
            )));
        }
        Ok(())
    }

    /// `verify` plus an exact constituent match against `selection`.
    pub fn verify_against(&self, selection: &[AssetId]) -> Result<()> {
        self.verify()?;
        if self.len() != selection.len()
            || !selection.iter().all(|a| self.weights_bps.contains_key(a))
        {
            return Err(violation(format!(
                "weight set names {} constituents, selection has {}",
                self.len(),
                selection.len()
            )));
        }
        Ok(())
    }
}

fn violation(reason: String) -> CanonicalizeError {
    CanonicalizeError::InvariantViolation { reason }
}

/// Outcome of canonicalization: freezing is modeled, not raised.
#[derive(Clone, Debug, PartialEq)]
pub enum WeightOutcome {
    Published(WeightSet),
    Frozen(WeightSet),
}

impl WeightOutcome {
    pub fn weight_set(&self) -> &WeightSet {
        match self {
            WeightOutcome::Published(set) | WeightOutcome::Frozen(set) => set,
        }
    }

    pub fn into_weight_set(self) -> WeightSet {
        match self {
            WeightOutcome::Published(set) | WeightOutcome::Frozen(set) => set,
        }
    }

    pub fn is_frozen(&self) -> bool {
        matches!(self, WeightOutcome::Frozen(_))
    }
}

mod decimal_weights {
    use super::format_weight;
    use serde::de::Error as _;
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serializer};
    use shared_types::AssetId;
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(
        weights: &BTreeMap<AssetId, f64>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(weights.len()))?;
        for (asset_id, weight) in weights {
            map.serialize_entry(asset_id, &format_weight(*weight))?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<AssetId, f64>, D::Error> {
        BTreeMap::<AssetId, String>::deserialize(deserializer)?
            .into_iter()
            .map(|(asset_id, text)| {
                text.parse::<f64>()
                    .map(|weight| (asset_id, weight))
                    .map_err(|e| D::Error::custom(format!("weight of asset {asset_id}: {e}")))
            })
            .collect()
    }
}
