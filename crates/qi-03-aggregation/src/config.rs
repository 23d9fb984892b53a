//! Configuration for aggregation and the rebalance quorum gate

use crate::domain::AggregationError;
use serde::{Deserialize, Serialize};
use shared_types::MAX_DURATION_SECS;

/// Per-run robust aggregation parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationParams {
    /// Width of the live window ending at `now` (seconds)
    pub window_secs: u64,
    /// Observations older than this are stale (seconds)
    pub stale_after_secs: u64,
    /// MAD multiplier beyond which an observation is an outlier
    pub outlier_k: f64,
    /// Maximum relative deviation from the median
    pub band_pct: f64,
    /// Minimum surviving coverage for the window result to stand
    pub quorum_threshold: f64,
}

impl Default for AggregationParams {
    fn default() -> Self {
        Self {
            window_secs: 3_600,
            stale_after_secs: 7_200,
            outlier_k: 5.0,
            band_pct: 0.20,
            quorum_threshold: 0.33,
        }
    }
}

impl AggregationParams {
    pub fn validate(&self) -> Result<(), AggregationError> {
        if self.window_secs == 0 {
            return Err(AggregationError::InvalidParams {
                field: "window_secs",
                reason: "must be non-zero".to_string(),
            });
        }
        for (field, secs) in [
            ("window_secs", self.window_secs),
            ("stale_after_secs", self.stale_after_secs),
        ] {
            if secs > MAX_DURATION_SECS {
                return Err(AggregationError::InvalidParams {
                    field,
                    reason: format!("{secs} exceeds {MAX_DURATION_SECS}"),
                });
            }
        }
        if !self.outlier_k.is_finite() || self.outlier_k <= 0.0 {
            return Err(AggregationError::InvalidParams {
                field: "outlier_k",
                reason: format!("{} must be positive", self.outlier_k),
            });
        }
        if !self.band_pct.is_finite() || self.band_pct <= 0.0 {
            return Err(AggregationError::InvalidParams {
                field: "band_pct",
                reason: format!("{} must be positive", self.band_pct),
            });
        }
        if !(0.0..=1.0).contains(&self.quorum_threshold) {
            return Err(AggregationError::InvalidParams {
                field: "quorum_threshold",
                reason: format!("{} outside [0, 1]", self.quorum_threshold),
            });
        }
        Ok(())
    }
}

/// Rebalance quorum gate settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuorumGateConfig {
    /// Share of an asset's total stake that must report in this rebalance
    pub quorum_fraction: f64,
    /// Abort the whole rebalance if any asset fails
    pub fail_closed: bool,
}

impl Default for QuorumGateConfig {
    fn default() -> Self {
        Self {
            quorum_fraction: 0.5,
            fail_closed: false,
        }
    }
}

impl QuorumGateConfig {
    pub fn validate(&self) -> Result<(), AggregationError> {
        if !(0.0..=1.0).contains(&self.quorum_fraction) {
            return Err(AggregationError::InvalidParams {
                field: "quorum_fraction",
                reason: format!("{} outside [0, 1]", self.quorum_fraction),
            });
        }
        Ok(())
    }
}
