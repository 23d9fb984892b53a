//! # Core Domain Entities
//!
//! Defines the records exchanged between the report transport, the robust
//! aggregator and the reputation ledger.
//!
//! ## Clusters
//!
//! - **Identity**: `AssetId`, `ReporterId`, `Timestamp`, duration bounds
//! - **Reports**: `Metric`, `Observation`
//! - **Feedback**: `OutlierOffense`

use crate::errors::SchemaError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// A UTC instant.
pub type Timestamp = DateTime<Utc>;

/// Largest whole-second span a `chrono` duration can hold.
pub const MAX_DURATION_SECS: u64 = i64::MAX as u64 / 1_000;

/// `secs` as a duration, `None` past [`MAX_DURATION_SECS`].
pub fn duration_from_secs(secs: u64) -> Option<Duration> {
    i64::try_from(secs).ok().and_then(Duration::try_seconds)
}

/// Integer identifier of one constituent tracked by the index.
pub type AssetId = u32;

/// Identity of a reporter node ("miner").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReporterId(pub String);

impl ReporterId {
    /// Create a reporter id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identity string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReporterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ReporterId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// =============================================================================
// CLUSTER B: REPORTS
// =============================================================================

/// Observation schema version accepted by this build.
pub const OBSERVATION_SCHEMA_VERSION: u16 = 1;

/// Which quantity an observation reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Asset price.
    Price,
    /// Per-asset daily emission / flow figure.
    Emission,
}

impl Metric {
    /// All metrics, in canonical order.
    pub const ALL: [Metric; 2] = [Metric::Price, Metric::Emission];

    /// Lowercase label used in logs and storage keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Price => "price",
            Metric::Emission => "emission",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single signed report, already authenticated by the transport layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Schema version tag.
    pub schema_version: u16,
    /// Reporting node.
    pub reporter_id: ReporterId,
    /// Asset the value refers to.
    pub asset_id: AssetId,
    /// Reported quantity.
    pub metric: Metric,
    /// Reported value (non-negative).
    pub value: f64,
    /// Stake the reporter declared for this report.
    pub declared_stake: f64,
    /// When the reporter observed the value.
    pub observed_at: Timestamp,
    /// Optional instant used for windowing instead of `observed_at`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned_at: Option<Timestamp>,
}

impl Observation {
    /// Create a current-schema observation with no pinned instant.
    pub fn new(
        reporter_id: impl Into<ReporterId>,
        asset_id: AssetId,
        metric: Metric,
        value: f64,
        declared_stake: f64,
        observed_at: Timestamp,
    ) -> Self {
        Self {
            schema_version: OBSERVATION_SCHEMA_VERSION,
            reporter_id: reporter_id.into(),
            asset_id,
            metric,
            value,
            declared_stake,
            observed_at,
            pinned_at: None,
        }
    }

    /// Pin the observation to an explicit windowing instant.
    pub fn pinned(mut self, at: Timestamp) -> Self {
        self.pinned_at = Some(at);
        self
    }

    /// Instant used for window and bucket membership.
    pub fn windowing_instant(&self) -> Timestamp {
        self.pinned_at.unwrap_or(self.observed_at)
    }

    /// Reject records this build cannot interpret.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.schema_version != OBSERVATION_SCHEMA_VERSION {
            return Err(SchemaError::UnsupportedVersion {
                received: self.schema_version,
                supported: OBSERVATION_SCHEMA_VERSION,
            });
        }
        if self.reporter_id.0.is_empty() {
            return Err(SchemaError::EmptyReporter);
        }
        if !self.value.is_finite() || self.value < 0.0 {
            return Err(SchemaError::InvalidValue {
                asset_id: self.asset_id,
                value: self.value,
            });
        }
        if !self.declared_stake.is_finite() || self.declared_stake < 0.0 {
            return Err(SchemaError::InvalidStake {
                reporter: self.reporter_id.0.clone(),
                stake: self.declared_stake,
            });
        }
        Ok(())
    }
}

impl From<String> for ReporterId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// =============================================================================
// CLUSTER C: FEEDBACK
// =============================================================================

/// An observation disqualified by the robust aggregator.
///
/// Append-only audit fact consumed by the reputation ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierOffense {
    pub reporter_id: ReporterId,
    pub asset_id: AssetId,
    pub metric: Metric,
    pub reported_value: f64,
    pub consensus_median: f64,
    /// Relative deviation from the median, as a fraction (0.25 == 25%).
    pub pct_deviation: f64,
    pub at: Timestamp,
}

impl OutlierOffense {
    /// Relative deviation expressed in basis points.
    pub fn deviation_bps(&self) -> u64 {
        if !self.pct_deviation.is_finite() || self.pct_deviation <= 0.0 {
            return 0;
        }
        (self.pct_deviation * 10_000.0).round() as u64
    }
}
