//! Configuration for eligibility and constituent selection

use crate::domain::CanonicalizeError;
use serde::{Deserialize, Serialize};
use shared_types::AssetId;
use std::collections::BTreeMap;

/// Eligibility Filter settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EligibilityConfig {
    /// Trailing days that must all carry positive consensus emission
    pub required_days: usize,
    /// Operator overrides; `true` forces eligible, `false` forces ineligible
    pub overrides: BTreeMap<AssetId, bool>,
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        Self {
            required_days: 90,
            overrides: BTreeMap::new(),
        }
    }
}

impl EligibilityConfig {
    pub fn validate(&self) -> Result<(), CanonicalizeError> {
        if self.required_days == 0 {
            return Err(CanonicalizeError::InvalidConfig {
                field: "required_days",
                reason: "must be non-zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn override_for(&self, asset_id: AssetId) -> Option<bool> {
        self.overrides.get(&asset_id).copied()
    }
}

/// Constituent Selector settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Constituents per index
    pub n: usize,
    /// Fraction a challenger must out-emit the lowest incumbent by
    pub margin_pct: f64,
    /// Consecutive prior epochs in the naive top-N that admit a challenger
    pub sustain_epochs: u32,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            n: 10,
            margin_pct: 0.10,
            sustain_epochs: 3,
        }
    }
}

impl SelectionConfig {
    pub fn validate(&self) -> Result<(), CanonicalizeError> {
        if self.n == 0 {
            return Err(CanonicalizeError::InvalidConfig {
                field: "n",
                reason: "must be non-zero".to_string(),
            });
        }
        if !self.margin_pct.is_finite() || self.margin_pct < 0.0 {
            return Err(CanonicalizeError::InvalidConfig {
                field: "margin_pct",
                reason: format!("{} must be non-negative", self.margin_pct),
            });
        }
        Ok(())
    }
}
