//! Configuration for the reputation ledger

use crate::domain::ReputationError;
use serde::{Deserialize, Serialize};
use shared_types::MAX_DURATION_SECS;

/// Feedback-loop tuning.
///
/// These constants have no principled derivation; they are preserved as
/// configuration rather than inferred.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReputationConfig {
    /// Deviation (bps) at which an offense starts costing score
    pub soft_threshold_bps: u64,
    /// Deviation (bps) at which an offense also adds a strike
    pub hard_threshold_bps: u64,
    /// Score lost per soft offense
    pub soft_penalty: f64,
    /// Score lost per hard offense
    pub hard_penalty: f64,
    /// Upper bound on any single penalty
    pub max_penalty_cap: f64,
    /// Strikes that trigger suspension
    pub suspend_threshold: u32,
    /// Suspension length before automatic reinstatement (seconds)
    pub suspension_secs: u64,
    /// Fraction of the remaining gap to 1.0 recovered per hour
    pub recovery_rate_per_hour: f64,
}

impl Default for ReputationConfig {
    fn default() -> Self {
        Self {
            soft_threshold_bps: 500,
            hard_threshold_bps: 2_000,
            soft_penalty: 0.05,
            hard_penalty: 0.20,
            max_penalty_cap: 0.25,
            suspend_threshold: 3,
            suspension_secs: 86_400,
            recovery_rate_per_hour: 0.02,
        }
    }
}

impl ReputationConfig {
    pub fn validate(&self) -> Result<(), ReputationError> {
        if self.soft_threshold_bps > self.hard_threshold_bps {
            return Err(ReputationError::InvalidConfig {
                field: "soft_threshold_bps",
                reason: format!("exceeds hard threshold {}", self.hard_threshold_bps),
            });
        }
        for (field, value) in [
            ("soft_penalty", self.soft_penalty),
            ("hard_penalty", self.hard_penalty),
            ("max_penalty_cap", self.max_penalty_cap),
            ("recovery_rate_per_hour", self.recovery_rate_per_hour),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ReputationError::InvalidConfig {
                    field,
                    reason: format!("{value} outside [0, 1]"),
                });
            }
        }
        if self.suspend_threshold == 0 {
            return Err(ReputationError::InvalidConfig {
                field: "suspend_threshold",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.suspension_secs > MAX_DURATION_SECS {
            return Err(ReputationError::InvalidConfig {
                field: "suspension_secs",
                reason: format!("{} exceeds {MAX_DURATION_SECS}", self.suspension_secs),
            });
        }
        Ok(())
    }

    /// Effective soft penalty after capping.
    pub fn capped_soft_penalty(&self) -> f64 {
        self.soft_penalty.min(self.max_penalty_cap * 0.25)
    }

    /// Effective hard penalty after capping.
    pub fn capped_hard_penalty(&self) -> f64 {
        self.hard_penalty.min(self.max_penalty_cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReputationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.capped_soft_penalty(), 0.05);
        assert_eq!(config.capped_hard_penalty(), 0.20);
    }

    #[test]
    fn test_caps_apply() {
        let config = ReputationConfig {
            soft_penalty: 0.5,
            hard_penalty: 0.9,
            max_penalty_cap: 0.4,
            ..Default::default()
        };
        assert!((config.capped_soft_penalty() - 0.1).abs() < 1e-12);
        assert!((config.capped_hard_penalty() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_inverted_thresholds() {
        let config = ReputationConfig {
            soft_threshold_bps: 3_000,
            hard_threshold_bps: 1_000,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ReputationError::InvalidConfig {
                field: "soft_threshold_bps",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_unrepresentable_suspension() {
        let config = ReputationConfig {
            suspension_secs: u64::MAX,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ReputationError::InvalidConfig {
                field: "suspension_secs",
                ..
            })
        ));
    }
}
