//! Configuration for the rebalance orchestrator
//!
//! Every tunable constant of the pipeline lives here, grouped by subsystem.
//! Missing sections and fields fall back to their defaults.

use chrono::DateTime;
use qi_01_epoch_clock::{EpochError, EpochSchedule, SECONDS_PER_DAY};
use qi_02_reputation::ReputationConfig;
use qi_03_aggregation::{AggregationParams, QuorumGateConfig};
use qi_04_index_construction::{EligibilityConfig, SelectionConfig};
use serde::{Deserialize, Serialize};
use shared_types::Timestamp;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid {section} config: {reason}")]
    Invalid {
        section: &'static str,
        reason: String,
    },
}

/// Epoch grid settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpochConfig {
    /// Start of epoch 0 and day 0
    pub anchor: Timestamp,
    pub epoch_length_secs: u64,
    pub epochs_per_rebalance: u64,
    pub day_length_secs: u64,
}

impl Default for EpochConfig {
    fn default() -> Self {
        Self {
            // 2024-01-01T00:00:00Z
            anchor: DateTime::from_timestamp(1_704_067_200, 0).unwrap_or_default(),
            epoch_length_secs: SECONDS_PER_DAY,
            epochs_per_rebalance: 7,
            day_length_secs: SECONDS_PER_DAY,
        }
    }
}

impl EpochConfig {
    pub fn schedule(&self) -> Result<EpochSchedule, EpochError> {
        let schedule = EpochSchedule {
            anchor: self.anchor,
            epoch_length_secs: self.epoch_length_secs,
            epochs_per_rebalance: self.epochs_per_rebalance,
            day_length_secs: self.day_length_secs,
        };
        schedule.validate()?;
        Ok(schedule)
    }
}

/// Complete orchestrator configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RebalanceConfig {
    pub epoch: EpochConfig,
    pub aggregation: AggregationParams,
    pub quorum: QuorumGateConfig,
    pub reputation: ReputationConfig,
    pub eligibility: EligibilityConfig,
    pub selection: SelectionConfig,
}

impl RebalanceConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Reject out-of-range values in any section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.epoch.schedule().map_err(|e| invalid("epoch", e))?;
        self.aggregation
            .validate()
            .map_err(|e| invalid("aggregation", e))?;
        self.quorum.validate().map_err(|e| invalid("quorum", e))?;
        self.reputation
            .validate()
            .map_err(|e| invalid("reputation", e))?;
        self.eligibility
            .validate()
            .map_err(|e| invalid("eligibility", e))?;
        self.selection
            .validate()
            .map_err(|e| invalid("selection", e))?;
        Ok(())
    }
}

fn invalid(section: &'static str, error: impl std::fmt::Display) -> ConfigError {
    ConfigError::Invalid {
        section,
        reason: error.to_string(),
    }
}
