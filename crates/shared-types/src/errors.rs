//! # Error Types
//!
//! Errors raised while validating inbound observation records.

use thiserror::Error;

/// Reasons an observation is rejected at ingestion.
///
/// Rejected observations are quarantined by the caller, never repaired.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// Schema version not supported.
    #[error("Unsupported schema version: received {received}, supported {supported}")]
    UnsupportedVersion { received: u16, supported: u16 },

    /// Reported value is negative, NaN or infinite.
    #[error("Invalid value {value} for asset {asset_id}")]
    InvalidValue { asset_id: u32, value: f64 },

    /// Declared stake is negative, NaN or infinite.
    #[error("Invalid declared stake {stake} from reporter {reporter}")]
    InvalidStake { reporter: String, stake: f64 },

    /// Reporter identity is empty.
    #[error("Empty reporter id")]
    EmptyReporter,
}
