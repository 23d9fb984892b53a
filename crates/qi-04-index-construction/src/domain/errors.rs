//! Error types for index construction

use shared_types::AssetId;
use thiserror::Error;

/// Result type for index construction.
pub type Result<T> = std::result::Result<T, CanonicalizeError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CanonicalizeError {
    /// Degenerate weights and nothing to freeze to
    #[error("No prior weight set to freeze to at epoch {epoch_id}")]
    NoPriorSnapshot { epoch_id: u64 },

    /// A weight set that would break its own invariants
    #[error("Weight set invariant violated: {reason}")]
    InvariantViolation { reason: String },

    /// Negative or non-finite raw weight
    #[error("Invalid raw weight for asset {asset_id}: {value}")]
    InvalidWeight { asset_id: AssetId, value: f64 },

    /// Raw weights too large to sum in `f64`
    #[error("Raw weights sum to {total}")]
    WeightOverflow { total: f64 },

    /// Canonical form could not be encoded
    #[error("Canonical encoding failed: {0}")]
    Encoding(String),

    /// Configuration value out of range
    #[error("Invalid index configuration {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}
