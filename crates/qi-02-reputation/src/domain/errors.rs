//! Error types for the reputation ledger

use shared_types::ReporterId;
use thiserror::Error;

/// Reputation ledger errors.
///
/// Every variant is fatal for an epoch run: the core never proceeds with an
/// un-auditable reputation state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReputationError {
    /// Configuration value out of range
    #[error("Invalid reputation config: {field} {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// Persisted snapshot carries an unknown schema version
    #[error("Unsupported ledger snapshot version {found}, expected {expected}")]
    UnsupportedSnapshot { found: u16, expected: u16 },

    /// Persisted entry violates a ledger invariant
    #[error("Corrupt reputation entry for {reporter}: {reason}")]
    CorruptEntry { reporter: ReporterId, reason: String },
}
