//! Error types for the epoch clock

use shared_types::Timestamp;
use thiserror::Error;

/// Errors from epoch arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EpochError {
    /// Instant precedes the schedule anchor; no epoch covers it.
    #[error("Instant {at} precedes epoch anchor {anchor}")]
    BeforeAnchor { at: Timestamp, anchor: Timestamp },

    /// A period length was configured as zero.
    #[error("Schedule field {field} must be non-zero")]
    ZeroLength { field: &'static str },

    /// Epoch or day id too large to map back to an instant.
    #[error("Epoch arithmetic overflow for id {id}")]
    Overflow { id: u64 },
}
