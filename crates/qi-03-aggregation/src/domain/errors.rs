//! Error types for aggregation

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AggregationError {
    /// Parameter out of its valid range
    #[error("Invalid aggregation parameter {field}: {reason}")]
    InvalidParams { field: &'static str, reason: String },
}
