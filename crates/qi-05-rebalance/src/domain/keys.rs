//! Storage key layout

/// Reputation ledger snapshot
pub const LEDGER: &str = "reputation/ledger";

/// Consecutive-epochs-in-top-N counters
pub const RANK_HISTORY: &str = "selection/rank_history";

/// Constituents of the last published weight set
pub const CONSTITUENTS: &str = "selection/constituents";

/// Most recently published weight set
pub const LATEST_WEIGHTS: &str = "weights/latest";

/// Weight set published for `epoch_id`.
pub fn epoch_weights(epoch_id: u64) -> String {
    format!("weights/epoch/{epoch_id}")
}
