//! # Epoch Schedule
//!
//! Maps instants to `epoch_id`, `rebalance_id` and anchor-aligned day buckets.
//!
//! ```text
//! anchor
//!   │<── epoch 0 ──>│<── epoch 1 ──>│ ... │<── epoch k ──>│
//!   │<──────── rebalance 0 (epochs_per_rebalance) ───────>│ ...
//! ```
//!
//! Every function is pure: same schedule and instant, same answer on every node.

use super::errors::EpochError;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use shared_types::Timestamp;

/// Seconds in one day bucket by default.
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Epoch and rebalance identifiers for one instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EpochState {
    pub epoch_id: u64,
    pub rebalance_id: u64,
}

/// Fixed anchor and period lengths defining the epoch grid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochSchedule {
    /// Start of epoch 0 and day 0.
    pub anchor: Timestamp,
    /// Length of one epoch in seconds.
    pub epoch_length_secs: u64,
    /// Consecutive epochs sharing one rebalance id.
    pub epochs_per_rebalance: u64,
    /// Length of one day bucket in seconds.
    pub day_length_secs: u64,
}

impl EpochSchedule {
    /// Create a validated schedule with the default day length.
    pub fn new(
        anchor: Timestamp,
        epoch_length_secs: u64,
        epochs_per_rebalance: u64,
    ) -> Result<Self, EpochError> {
        let schedule = Self {
            anchor,
            epoch_length_secs,
            epochs_per_rebalance,
            day_length_secs: SECONDS_PER_DAY,
        };
        schedule.validate()?;
        Ok(schedule)
    }

    /// Reject zero-length periods.
    pub fn validate(&self) -> Result<(), EpochError> {
        if self.epoch_length_secs == 0 {
            return Err(EpochError::ZeroLength {
                field: "epoch_length_secs",
            });
        }
        if self.epochs_per_rebalance == 0 {
            return Err(EpochError::ZeroLength {
                field: "epochs_per_rebalance",
            });
        }
        if self.day_length_secs == 0 {
            return Err(EpochError::ZeroLength {
                field: "day_length_secs",
            });
        }
        Ok(())
    }

    /// Whole seconds elapsed since the anchor.
    fn elapsed_secs(&self, at: Timestamp) -> Result<u64, EpochError> {
        if at < self.anchor {
            return Err(EpochError::BeforeAnchor {
                at,
                anchor: self.anchor,
            });
        }
        Ok((at - self.anchor).num_seconds().max(0) as u64)
    }

    /// Instant `units * length` seconds after the anchor.
    fn offset(&self, units: u64, length: u64) -> Result<Timestamp, EpochError> {
        let span = units
            .checked_mul(length)
            .and_then(|s| i64::try_from(s).ok())
            .and_then(Duration::try_seconds)
            .ok_or(EpochError::Overflow { id: units })?;
        self.anchor
            .checked_add_signed(span)
            .ok_or(EpochError::Overflow { id: units })
    }

    /// Epoch containing `at`.
    pub fn epoch_id(&self, at: Timestamp) -> Result<u64, EpochError> {
        Ok(self.elapsed_secs(at)? / self.epoch_length_secs)
    }

    /// Rebalance cycle containing `at`.
    pub fn rebalance_id(&self, at: Timestamp) -> Result<u64, EpochError> {
        Ok(self.rebalance_of_epoch(self.epoch_id(at)?))
    }

    /// Rebalance cycle an epoch belongs to.
    pub fn rebalance_of_epoch(&self, epoch_id: u64) -> u64 {
        epoch_id / self.epochs_per_rebalance
    }

    /// Epoch and rebalance ids for `at`.
    pub fn epoch_state(&self, at: Timestamp) -> Result<EpochState, EpochError> {
        let epoch_id = self.epoch_id(at)?;
        Ok(EpochState {
            epoch_id,
            rebalance_id: self.rebalance_of_epoch(epoch_id),
        })
    }

    /// Half-open bounds `[start, end)` of an epoch.
    pub fn epoch_bounds(&self, epoch_id: u64) -> Result<(Timestamp, Timestamp), EpochError> {
        let start = self.offset(epoch_id, self.epoch_length_secs)?;
        let end = self.offset(
            epoch_id.checked_add(1).ok_or(EpochError::Overflow { id: epoch_id })?,
            self.epoch_length_secs,
        )?;
        Ok((start, end))
    }

    /// Start of the epoch following the one containing `at`.
    pub fn next_boundary(&self, at: Timestamp) -> Result<Timestamp, EpochError> {
        let (_, end) = self.epoch_bounds(self.epoch_id(at)?)?;
        Ok(end)
    }

    /// True iff `at` falls inside `epoch_id`.
    pub fn is_epoch_active(&self, epoch_id: u64, at: Timestamp) -> bool {
        matches!(self.epoch_id(at), Ok(current) if current == epoch_id)
    }

    /// True for the first epoch of each rebalance cycle.
    pub fn is_rebalance_boundary(&self, epoch_id: u64) -> bool {
        epoch_id % self.epochs_per_rebalance == 0
    }

    /// Anchor-aligned day bucket containing `at`.
    pub fn day_index(&self, at: Timestamp) -> Result<u64, EpochError> {
        Ok(self.elapsed_secs(at)? / self.day_length_secs)
    }

    /// Half-open bounds `[start, end)` of a day bucket.
    pub fn day_bounds(&self, day: u64) -> Result<(Timestamp, Timestamp), EpochError> {
        let start = self.offset(day, self.day_length_secs)?;
        let end = self.offset(
            day.checked_add(1).ok_or(EpochError::Overflow { id: day })?,
            self.day_length_secs,
        )?;
        Ok((start, end))
    }
}
