//! # QI-01 Epoch Clock
//!
//! Clock/Epoch Authority for the index consensus core.
//!
//! **Subsystem ID:** 1  
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Pure functions from a wall-clock instant to:
//! - `epoch_id`: one index-rebalancing cycle step, from a fixed anchor and period
//! - `rebalance_id`: groups `epochs_per_rebalance` consecutive epochs
//! - `day_index`: anchor-aligned day buckets used by the eligibility filter
//!
//! Nothing here holds state except the injectable [`Clock`] adapters.
//!
//! ## Module Structure
//!
//! ```text
//! qi-01-epoch-clock/
//! ├── domain/     # EpochSchedule, EpochState, EpochError
//! ├── ports/      # Clock trait
//! └── adapters/   # SystemClock, ManualClock
//! ```

#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::{ManualClock, SystemClock};
pub use domain::{EpochError, EpochSchedule, EpochState, SECONDS_PER_DAY};
pub use ports::Clock;
