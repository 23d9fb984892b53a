//! # Adapters Layer (Hexagonal Architecture)
//!
//! Concrete [`Clock`](crate::ports::Clock) implementations.

mod clock;

pub use clock::{ManualClock, SystemClock};
