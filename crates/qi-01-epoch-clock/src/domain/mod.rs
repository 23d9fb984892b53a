//! Domain module for the epoch clock.

pub mod errors;
pub mod schedule;

pub use errors::*;
pub use schedule::*;
