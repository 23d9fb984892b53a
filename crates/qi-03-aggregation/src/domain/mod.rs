//! Domain module for aggregation
//!
//! Contains the consensus result types and errors.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
