//! Domain module for index construction
//!
//! Eligibility records, constituent selections, weight sets and their
//! canonical encoding.

pub mod canonical;
pub mod entities;
pub mod errors;
pub mod weight_set;

pub use canonical::{canonical_bytes, content_hash};
pub use entities::*;
pub use errors::*;
pub use weight_set::*;
