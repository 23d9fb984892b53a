//! # Shared Types Crate
//!
//! This crate contains the identifiers, the versioned `Observation` schema and
//! the `OutlierOffense` audit fact shared by every subsystem of the index
//! consensus core.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **Closed Schema**: Observations carry a `schema_version`; unknown versions
//!   are rejected, never best-effort parsed.
//! - **Read-Only Inputs**: Observations are immutable once ingested for a batch.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
