//! # QI-04 Index Construction
//!
//! Turns consensus emissions into a published, tamper-evident weight set.
//!
//! **Subsystem ID:** 4  
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Pipeline
//!
//! ```text
//! daily series ──→ Eligibility Filter ──→ Constituent Selector ──→ Weight Canonicalizer
//!  (90 days)        (continuity, overrides)  (hysteresis, top N)      (bps, hash, freeze)
//! ```
//!
//! ## Invariants
//!
//! - A published `WeightSet` has exactly N entries whose basis points sum to 10 000.
//! - `content_hash` is a pure function of the canonical fields.
//! - A degenerate computation never publishes: it freezes to the prior set.

#![warn(clippy::all)]

pub mod algorithms;
pub mod config;
pub mod domain;

pub use algorithms::{
    evaluate_eligibility, is_eligible, largest_remainder_bps, rank_by_emission, select_top_n,
    to_weight_set,
};
pub use config::{EligibilityConfig, SelectionConfig};
pub use domain::{
    canonical_bytes, content_hash, CanonicalizeError, ConstituentSelection, EligibilityRecord,
    RankHistory, WeightOutcome, WeightSet, WeightsSource, TOTAL_BPS, WEIGHT_SET_SCHEMA_VERSION,
};
