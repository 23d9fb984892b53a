//! # Index Construction Algorithms
//!
//! - `eligibility`: trailing-window continuity check with overrides
//! - `hysteresis`: incumbency-biased top-N selection
//! - `canonicalizer`: largest-remainder basis points and freeze-to-prior

pub mod canonicalizer;
pub mod eligibility;
pub mod hysteresis;

pub use canonicalizer::{largest_remainder_bps, to_weight_set};
pub use eligibility::{evaluate_eligibility, is_eligible};
pub use hysteresis::{rank_by_emission, select_top_n};
