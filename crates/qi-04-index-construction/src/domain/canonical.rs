//! # Canonical Encoding
//!
//! The byte string a weight set's `content_hash` commits to.
//!
//! ```text
//! {"schema_version":1,"epoch_id":42,"as_of":"2024-03-01T00:00:00Z",
//!  "weights":{"3":"0.250000000000",...},"weights_bps":{"3":2500,...},
//!  "frozen":false,"weights_source":"computed"}
//! ```
//!
//! Field order is fixed by the struct, map keys are sorted, fractions are
//! fixed-point text and the timestamp has whole-second precision, so the
//! bytes depend only on the logical content.

use super::errors::{CanonicalizeError, Result};
use super::weight_set::{WeightSet, WeightsSource};
use chrono::SecondsFormat;
use serde::Serialize;
use sha2::{Digest, Sha256};
use shared_types::AssetId;
use std::collections::BTreeMap;

/// Decimal places carried by a weight fraction.
pub const WEIGHT_DECIMALS: usize = 12;

#[derive(Serialize)]
struct CanonicalForm<'a> {
    schema_version: u16,
    epoch_id: u64,
    as_of: String,
    weights: BTreeMap<AssetId, String>,
    weights_bps: &'a BTreeMap<AssetId, u32>,
    frozen: bool,
    weights_source: WeightsSource,
}

/// Fixed-point text of a weight fraction.
pub fn format_weight(weight: f64) -> String {
    // -0.0 and 0.0 must encode identically
    let weight = if weight == 0.0 { 0.0 } else { weight };
    format!("{:.*}", WEIGHT_DECIMALS, weight)
}

/// Round a weight to the precision it is published with.
pub(crate) fn quantize_weight(weight: f64) -> f64 {
    format_weight(weight).parse().unwrap_or(weight)
}

/// Canonical bytes of everything in `set` except its hash.
pub fn canonical_bytes(set: &WeightSet) -> Result<Vec<u8>> {
    let form = CanonicalForm {
        schema_version: set.schema_version,
        epoch_id: set.epoch_id,
        as_of: set.as_of.to_rfc3339_opts(SecondsFormat::Secs, true),
        weights: set
            .weights
            .iter()
            .map(|(asset_id, weight)| (*asset_id, format_weight(*weight)))
            .collect(),
        weights_bps: &set.weights_bps,
        frozen: set.frozen,
        weights_source: set.weights_source,
    };
    serde_json::to_vec(&form).map_err(|e| CanonicalizeError::Encoding(e.to_string()))
}

/// Hex-encoded SHA-256 of the canonical bytes.
pub fn content_hash(set: &WeightSet) -> Result<String> {
    let bytes = canonical_bytes(set)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}
