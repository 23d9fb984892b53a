//! # Rebalance Metrics
//!
//! Prometheus metrics for monitoring epoch runs.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! qi-05-rebalance = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `qi_epochs_published_total` - Counter of weight sets published from fresh weights
//! - `qi_epochs_frozen_total` - Counter of weight sets frozen to the previous snapshot
//! - `qi_epochs_failed_total` - Counter of failed runs (by reason)
//! - `qi_outlier_offenses_total` - Counter of outlier offenses fed to the ledger
//! - `qi_quarantined_observations_total` - Counter of observations failing validation
//! - `qi_paused_assets` - Gauge of assets paused by the rebalance quorum gate

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_gauge, register_int_counter, register_int_counter_vec, Gauge, IntCounter,
    IntCounterVec,
};

#[cfg(feature = "metrics")]
lazy_static! {
    pub static ref EPOCHS_PUBLISHED: IntCounter = register_int_counter!(
        "qi_epochs_published_total",
        "Total number of weight sets published from fresh weights"
    )
    .expect("Failed to create EPOCHS_PUBLISHED metric");

    pub static ref EPOCHS_FROZEN: IntCounter = register_int_counter!(
        "qi_epochs_frozen_total",
        "Total number of weight sets frozen to the previous snapshot"
    )
    .expect("Failed to create EPOCHS_FROZEN metric");

    /// Failed runs, labeled by reason
    pub static ref EPOCHS_FAILED: IntCounterVec = register_int_counter_vec!(
        "qi_epochs_failed_total",
        "Total number of failed epoch runs",
        &["reason"]
    )
    .expect("Failed to create EPOCHS_FAILED metric");

    pub static ref OUTLIER_OFFENSES: IntCounter = register_int_counter!(
        "qi_outlier_offenses_total",
        "Total number of outlier offenses fed to the reputation ledger"
    )
    .expect("Failed to create OUTLIER_OFFENSES metric");

    pub static ref QUARANTINED_OBSERVATIONS: IntCounter = register_int_counter!(
        "qi_quarantined_observations_total",
        "Total number of observations quarantined by schema validation"
    )
    .expect("Failed to create QUARANTINED_OBSERVATIONS metric");

    pub static ref PAUSED_ASSETS: Gauge = register_gauge!(
        "qi_paused_assets",
        "Assets paused by the rebalance quorum gate in the last run"
    )
    .expect("Failed to create PAUSED_ASSETS metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

/// Record a committed weight set
#[cfg(feature = "metrics")]
pub fn record_epoch_published(frozen: bool) {
    if frozen {
        EPOCHS_FROZEN.inc();
    } else {
        EPOCHS_PUBLISHED.inc();
    }
}

#[cfg(feature = "metrics")]
pub fn record_epoch_failed(reason: &str) {
    EPOCHS_FAILED.with_label_values(&[reason]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_outlier_offenses(count: usize) {
    OUTLIER_OFFENSES.inc_by(count as u64);
}

#[cfg(feature = "metrics")]
pub fn record_quarantined(count: usize) {
    QUARANTINED_OBSERVATIONS.inc_by(count as u64);
}

#[cfg(feature = "metrics")]
pub fn set_paused_assets(count: usize) {
    PAUSED_ASSETS.set(count as f64);
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_epoch_published(_frozen: bool) {}

#[cfg(not(feature = "metrics"))]
pub fn record_epoch_failed(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_outlier_offenses(_count: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn record_quarantined(_count: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn set_paused_assets(_count: usize) {}
