//! # QI-05 Rebalance
//!
//! Epoch orchestrator for the index consensus core.
//!
//! **Subsystem ID:** 5  
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Pipeline (one run per epoch)
//!
//! ```text
//! clock ─→ epoch state ─→ already published? ──yes──→ stored WeightSet
//!                              │ no
//!                              ▼
//! load ledger / rank history / prior set ─→ fetch batch + stakes
//!   ─→ quarantine ─→ suspension filter ─→ rebalance quorum gate
//!   ─→ live aggregation (cached for queries) ─→ ledger feedback
//!   ─→ daily series ─→ eligibility ─→ hysteresis ─→ canonicalize
//!   ─→ invariant check ─→ audit ─→ persist
//! ```
//!
//! Runs of the same epoch are single-flight; a repeated run returns the
//! published set unchanged.
//!
//! ## Module Structure
//!
//! ```text
//! qi-05-rebalance/
//! ├── domain/     # RebalanceFailure, StoreError, audit records, storage keys
//! ├── ports/      # RebalanceApi (inbound); source, oracle, store, audit (outbound)
//! ├── adapters/   # in-memory and file-backed implementations
//! ├── service.rs  # RebalanceService
//! ├── config.rs   # RebalanceConfig
//! ├── telemetry.rs
//! └── metrics.rs  # Prometheus, behind the `metrics` feature
//! ```

#![warn(clippy::all)]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;
pub mod telemetry;

pub use adapters::{
    FileStateStore, InMemoryAuditLog, InMemoryObservationSource, InMemoryStateStore,
    JsonLinesAuditLog, StaticStakeOracle,
};
pub use config::{ConfigError, EpochConfig, RebalanceConfig};
pub use domain::{keys, AuditEntry, AuditRecord, RebalanceFailure, SourceError, StoreError};
pub use ports::inbound::RebalanceApi;
pub use ports::outbound::{AuditLog, ObservationSource, StakeOracle, StateStore};
pub use service::RebalanceService;
pub use telemetry::{init_tracing, TelemetryConfig, TelemetryError};
