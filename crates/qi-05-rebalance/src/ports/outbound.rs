//! Outbound Ports (Driven Ports / SPI)

use crate::domain::{AuditEntry, SourceError, StoreError};
use async_trait::async_trait;
use serde_json::Value;
use shared_types::{Observation, ReporterId, Timestamp};
use std::collections::BTreeMap;

/// Authenticated observations from the report transport.
///
/// The batch covers at least the eligibility look-back, so the daily series
/// can be rebuilt from it.
#[async_trait]
pub trait ObservationSource: Send + Sync {
    async fn fetch_observations(&self, now: Timestamp) -> Result<Vec<Observation>, SourceError>;
}

/// Current stake per reporter. Absent reporters have zero stake.
#[async_trait]
pub trait StakeOracle: Send + Sync {
    async fn stakes(&self) -> Result<BTreeMap<ReporterId, f64>, SourceError>;
}

/// Read-modify-write closure passed to [`StateStore::update`].
pub type UpdateFn<'a> = dyn FnMut(Option<Value>) -> Result<Value, StoreError> + 'a;

/// Key-value persistence for ledger, rank history and weight sets.
///
/// Each call is atomic with respect to every other call on the same store,
/// across processes for file-backed implementations.
pub trait StateStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    fn put(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Write several keys at once; all or nothing.
    fn put_batch(&self, entries: Vec<(String, Value)>) -> Result<(), StoreError>;

    /// Replace the value at `key` with `f(current)` under exclusive access.
    fn update(&self, key: &str, f: &mut UpdateFn<'_>) -> Result<Value, StoreError>;
}

/// Append-only audit trail.
pub trait AuditLog: Send + Sync {
    fn append(&self, entries: &[AuditEntry]) -> Result<(), StoreError>;
}
