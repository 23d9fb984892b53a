use crate::domain::{AuditEntry, SourceError, StoreError};
use crate::ports::outbound::{AuditLog, ObservationSource, StakeOracle, StateStore, UpdateFn};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use shared_types::{Observation, ReporterId, Timestamp};
use std::collections::BTreeMap;

/// In-memory state store for tests and single-process deployments.
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    data: RwLock<BTreeMap<String, Value>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<String> {
        self.data.read().keys().cloned().collect()
    }
}

impl StateStore for InMemoryStateStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.data.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.data.write().insert(key.to_string(), value);
        Ok(())
    }

    fn put_batch(&self, entries: Vec<(String, Value)>) -> Result<(), StoreError> {
        let mut data = self.data.write();
        for (key, value) in entries {
            data.insert(key, value);
        }
        Ok(())
    }

    fn update(&self, key: &str, f: &mut UpdateFn<'_>) -> Result<Value, StoreError> {
        let mut data = self.data.write();
        let next = f(data.get(key).cloned())?;
        data.insert(key.to_string(), next.clone());
        Ok(next)
    }
}

/// In-memory audit log.
#[derive(Debug, Default)]
pub struct InMemoryAuditLog {
    entries: RwLock<Vec<AuditEntry>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl AuditLog for InMemoryAuditLog {
    fn append(&self, entries: &[AuditEntry]) -> Result<(), StoreError> {
        self.entries.write().extend_from_slice(entries);
        Ok(())
    }
}

/// Observation source backed by a vector the caller fills.
///
/// Reports stamped after `now` have not arrived yet and are withheld.
#[derive(Debug, Default)]
pub struct InMemoryObservationSource {
    observations: RwLock<Vec<Observation>>,
}

impl InMemoryObservationSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, observation: Observation) {
        self.observations.write().push(observation);
    }

    pub fn extend(&self, observations: impl IntoIterator<Item = Observation>) {
        self.observations.write().extend(observations);
    }

    pub fn clear(&self) {
        self.observations.write().clear();
    }

    pub fn len(&self) -> usize {
        self.observations.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.read().is_empty()
    }
}

#[async_trait]
impl ObservationSource for InMemoryObservationSource {
    async fn fetch_observations(&self, now: Timestamp) -> Result<Vec<Observation>, SourceError> {
        Ok(self
            .observations
            .read()
            .iter()
            .filter(|o| o.observed_at <= now)
            .cloned()
            .collect())
    }
}

/// Stake oracle with a fixed, settable table.
#[derive(Debug, Default)]
pub struct StaticStakeOracle {
    stakes: RwLock<BTreeMap<ReporterId, f64>>,
}

impl StaticStakeOracle {
    pub fn new<I, R>(stakes: I) -> Self
    where
        I: IntoIterator<Item = (R, f64)>,
        R: Into<ReporterId>,
    {
        Self {
            stakes: RwLock::new(stakes.into_iter().map(|(r, s)| (r.into(), s)).collect()),
        }
    }

    pub fn set(&self, reporter: impl Into<ReporterId>, stake: f64) {
        self.stakes.write().insert(reporter.into(), stake);
    }

    pub fn remove(&self, reporter: &ReporterId) {
        self.stakes.write().remove(reporter);
    }
}

#[async_trait]
impl StakeOracle for StaticStakeOracle {
    async fn stakes(&self) -> Result<BTreeMap<ReporterId, f64>, SourceError> {
        Ok(self.stakes.read().clone())
    }
}
