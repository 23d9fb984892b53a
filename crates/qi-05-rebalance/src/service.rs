//! Rebalance Service
//!
//! Main service implementing `RebalanceApi`.

use crate::config::{ConfigError, RebalanceConfig};
use crate::domain::{keys, AuditEntry, AuditRecord, RebalanceFailure, StoreError};
use crate::metrics;
use crate::ports::inbound::RebalanceApi;
use crate::ports::outbound::{AuditLog, ObservationSource, StakeOracle, StateStore};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use qi_01_epoch_clock::{Clock, EpochSchedule, EpochState};
use qi_02_reputation::{LedgerEvent, LedgerSnapshot, ReputationEntry, ReputationLedger};
use qi_03_aggregation::{
    aggregate_batch, check_rebalance_quorum, daily_consensus_series, AggregationContext,
    ConsensusResult,
};
use qi_04_index_construction::{
    evaluate_eligibility, select_top_n, to_weight_set, RankHistory, WeightSet,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use shared_types::{AssetId, Metric, Observation, ReporterId, Timestamp};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Results of the last run, served by the read-only queries.
#[derive(Debug, Default)]
struct ServiceState {
    consensus: BTreeMap<(AssetId, Metric), ConsensusResult>,
    paused: BTreeSet<AssetId>,
}

/// Rebalance Service
///
/// Owns no durable state of its own: the ledger, rank history and weight
/// sets are loaded from the `StateStore` at the start of each run and
/// written back in one batch at the end.
///
/// Locking:
/// - one `tokio` mutex per `epoch_id` makes concurrent runs of the same
///   epoch single-flight
/// - the writer mutex orders every load-modify-persist of shared state
pub struct RebalanceService<O, S, K, A, C> {
    config: RebalanceConfig,
    schedule: EpochSchedule,
    source: O,
    oracle: S,
    store: K,
    audit: A,
    clock: C,
    state: RwLock<ServiceState>,
    flights: Mutex<HashMap<u64, Arc<tokio::sync::Mutex<()>>>>,
    writer: tokio::sync::Mutex<()>,
}

impl<O, S, K, A, C> RebalanceService<O, S, K, A, C>
where
    O: ObservationSource,
    S: StakeOracle,
    K: StateStore,
    A: AuditLog,
    C: Clock,
{
    /// Create a service over the given adapters with a validated config.
    pub fn new(
        config: RebalanceConfig,
        source: O,
        oracle: S,
        store: K,
        audit: A,
        clock: C,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let schedule = config.epoch.schedule().map_err(|e| ConfigError::Invalid {
            section: "epoch",
            reason: e.to_string(),
        })?;
        Ok(Self {
            config,
            schedule,
            source,
            oracle,
            store,
            audit,
            clock,
            state: RwLock::new(ServiceState::default()),
            flights: Mutex::new(HashMap::new()),
            writer: tokio::sync::Mutex::new(()),
        })
    }

    pub fn config(&self) -> &RebalanceConfig {
        &self.config
    }

    pub fn schedule(&self) -> &EpochSchedule {
        &self.schedule
    }

    pub fn source(&self) -> &O {
        &self.source
    }

    pub fn oracle(&self) -> &S {
        &self.oracle
    }

    pub fn store(&self) -> &K {
        &self.store
    }

    pub fn audit_log(&self) -> &A {
        &self.audit
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn flight(&self, epoch_id: u64) -> Arc<tokio::sync::Mutex<()>> {
        self.flights.lock().entry(epoch_id).or_default().clone()
    }

    // -------------------------------------------------------------------------
    // Persistence helpers
    // -------------------------------------------------------------------------

    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, RebalanceFailure> {
        match self.store.get(key)? {
            None => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| corrupt(key, e)),
        }
    }

    fn load_ledger(&self) -> Result<ReputationLedger, RebalanceFailure> {
        match self.load::<LedgerSnapshot>(keys::LEDGER)? {
            None => Ok(ReputationLedger::new(self.config.reputation.clone())),
            Some(snapshot) => {
                ReputationLedger::from_snapshot(self.config.reputation.clone(), snapshot)
                    .map_err(|e| corrupt(keys::LEDGER, e))
            }
        }
    }

    /// Load a weight set and check its hash and invariants.
    fn load_weight_set(&self, key: &str) -> Result<Option<WeightSet>, RebalanceFailure> {
        let Some(set) = self.load::<WeightSet>(key)? else {
            return Ok(None);
        };
        set.verify().map_err(|e| corrupt(key, e))?;
        Ok(Some(set))
    }

    fn append_audit(
        &self,
        run_id: Uuid,
        epoch_id: u64,
        at: Timestamp,
        records: Vec<AuditRecord>,
    ) -> Result<(), RebalanceFailure> {
        let entries: Vec<AuditEntry> = records
            .into_iter()
            .map(|record| AuditEntry {
                run_id,
                epoch_id,
                at,
                record,
            })
            .collect();
        self.audit.append(&entries)?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Pipeline stages
    // -------------------------------------------------------------------------

    /// Quarantine invalid records, drop suspended reporters, and replace
    /// declared stake with the oracle's figure.
    fn admit(
        &self,
        batch: Vec<Observation>,
        stakes: &BTreeMap<ReporterId, f64>,
        ledger: &ReputationLedger,
        now: Timestamp,
        records: &mut Vec<AuditRecord>,
    ) -> Vec<Observation> {
        let mut quarantined = 0;
        let mut suspended = 0;
        let mut admitted = Vec::with_capacity(batch.len());

        for mut obs in batch {
            if let Err(e) = obs.validate() {
                warn!(
                    reporter_id = %obs.reporter_id,
                    asset_id = obs.asset_id,
                    error = %e,
                    "Observation quarantined"
                );
                records.push(AuditRecord::Quarantined {
                    reporter_id: obs.reporter_id.clone(),
                    asset_id: obs.asset_id,
                    reason: e.to_string(),
                });
                quarantined += 1;
                continue;
            }
            if ledger.is_suspended(&obs.reporter_id, now) {
                suspended += 1;
                continue;
            }
            obs.declared_stake = oracle_stake(stakes, &obs.reporter_id);
            admitted.push(obs);
        }

        metrics::record_quarantined(quarantined);
        debug!(
            admitted = admitted.len(),
            quarantined, suspended, "Observation batch admitted"
        );
        admitted
    }

    /// One full run. Returns the weight set and whether this call committed it.
    async fn execute(
        &self,
        now: Timestamp,
        epoch: EpochState,
        run_id: Uuid,
    ) -> Result<(WeightSet, bool), RebalanceFailure> {
        let flight = self.flight(epoch.epoch_id);
        let _in_flight = flight.lock().await;
        let _writer = self.writer.lock().await;

        let epoch_key = keys::epoch_weights(epoch.epoch_id);
        if let Some(existing) = self.load_weight_set(&epoch_key)? {
            info!(
                content_hash = %existing.content_hash,
                "Epoch already published, returning stored weight set"
            );
            return Ok((existing, false));
        }

        let prior = self.load_weight_set(keys::LATEST_WEIGHTS)?;
        if let Some(prior) = &prior {
            if prior.epoch_id > epoch.epoch_id {
                return Err(RebalanceFailure::EpochRegression {
                    last: prior.epoch_id,
                    requested: epoch.epoch_id,
                });
            }
        }
        let mut ledger = self.load_ledger()?;
        let rank_history: RankHistory = self.load(keys::RANK_HISTORY)?.unwrap_or_default();
        let incumbents: BTreeSet<AssetId> = self.load(keys::CONSTITUENTS)?.unwrap_or_default();

        let stakes = self.oracle.stakes().await?;
        let batch = self.source.fetch_observations(now).await?;

        let mut records = Vec::new();
        let observations = self.admit(batch, &stakes, &ledger, now, &mut records);

        // Rebalance quorum gate
        let report = check_rebalance_quorum(
            &self.schedule,
            epoch.rebalance_id,
            &observations,
            &self.config.quorum,
        );
        let paused = report.failed_asset_ids.clone();
        metrics::set_paused_assets(paused.len());
        if !report.passed {
            warn!(
                rebalance_id = epoch.rebalance_id,
                assets = ?paused,
                fail_closed = self.config.quorum.fail_closed,
                "Assets failed rebalance quorum"
            );
            records.push(AuditRecord::QuorumFailed {
                rebalance_id: epoch.rebalance_id,
                assets: paused.clone(),
                fail_closed: self.config.quorum.fail_closed,
            });
            if self.config.quorum.fail_closed {
                self.append_audit(run_id, epoch.epoch_id, now, records)?;
                self.state.write().paused = paused.clone();
                return Err(RebalanceFailure::QuorumFailed {
                    rebalance_id: epoch.rebalance_id,
                    assets: paused,
                });
            }
        }

        // Live aggregation against one stake denominator for the whole run
        let total_known_stake: f64 = stakes
            .iter()
            .filter(|(reporter, _)| !ledger.is_suspended(reporter, now))
            .map(|(reporter, _)| oracle_stake(&stakes, reporter))
            .sum();
        let ctx = AggregationContext {
            now,
            total_known_stake,
        };
        let mut consensus = BTreeMap::new();
        let mut offenses = Vec::new();
        {
            let multiplier = |reporter: &ReporterId| ledger.effective_stake_multiplier(reporter, now);
            for metric in Metric::ALL {
                let outcome = aggregate_batch(
                    metric,
                    &observations,
                    &multiplier,
                    &self.config.aggregation,
                    &ctx,
                );
                offenses.extend(outcome.offenses);
                consensus.extend(
                    outcome
                        .results
                        .into_iter()
                        .map(|(asset_id, result)| ((asset_id, metric), result)),
                );
            }
        }
        {
            let mut state = self.state.write();
            state.consensus = consensus.clone();
            state.paused = paused.clone();
        }

        // Reputation feedback
        let events = ledger.apply_offenses(&offenses, now);
        if !offenses.is_empty() {
            warn!(
                offenses = offenses.len(),
                transitions = events.len(),
                "Outlier offenses applied to reputation ledger"
            );
        }
        metrics::record_outlier_offenses(offenses.len());
        records.extend(offenses.into_iter().map(AuditRecord::Offense));
        records.extend(events.into_iter().map(AuditRecord::Reputation));

        // Eligibility over the trailing daily series
        let series = daily_consensus_series(
            &self.schedule,
            &observations,
            now,
            self.config.eligibility.required_days,
            |reporter: &ReporterId| ledger.effective_stake_multiplier(reporter, now),
            &self.config.aggregation,
        )?;
        let eligibility = evaluate_eligibility(&series, &self.config.eligibility);
        let ranked: Vec<(AssetId, f64)> = eligibility
            .iter()
            .filter(|(asset_id, record)| record.is_eligible() && !paused.contains(*asset_id))
            .filter_map(|(asset_id, _)| {
                consensus
                    .get(&(*asset_id, Metric::Emission))
                    .map(|result| (*asset_id, result.value))
            })
            .collect();
        debug!(
            assets = eligibility.len(),
            eligible = ranked.len(),
            "Eligibility evaluated"
        );

        // Hysteresis selection and canonical weights
        let selection = select_top_n(&ranked, &incumbents, &rank_history, &self.config.selection);
        let raw_weights: BTreeMap<AssetId, f64> = ranked
            .iter()
            .filter(|(asset_id, _)| selection.contains(*asset_id))
            .copied()
            .collect();
        let outcome = to_weight_set(
            epoch.epoch_id,
            now,
            &selection.constituents,
            &raw_weights,
            self.config.selection.n,
            prior.as_ref(),
        )?;

        let check = if outcome.is_frozen() {
            outcome.weight_set().verify()
        } else {
            outcome.weight_set().verify_against(&selection.constituents)
        };
        if let Err(e) = check {
            error!(error = %e, "Weight set failed invariant check, not publishing");
            return Err(e.into());
        }
        let set = outcome.into_weight_set();

        // Audit first, then commit state in one batch
        records.push(AuditRecord::Published {
            content_hash: set.content_hash.clone(),
            frozen: set.frozen,
            constituents: set.constituents().collect(),
        });
        self.append_audit(run_id, epoch.epoch_id, now, records)?;

        let constituents: BTreeSet<AssetId> = set.constituents().collect();
        self.store.put_batch(vec![
            encode(keys::LEDGER, &ledger.snapshot())?,
            encode(keys::RANK_HISTORY, &selection.rank_history)?,
            encode(keys::CONSTITUENTS, &constituents)?,
            encode(&epoch_key, &set)?,
            encode(keys::LATEST_WEIGHTS, &set)?,
        ])?;

        info!(
            content_hash = %set.content_hash,
            frozen = set.frozen,
            constituents = set.len(),
            "Weight set published"
        );
        Ok((set, true))
    }
}

#[async_trait]
impl<O, S, K, A, C> RebalanceApi for RebalanceService<O, S, K, A, C>
where
    O: ObservationSource,
    S: StakeOracle,
    K: StateStore,
    A: AuditLog,
    C: Clock,
{
    async fn run_epoch(&self, now: Timestamp) -> Result<WeightSet, RebalanceFailure> {
        let epoch = match self.schedule.epoch_state(now) {
            Ok(epoch) => epoch,
            Err(e) => {
                metrics::record_epoch_failed("clock");
                return Err(e.into());
            }
        };
        let run_id = Uuid::new_v4();
        let span = info_span!(
            "run_epoch",
            epoch_id = epoch.epoch_id,
            rebalance_id = epoch.rebalance_id,
            %run_id
        );

        let result = self.execute(now, epoch, run_id).instrument(span.clone()).await;
        self.flights
            .lock()
            .retain(|_, flight| Arc::strong_count(flight) > 1);

        match result {
            Ok((set, committed)) => {
                if committed {
                    metrics::record_epoch_published(set.frozen);
                }
                Ok(set)
            }
            Err(e) => {
                span.in_scope(|| warn!(reason = e.label(), error = %e, "Epoch run failed"));
                metrics::record_epoch_failed(e.label());
                Err(e)
            }
        }
    }

    async fn run_current_epoch(&self) -> Result<WeightSet, RebalanceFailure> {
        self.run_epoch(self.clock.now()).await
    }

    fn consensus_value(&self, asset_id: AssetId, metric: Metric) -> Option<ConsensusResult> {
        self.state.read().consensus.get(&(asset_id, metric)).cloned()
    }

    async fn reporter_status(
        &self,
        reporter: &ReporterId,
    ) -> Result<ReputationEntry, RebalanceFailure> {
        let ledger = self.load_ledger()?;
        Ok(ledger.status(reporter, self.clock.now()))
    }

    fn paused_assets(&self) -> BTreeSet<AssetId> {
        self.state.read().paused.clone()
    }

    async fn reinstate_reporter(
        &self,
        reporter: &ReporterId,
    ) -> Result<LedgerEvent, RebalanceFailure> {
        let _writer = self.writer.lock().await;
        let now = self.clock.now();
        let epoch_id = self.schedule.epoch_id(now)?;
        let config = &self.config.reputation;

        let mut event = None;
        self.store.update(keys::LEDGER, &mut |current| {
            let mut ledger = match current {
                None => ReputationLedger::new(config.clone()),
                Some(value) => {
                    let snapshot: LedgerSnapshot =
                        serde_json::from_value(value).map_err(|e| corrupt_record(keys::LEDGER, e))?;
                    ReputationLedger::from_snapshot(config.clone(), snapshot)
                        .map_err(|e| corrupt_record(keys::LEDGER, e))?
                }
            };
            event = Some(ledger.reinstate(reporter, now));
            serde_json::to_value(ledger.snapshot()).map_err(|e| StoreError::Encode {
                key: keys::LEDGER.to_string(),
                reason: e.to_string(),
            })
        })?;

        let event = event.ok_or_else(|| RebalanceFailure::InvariantViolation {
            reason: "reinstatement produced no ledger event".to_string(),
        })?;
        self.append_audit(
            Uuid::new_v4(),
            epoch_id,
            now,
            vec![AuditRecord::Reputation(event.clone())],
        )?;
        Ok(event)
    }
}

/// Oracle stake for `reporter`; absent or invalid entries count as zero.
fn oracle_stake(stakes: &BTreeMap<ReporterId, f64>, reporter: &ReporterId) -> f64 {
    stakes
        .get(reporter)
        .copied()
        .filter(|stake| stake.is_finite() && *stake > 0.0)
        .unwrap_or(0.0)
}

fn corrupt(key: &str, e: impl Display) -> RebalanceFailure {
    error!(key, error = %e, "Persisted state failed validation");
    RebalanceFailure::CorruptState {
        key: key.to_string(),
        reason: e.to_string(),
    }
}

fn corrupt_record(key: &str, e: impl Display) -> StoreError {
    StoreError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    }
}

fn encode<T: Serialize>(key: &str, value: &T) -> Result<(String, Value), RebalanceFailure> {
    serde_json::to_value(value)
        .map(|value| (key.to_string(), value))
        .map_err(|e| {
            StoreError::Encode {
                key: key.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
}
