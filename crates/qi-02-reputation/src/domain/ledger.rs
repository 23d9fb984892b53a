//! # Reputation Ledger
//!
//! Applies the feedback rules to outlier offenses and answers stake-multiplier
//! queries for the aggregator.
//!
//! ## Transition Rules
//!
//! | Deviation | Effect |
//! |-----------|--------|
//! | `>= hard_threshold_bps` | `strikes += 1`, `score -= min(hard_penalty, cap)` |
//! | `[soft, hard)` bps | `score -= min(soft_penalty, cap * 0.25)` |
//! | `< soft_threshold_bps` | none |
//!
//! `strikes >= suspend_threshold` moves the reporter to SUSPENDED.

use super::entry::{clamp_score, ReputationEntry};
use super::errors::ReputationError;
use crate::config::ReputationConfig;
use serde::{Deserialize, Serialize};
use shared_types::{OutlierOffense, ReporterId, Timestamp};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Persisted ledger schema version.
pub const LEDGER_SNAPSHOT_VERSION: u16 = 1;

/// What the ledger did in response to an offense or admin action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LedgerEvent {
    pub reporter_id: ReporterId,
    pub kind: LedgerEventKind,
    pub at: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEventKind {
    /// Soft offense, score lowered
    SoftPenalty { score: f64 },
    /// Hard offense, score lowered and strike added
    HardStrike { score: f64, strikes: u32 },
    /// Strike threshold reached
    Suspended { strikes: u32 },
    /// Admin action returned the reporter to active duty
    Reinstated,
}

/// Serialisable form of the ledger.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub version: u16,
    pub entries: BTreeMap<ReporterId, ReputationEntry>,
}

/// Per-reporter trust scores, strikes and suspensions.
#[derive(Clone, Debug)]
pub struct ReputationLedger {
    config: ReputationConfig,
    entries: BTreeMap<ReporterId, ReputationEntry>,
}

impl ReputationLedger {
    pub fn new(config: ReputationConfig) -> Self {
        Self {
            config,
            entries: BTreeMap::new(),
        }
    }

    /// Restore a ledger, rejecting unknown versions and entries that are
    /// invalid under any configuration.
    ///
    /// Suspensions recorded under an earlier `suspend_threshold` are kept as
    /// they are and expire on their original schedule.
    pub fn from_snapshot(
        config: ReputationConfig,
        snapshot: LedgerSnapshot,
    ) -> Result<Self, ReputationError> {
        if snapshot.version != LEDGER_SNAPSHOT_VERSION {
            return Err(ReputationError::UnsupportedSnapshot {
                found: snapshot.version,
                expected: LEDGER_SNAPSHOT_VERSION,
            });
        }
        for (reporter, entry) in &snapshot.entries {
            entry
                .check_stored()
                .map_err(|reason| ReputationError::CorruptEntry {
                    reporter: reporter.clone(),
                    reason,
                })?;
        }
        Ok(Self {
            config,
            entries: snapshot.entries,
        })
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            version: LEDGER_SNAPSHOT_VERSION,
            entries: self.entries.clone(),
        }
    }

    pub fn config(&self) -> &ReputationConfig {
        &self.config
    }

    /// Number of reporters with an entry.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read-only status view of a reporter as of `now`.
    ///
    /// Unknown reporters are reported as fully trusted.
    pub fn status(&self, reporter: &ReporterId, now: Timestamp) -> ReputationEntry {
        match self.entries.get(reporter) {
            Some(entry) => entry.refreshed(&self.config, now),
            None => ReputationEntry::fresh(now),
        }
    }

    /// Stake multiplier for `reporter` as of `now`.
    pub fn effective_stake_multiplier(&self, reporter: &ReporterId, now: Timestamp) -> f64 {
        self.status(reporter, now).effective_stake_multiplier()
    }

    pub fn is_suspended(&self, reporter: &ReporterId, now: Timestamp) -> bool {
        self.status(reporter, now).suspended
    }

    /// Bring every entry forward to `now` (decay and suspension expiry).
    pub fn refresh_all(&mut self, now: Timestamp) {
        for entry in self.entries.values_mut() {
            *entry = entry.refreshed(&self.config, now);
        }
    }

    /// Refreshed mutable entry, created on first sight.
    fn entry_mut(&mut self, reporter: &ReporterId, now: Timestamp) -> &mut ReputationEntry {
        let config = &self.config;
        let entry = self
            .entries
            .entry(reporter.clone())
            .or_insert_with(|| ReputationEntry::fresh(now));
        *entry = entry.refreshed(config, now);
        entry
    }

    /// Apply the transition rules for one offense.
    pub fn apply_offense(&mut self, offense: &OutlierOffense, now: Timestamp) -> Vec<LedgerEvent> {
        let deviation_bps = offense.deviation_bps();
        let soft_threshold = self.config.soft_threshold_bps;
        let hard_threshold = self.config.hard_threshold_bps;
        let soft_penalty = self.config.capped_soft_penalty();
        let hard_penalty = self.config.capped_hard_penalty();
        let suspend_threshold = self.config.suspend_threshold;

        let reporter = offense.reporter_id.clone();
        let entry = self.entry_mut(&reporter, now);
        let mut events = Vec::new();

        if entry.suspended {
            debug!(reporter_id = %reporter, "Offense against suspended reporter ignored");
            return events;
        }

        if deviation_bps >= hard_threshold {
            entry.strikes = entry.strikes.saturating_add(1);
            entry.score = clamp_score(entry.score - hard_penalty);
            events.push(LedgerEvent {
                reporter_id: reporter.clone(),
                kind: LedgerEventKind::HardStrike {
                    score: entry.score,
                    strikes: entry.strikes,
                },
                at: now,
            });
        } else if deviation_bps >= soft_threshold {
            entry.score = clamp_score(entry.score - soft_penalty);
            events.push(LedgerEvent {
                reporter_id: reporter.clone(),
                kind: LedgerEventKind::SoftPenalty { score: entry.score },
                at: now,
            });
        } else {
            return events;
        }

        if entry.strikes >= suspend_threshold {
            entry.suspended = true;
            entry.suspended_at = Some(now);
            warn!(
                reporter_id = %reporter,
                strikes = entry.strikes,
                "Reporter suspended"
            );
            events.push(LedgerEvent {
                reporter_id: reporter,
                kind: LedgerEventKind::Suspended {
                    strikes: entry.strikes,
                },
                at: now,
            });
        }

        events
    }

    /// Apply a batch of offenses in order.
    pub fn apply_offenses<'a, I>(&mut self, offenses: I, now: Timestamp) -> Vec<LedgerEvent>
    where
        I: IntoIterator<Item = &'a OutlierOffense>,
    {
        offenses
            .into_iter()
            .flat_map(|offense| self.apply_offense(offense, now))
            .collect()
    }

    /// Admin action: lift a suspension and reset to `Active(score = 0, strikes = 0)`.
    pub fn reinstate(&mut self, reporter: &ReporterId, now: Timestamp) -> LedgerEvent {
        let entry = self.entry_mut(reporter, now);
        entry.score = 0.0;
        entry.strikes = 0;
        entry.suspended = false;
        entry.suspended_at = None;
        entry.last_update = now;
        info!(reporter_id = %reporter, "Reporter reinstated by operator");
        LedgerEvent {
            reporter_id: reporter.clone(),
            kind: LedgerEventKind::Reinstated,
            at: now,
        }
    }

    /// Iterate stored entries (not refreshed).
    pub fn entries(&self) -> impl Iterator<Item = (&ReporterId, &ReputationEntry)> {
        self.entries.iter()
    }
}
