//! Per-reporter reputation entry

use crate::config::ReputationConfig;
use serde::{Deserialize, Serialize};
use shared_types::{duration_from_secs, Timestamp};

/// Trust state of one reporter.
///
/// INVARIANT: `score` stays within `[0, 1]`.
/// INVARIANT: `suspended` implies `strikes` reached the `suspend_threshold`
/// in effect when the suspension started.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReputationEntry {
    pub score: f64,
    pub strikes: u32,
    pub suspended: bool,
    #[serde(default)]
    pub suspended_at: Option<Timestamp>,
    pub last_update: Timestamp,
}

impl ReputationEntry {
    /// Fully trusted entry for a reporter seen for the first time.
    pub fn fresh(now: Timestamp) -> Self {
        Self {
            score: 1.0,
            strikes: 0,
            suspended: false,
            suspended_at: None,
            last_update: now,
        }
    }

    /// Copy of this entry brought forward to `now`.
    ///
    /// Expires an elapsed suspension into `Active(score = 0, strikes = 0)`,
    /// then heals the score toward 1.0 for the remaining elapsed time. A
    /// suspension whose end is not representable never expires.
    pub fn refreshed(&self, config: &ReputationConfig, now: Timestamp) -> Self {
        let mut entry = self.clone();

        if entry.suspended {
            let since = entry.suspended_at.unwrap_or(entry.last_update);
            let expiry = duration_from_secs(config.suspension_secs)
                .and_then(|span| since.checked_add_signed(span));
            let Some(expiry) = expiry.filter(|expiry| now >= *expiry) else {
                return entry;
            };
            entry.score = 0.0;
            entry.strikes = 0;
            entry.suspended = false;
            entry.suspended_at = None;
            entry.last_update = expiry;
        }

        if now > entry.last_update {
            let hours = (now - entry.last_update).num_milliseconds() as f64 / 3_600_000.0;
            let retained = (1.0 - config.recovery_rate_per_hour).powf(hours);
            entry.score = clamp_score(1.0 - (1.0 - entry.score) * retained);
            entry.last_update = now;
        }

        entry
    }

    /// Stake multiplier derived from the score: `0.5 + 0.5 * score`.
    ///
    /// Suspended reporters get zero; they are excluded, not down-weighted.
    pub fn effective_stake_multiplier(&self) -> f64 {
        if self.suspended {
            return 0.0;
        }
        0.5 + 0.5 * clamp_score(self.score)
    }

    /// Invariants that hold under any configuration.
    ///
    /// Stored entries are checked with this alone, since the strike threshold
    /// in effect when a suspension started may since have been retuned.
    pub fn check_stored(&self) -> Result<(), String> {
        if !self.score.is_finite() || !(0.0..=1.0).contains(&self.score) {
            return Err(format!("score {} outside [0, 1]", self.score));
        }
        if self.suspended && self.suspended_at.is_none() {
            return Err("suspended without suspended_at".to_string());
        }
        Ok(())
    }

    /// Check the entry invariants against `config`.
    pub fn check_invariants(&self, config: &ReputationConfig) -> Result<(), String> {
        self.check_stored()?;
        if self.suspended && self.strikes < config.suspend_threshold {
            return Err(format!(
                "suspended with {} strikes, threshold {}",
                self.strikes, config.suspend_threshold
            ));
        }
        Ok(())
    }
}

pub(crate) fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, 1.0)
}
