//! OCC state store

use std::sync::RwLock;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::error::{CoordinatorError, Result};

use super::model::{CampaignRecord, CoordinationState, StateVersion};

/// Exclusive owner of the canonical `CoordinationState`.
///
/// `snapshot` hands out deep copies; `commit` is the one critical section in
/// the pipeline, a single indivisible check-and-replace. The lock is never
/// held across an await point.
pub struct StateStore {
    inner: RwLock<CoordinationState>,
}

impl StateStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(CoordinationState::new()),
        }
    }

    /// Seed the store with per-currency daily ceilings.
    pub fn with_spend_limits<I>(limits: I) -> Self
    where
        I: IntoIterator<Item = (String, Decimal)>,
    {
        let mut state = CoordinationState::new();
        state.spend_limits.extend(limits);
        state.version = StateVersion {
            hash: state.canonical_hash(),
            timestamp: Utc::now(),
            updated_by: "system".to_string(),
        };
        Self {
            inner: RwLock::new(state),
        }
    }

    /// Deep, mutation-isolated copy of the current state. The version hash to
    /// pass back to `commit` is `snapshot.version.hash`.
    pub fn snapshot(&self) -> CoordinationState {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Atomically replace the canonical state if it is unchanged since the
    /// caller's snapshot.
    ///
    /// On a hash mismatch the store is left untouched and `Conflict` is
    /// returned; the caller must re-snapshot and redo its modification. No
    /// merge is attempted.
    pub fn commit(
        &self,
        mut candidate: CoordinationState,
        expected_hash: &str,
        actor_id: &str,
    ) -> Result<String> {
        if expected_hash.is_empty() {
            return Err(CoordinatorError::InvalidState(
                "expected version hash is empty".to_string(),
            ));
        }

        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let current_hash = guard.version.hash.clone();
        if current_hash != expected_hash {
            debug!(
                actor = actor_id,
                expected = expected_hash,
                found = %current_hash,
                "commit rejected: version conflict"
            );
            return Err(CoordinatorError::Conflict {
                expected: expected_hash.to_string(),
                found: current_hash,
            });
        }

        let new_hash = candidate.canonical_hash();
        candidate.version = StateVersion {
            hash: new_hash.clone(),
            timestamp: Utc::now(),
            updated_by: actor_id.to_string(),
        };
        *guard = candidate;

        debug!(actor = actor_id, hash = %new_hash, "state committed");
        Ok(new_hash)
    }

    /// Read-modify-commit: register a new campaign.
    pub fn add_campaign(&self, campaign_id: &str, goal: &str, actor_id: &str) -> Result<String> {
        let snapshot = self.snapshot();
        let expected = snapshot.version.hash.clone();
        let mut candidate = snapshot;
        candidate
            .active_campaigns
            .insert(campaign_id.to_string(), CampaignRecord::new(goal));
        let hash = self.commit(candidate, &expected, actor_id)?;
        info!(campaign = campaign_id, goal, "campaign registered");
        Ok(hash)
    }

    /// Read-modify-commit: add to the accumulated daily spend for a currency.
    pub fn reserve_spend(&self, currency: &str, amount: Decimal, actor_id: &str) -> Result<String> {
        let snapshot = self.snapshot();
        let expected = snapshot.version.hash.clone();
        let mut candidate = snapshot;
        let entry = candidate
            .daily_spend
            .entry(currency.to_string())
            .or_insert(Decimal::ZERO);
        *entry += amount;
        let new_total = *entry;
        let hash = self.commit(candidate, &expected, actor_id)?;
        info!(currency, %amount, total = %new_total, "spend reserved");
        Ok(hash)
    }

    /// Read-modify-commit: set (or change) the daily ceiling for a currency.
    /// Takes effect on the next evaluation; in-flight items are not re-judged.
    pub fn set_spend_limit(&self, currency: &str, limit: Decimal, actor_id: &str) -> Result<String> {
        let snapshot = self.snapshot();
        let expected = snapshot.version.hash.clone();
        let mut candidate = snapshot;
        candidate.spend_limits.insert(currency.to_string(), limit);
        let hash = self.commit(candidate, &expected, actor_id)?;
        info!(currency, %limit, "spend limit updated");
        Ok(hash)
    }

    /// Read-modify-commit: record an agent's status label.
    pub fn set_agent_state(&self, agent_id: &str, status: &str, actor_id: &str) -> Result<String> {
        let snapshot = self.snapshot();
        let expected = snapshot.version.hash.clone();
        let mut candidate = snapshot;
        candidate
            .agent_states
            .insert(agent_id.to_string(), status.to_string());
        self.commit(candidate, &expected, actor_id)
    }

    /// Pure read: would reserving `amount` stay under the configured daily
    /// ceiling? Currencies with no configured ceiling are unbounded.
    ///
    /// Returns `(allowed, current_spend)`. Advisory only; the authoritative
    /// check is the OCC commit that reserves the spend.
    pub fn check_spend_limit(&self, currency: &str, amount: Decimal) -> (bool, Decimal) {
        let guard = self
            .inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let current = guard
            .daily_spend
            .get(currency)
            .copied()
            .unwrap_or(Decimal::ZERO);
        match guard.spend_limits.get(currency) {
            Some(limit) if current + amount > *limit => {
                warn!(
                    currency,
                    current = %current,
                    requested = %amount,
                    limit = %limit,
                    "spend limit check failed"
                );
                (false, current)
            }
            _ => (true, current),
        }
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}
