//! Coordination state model and canonical hashing

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Campaign lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Active,
    Paused,
    Completed,
    Cancelled,
}

/// One campaign tracked in the coordination state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignRecord {
    pub goal: String,
    pub status: CampaignStatus,
    pub created_at: DateTime<Utc>,
}

impl CampaignRecord {
    pub fn new(goal: impl Into<String>) -> Self {
        Self {
            goal: goal.into(),
            status: CampaignStatus::Active,
            created_at: Utc::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == CampaignStatus::Active
    }
}

/// Version stamp mutated only by `StateStore` on a successful commit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateVersion {
    pub hash: String,
    pub timestamp: DateTime<Utc>,
    pub updated_by: String,
}

/// The shared state every loop coordinates through.
///
/// Maps are `BTreeMap` so the serialized form is key-sorted: two states with
/// identical field values hash identically regardless of mutation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinationState {
    pub active_campaigns: BTreeMap<String, CampaignRecord>,
    pub daily_spend: BTreeMap<String, Decimal>,
    pub spend_limits: BTreeMap<String, Decimal>,
    pub agent_states: BTreeMap<String, String>,
    pub version: StateVersion,
}

/// Borrowed view over every hashed field, in fixed order. `version` is
/// excluded so the digest is a pure function of the payload fields.
#[derive(Serialize)]
struct HashedFields<'a> {
    active_campaigns: &'a BTreeMap<String, CampaignRecord>,
    daily_spend: &'a BTreeMap<String, Decimal>,
    spend_limits: &'a BTreeMap<String, Decimal>,
    agent_states: &'a BTreeMap<String, String>,
}

impl CoordinationState {
    pub fn new() -> Self {
        let mut state = Self {
            active_campaigns: BTreeMap::new(),
            daily_spend: BTreeMap::new(),
            spend_limits: BTreeMap::new(),
            agent_states: BTreeMap::new(),
            version: StateVersion {
                hash: String::new(),
                timestamp: Utc::now(),
                updated_by: "system".to_string(),
            },
        };
        state.version.hash = state.canonical_hash();
        state
    }

    /// Deterministic digest over the canonical (key-sorted) serialization of
    /// every field except `version`.
    pub fn canonical_hash(&self) -> String {
        let view = HashedFields {
            active_campaigns: &self.active_campaigns,
            daily_spend: &self.daily_spend,
            spend_limits: &self.spend_limits,
            agent_states: &self.agent_states,
        };
        let encoded =
            serde_json::to_vec(&view).expect("coordination state always serializes to JSON");
        hex::encode(Sha256::digest(&encoded))
    }

    /// Accumulated spend for a currency (zero if untracked)
    pub fn spend(&self, currency: &str) -> Decimal {
        self.daily_spend
            .get(currency)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}

impl Default for CoordinationState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_hash_is_insertion_order_independent() {
        let mut a = CoordinationState::new();
        a.daily_spend.insert("USDC".to_string(), dec!(10));
        a.daily_spend.insert("ETH".to_string(), dec!(1));
        a.agent_states
            .insert("worker-0".to_string(), "idle".to_string());
        a.agent_states
            .insert("worker-1".to_string(), "busy".to_string());

        let mut b = CoordinationState::new();
        b.agent_states
            .insert("worker-1".to_string(), "busy".to_string());
        b.agent_states
            .insert("worker-0".to_string(), "idle".to_string());
        b.daily_spend.insert("ETH".to_string(), dec!(1));
        b.daily_spend.insert("USDC".to_string(), dec!(10));

        assert_eq!(a.canonical_hash(), b.canonical_hash());
    }

    #[test]
    fn test_hash_excludes_version() {
        let mut state = CoordinationState::new();
        let before = state.canonical_hash();
        state.version.updated_by = "someone-else".to_string();
        assert_eq!(before, state.canonical_hash());

        state.daily_spend.insert("USDC".to_string(), dec!(1));
        assert_ne!(before, state.canonical_hash());
    }

    #[test]
    fn test_new_state_is_self_consistent() {
        let state = CoordinationState::new();
        assert_eq!(state.version.hash, state.canonical_hash());
        assert_eq!(state.spend("USDC"), Decimal::ZERO);
    }
}
