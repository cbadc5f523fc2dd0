//! Budget governor for transaction-bearing results
//!
//! Guard sequence, short-circuiting in order: daily-limit check, anomaly
//! checks, delegation to the confidence judge, then an atomic spend
//! reservation. An Approve is never returned unless the reservation durably
//! committed; a commit conflict downgrades the verdict to Reject.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{info, warn};

use crate::domain::{TransactionDetails, Verdict, VerdictDecision, WorkResult};
use crate::error::{CoordinatorError, GovernanceError};
use crate::state::{CoordinationState, StateStore};

use super::confidence::ConfidenceJudge;
use super::Evaluator;

/// Recipient prefix treated as a known-invalid sentinel (burn address)
const INVALID_RECIPIENT_PREFIX: &str = "0x0000";

/// Governor tuning, distinct from the hard ceilings in the state store
#[derive(Debug, Clone)]
pub struct BudgetGovernorConfig {
    /// Per-currency amounts above which a transaction is flagged for human
    /// review even when it fits the daily ceiling.
    pub suspicious_thresholds: BTreeMap<String, Decimal>,
}

impl Default for BudgetGovernorConfig {
    fn default() -> Self {
        let mut suspicious_thresholds = BTreeMap::new();
        suspicious_thresholds.insert("USDC".to_string(), dec!(100));
        suspicious_thresholds.insert("ETH".to_string(), dec!(0.1));
        suspicious_thresholds.insert("USD".to_string(), dec!(100));
        Self {
            suspicious_thresholds,
        }
    }
}

/// Budget-governed evaluator for results carrying a transaction sub-record.
///
/// Composes the plain `ConfidenceJudge` by delegation. The whole evaluation
/// runs against one snapshot, and the spend reservation commits with that
/// snapshot's version hash, so two concurrent approvals racing over the same
/// budget resolve to exactly one winner.
pub struct BudgetGovernor {
    store: Arc<StateStore>,
    base: ConfidenceJudge,
    suspicious_thresholds: RwLock<BTreeMap<String, Decimal>>,
    actor_id: String,
}

impl BudgetGovernor {
    pub fn new(store: Arc<StateStore>, base: ConfidenceJudge, config: BudgetGovernorConfig) -> Self {
        Self {
            store,
            base,
            suspicious_thresholds: RwLock::new(config.suspicious_thresholds),
            actor_id: "budget-governor".to_string(),
        }
    }

    /// Change the suspicious-amount threshold for a currency. Takes effect on
    /// the next evaluation; in-flight items are not re-judged.
    pub fn set_suspicious_threshold(&self, currency: &str, threshold: Decimal) {
        let mut thresholds = self
            .suspicious_thresholds
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        thresholds.insert(currency.to_string(), threshold);
        info!(currency, %threshold, "suspicious threshold updated");
    }

    fn limit_breach(
        &self,
        snapshot: &CoordinationState,
        tx: &TransactionDetails,
    ) -> Option<GovernanceError> {
        let current = snapshot.spend(&tx.currency);
        let limit = *snapshot.spend_limits.get(&tx.currency)?;
        let total = current + tx.amount;
        (total > limit).then(|| GovernanceError::BudgetExceeded {
            currency: tx.currency.clone(),
            current,
            requested: tx.amount,
            limit,
            total,
        })
    }

    /// All anomaly checks run; every triggered reason is collected.
    fn anomaly_flags(&self, tx: &TransactionDetails) -> Vec<GovernanceError> {
        let mut flags = Vec::new();

        let thresholds = self
            .suspicious_thresholds
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(threshold) = thresholds.get(&tx.currency) {
            if tx.amount > *threshold {
                flags.push(GovernanceError::SuspiciousAmount {
                    currency: tx.currency.clone(),
                    amount: tx.amount,
                    threshold: *threshold,
                });
            }
        }

        if tx.recipient.is_empty() || tx.recipient.starts_with(INVALID_RECIPIENT_PREFIX) {
            flags.push(GovernanceError::InvalidRecipient {
                recipient: tx.recipient.clone(),
            });
        }

        flags
    }

    fn evaluate_transaction(
        &self,
        result: &WorkResult,
        tx: &TransactionDetails,
        snapshot: CoordinationState,
    ) -> VerdictDecision {
        let expected_hash = snapshot.version.hash.clone();

        // 1. Daily limit: a hard policy violation, never escalated.
        if let Some(breach) = self.limit_breach(&snapshot, tx) {
            warn!(work_item = %result.work_item_id, reason = %breach, "transaction rejected");
            return VerdictDecision::reject(breach.to_string());
        }

        // 2. Anomalies: soft flags routed to human review, aggregated into one
        //    message. Takes priority over confidence-based approval.
        let flags = self.anomaly_flags(tx);
        if !flags.is_empty() {
            let reasons = flags
                .iter()
                .map(|f| f.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            warn!(work_item = %result.work_item_id, reasons = %reasons, "transaction escalated");
            return VerdictDecision::escalate(format!(
                "Suspicious transaction pattern detected: {reasons}. Requires human review."
            ));
        }

        // 3. Base verdict from the confidence judge.
        let base = self.base.evaluate(result);
        if base.verdict != Verdict::Approve {
            return base;
        }

        // 4. Reserve the spend against the snapshot this evaluation read. A
        //    conflict means another commit won the race since then; the
        //    approval must not stand.
        let mut candidate = snapshot;
        let entry = candidate
            .daily_spend
            .entry(tx.currency.clone())
            .or_insert(Decimal::ZERO);
        *entry += tx.amount;
        let new_total = *entry;

        match self.store.commit(candidate, &expected_hash, &self.actor_id) {
            Ok(_) => {
                info!(
                    work_item = %result.work_item_id,
                    currency = %tx.currency,
                    amount = %tx.amount,
                    total = %new_total,
                    "transaction approved, spend reserved"
                );
                base
            }
            Err(CoordinatorError::Conflict { .. }) => {
                warn!(
                    work_item = %result.work_item_id,
                    "spend reservation lost an update race"
                );
                VerdictDecision::reject(
                    "State conflict detected during budget reservation. Please retry.",
                )
            }
            Err(e) => VerdictDecision::reject(format!("budget reservation failed: {e}")),
        }
    }
}

impl Evaluator for BudgetGovernor {
    fn evaluate(&self, result: &WorkResult) -> VerdictDecision {
        let tx = match result.transaction() {
            // Non-transaction results bypass governance entirely.
            None => return self.base.evaluate(result),
            Some(Err(e)) => {
                warn!(work_item = %result.work_item_id, error = %e, "unparseable transaction");
                return VerdictDecision::reject(format!("malformed transaction payload: {e}"));
            }
            Some(Ok(tx)) => tx,
        };

        let snapshot = self.store.snapshot();
        self.evaluate_transaction(result, &tx, snapshot)
    }
}
