//! Work results produced by worker loops

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::task::WorkItem;

/// Terminal status of one execution attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Success,
    Failed,
}

/// Transaction sub-record a worker may embed in its output payload.
///
/// Amounts travel as strings on the wire so the canonical encoding stays
/// exact regardless of magnitude.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDetails {
    pub currency: String,
    pub amount: Decimal,
    pub recipient: String,
}

/// Outcome of exactly one execution of a `WorkItem`.
///
/// Created by exactly one worker, read-only afterward. `output` is an opaque
/// key/value map; the key `"transaction"` is reserved for the sub-record the
/// budget governor evaluates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkResult {
    pub work_item_id: Uuid,
    pub worker_id: String,
    pub output: BTreeMap<String, Value>,
    pub confidence: f64,
    pub status: ResultStatus,
    pub timestamp: DateTime<Utc>,
}

impl WorkResult {
    pub const TRANSACTION_KEY: &'static str = "transaction";

    pub fn success(
        item: &WorkItem,
        worker_id: impl Into<String>,
        output: BTreeMap<String, Value>,
        confidence: f64,
    ) -> Self {
        Self {
            work_item_id: item.id,
            worker_id: worker_id.into(),
            output,
            confidence,
            status: ResultStatus::Success,
            timestamp: Utc::now(),
        }
    }

    /// Normalize a collaborator failure into a reviewable result instead of
    /// letting it propagate across the worker-loop boundary.
    pub fn failed(item: &WorkItem, worker_id: impl Into<String>, reason: impl Into<String>) -> Self {
        let mut output = BTreeMap::new();
        output.insert("error".to_string(), Value::String(reason.into()));
        Self {
            work_item_id: item.id,
            worker_id: worker_id.into(),
            output,
            confidence: 0.0,
            status: ResultStatus::Failed,
            timestamp: Utc::now(),
        }
    }

    /// Whether the payload claims to carry a transaction sub-record.
    pub fn has_transaction(&self) -> bool {
        self.output.contains_key(Self::TRANSACTION_KEY)
    }

    /// Parse the transaction sub-record, if present.
    pub fn transaction(&self) -> Option<serde_json::Result<TransactionDetails>> {
        self.output
            .get(Self::TRANSACTION_KEY)
            .map(|raw| serde_json::from_value(raw.clone()))
    }

    pub fn with_transaction(mut self, tx: &TransactionDetails) -> Self {
        self.output.insert(
            Self::TRANSACTION_KEY.to_string(),
            serde_json::to_value(tx).expect("transaction details always serialize"),
        );
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{WorkContext, WorkKind};
    use rust_decimal_macros::dec;

    fn item() -> WorkItem {
        WorkItem::new(WorkKind::Transaction, WorkContext::new("tip a creator"))
    }

    #[test]
    fn test_failed_result_carries_reason() {
        let result = WorkResult::failed(&item(), "worker-0", "tool timed out");
        assert_eq!(result.status, ResultStatus::Failed);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(
            result.output.get("error"),
            Some(&Value::String("tool timed out".to_string()))
        );
    }

    #[test]
    fn test_transaction_round_trip() {
        let tx = TransactionDetails {
            currency: "USDC".to_string(),
            amount: dec!(12.50),
            recipient: "0xabc123".to_string(),
        };
        let result =
            WorkResult::success(&item(), "worker-0", BTreeMap::new(), 0.95).with_transaction(&tx);

        assert!(result.has_transaction());
        let parsed = result.transaction().unwrap().unwrap();
        assert_eq!(parsed, tx);
    }

    #[test]
    fn test_malformed_transaction_is_reported_not_hidden() {
        let mut output = BTreeMap::new();
        output.insert(
            WorkResult::TRANSACTION_KEY.to_string(),
            Value::String("not a record".to_string()),
        );
        let result = WorkResult::success(&item(), "worker-0", output, 0.95);

        assert!(result.has_transaction());
        assert!(result.transaction().unwrap().is_err());
    }

    #[test]
    fn test_result_wire_round_trip_is_byte_identical() {
        let tx = TransactionDetails {
            currency: "ETH".to_string(),
            amount: dec!(0.004),
            recipient: "0xdef456".to_string(),
        };
        let result =
            WorkResult::success(&item(), "worker-3", BTreeMap::new(), 0.88).with_transaction(&tx);

        let first = serde_json::to_vec(&result).unwrap();
        let decoded: WorkResult = serde_json::from_slice(&first).unwrap();
        let second = serde_json::to_vec(&decoded).unwrap();
        assert_eq!(first, second);
    }
}
