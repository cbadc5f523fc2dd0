//! Worker wrapper and the built-in dry-run executor

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal_macros::dec;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::{TransactionDetails, WorkItem, WorkKind, WorkResult};
use crate::error::Result;

use super::traits::SkillExecutor;

/// One worker-pool slot: stateless, delegates to the execution collaborator
/// and normalizes its failures into reviewable results.
pub struct Worker {
    id: String,
    executor: Arc<dyn SkillExecutor>,
}

impl Worker {
    pub fn new(id: impl Into<String>, executor: Arc<dyn SkillExecutor>) -> Self {
        Self {
            id: id.into(),
            executor,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Execute one item. A collaborator failure becomes a `Failed`-status
    /// result attributed to this worker; nothing propagates past here.
    pub async fn process(&self, item: &WorkItem) -> WorkResult {
        debug!(worker = %self.id, work_item = %item.id, kind = %item.kind, "executing");

        match self.executor.execute(item).await {
            Ok(mut result) => {
                result.worker_id = self.id.clone();
                result
            }
            Err(e) => {
                warn!(worker = %self.id, work_item = %item.id, error = %e, "execution failed");
                WorkResult::failed(item, self.id.clone(), e.to_string())
            }
        }
    }
}

/// Dry-run execution collaborator: fabricates plausible outputs without
/// calling any remote tool. Transaction items embed the configured transfer.
#[derive(Debug, Clone)]
pub struct SimulatedExecutor {
    pub confidence: f64,
    pub transaction: TransactionDetails,
}

impl Default for SimulatedExecutor {
    fn default() -> Self {
        Self {
            confidence: 0.95,
            transaction: TransactionDetails {
                currency: "USDC".to_string(),
                amount: dec!(5),
                recipient: "0xc0ffee254729296a45a3885639ac7e10f9d54979".to_string(),
            },
        }
    }
}

impl SimulatedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_transaction(mut self, transaction: TransactionDetails) -> Self {
        self.transaction = transaction;
        self
    }
}

#[async_trait]
impl SkillExecutor for SimulatedExecutor {
    async fn execute(&self, item: &WorkItem) -> Result<WorkResult> {
        let mut output = BTreeMap::new();
        match item.kind {
            WorkKind::GenerateContent => {
                output.insert(
                    "artifact_url".to_string(),
                    Value::String(format!("dry-run://image/{}", item.id)),
                );
                output.insert(
                    "caption".to_string(),
                    Value::String(item.context.goal.clone()),
                );
            }
            WorkKind::SocialAction => {
                output.insert(
                    "post_id".to_string(),
                    Value::String(format!("dry-run://post/{}", item.id)),
                );
            }
            WorkKind::Transaction => {
                return Ok(
                    WorkResult::success(item, "unattributed", output, self.confidence)
                        .with_transaction(&self.transaction),
                );
            }
        }
        Ok(WorkResult::success(
            item,
            "unattributed",
            output,
            self.confidence,
        ))
    }
}
