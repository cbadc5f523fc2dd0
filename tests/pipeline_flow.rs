//! End-to-end pipeline gate: campaign seeding through verdict routing.
//!
//! Exercises the real loops with scripted collaborators: items flow
//! planner -> workers -> judge, approvals reserve spend, mid-confidence
//! results park for human review, and the ceiling holds under load.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal_macros::dec;
use serde_json::Value;

use maestro::{
    AppConfig, Coordinator, CoordinatorError, GoalPlanner, SkillExecutor, TransactionDetails,
    WorkContext, WorkItem, WorkKind, WorkResult,
};

/// Emits a fixed batch of items on the first decomposition call, then
/// nothing — keeps the at-least-once planner from flooding the assertions.
struct OneShotPlanner {
    items: Vec<WorkItem>,
    fired: AtomicBool,
}

impl OneShotPlanner {
    fn new(items: Vec<WorkItem>) -> Self {
        Self {
            items,
            fired: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl GoalPlanner for OneShotPlanner {
    async fn decompose(
        &self,
        _campaign_id: &str,
        _goal: &str,
    ) -> Result<Vec<WorkItem>, CoordinatorError> {
        if self.fired.swap(true, Ordering::SeqCst) {
            return Ok(Vec::new());
        }
        Ok(self.items.clone())
    }
}

/// Deterministic executor: confidence depends on the item kind, transactions
/// carry a fixed 10 USDC transfer.
struct KindScriptedExecutor;

#[async_trait]
impl SkillExecutor for KindScriptedExecutor {
    async fn execute(&self, item: &WorkItem) -> Result<WorkResult, CoordinatorError> {
        let result = match item.kind {
            WorkKind::GenerateContent => {
                let mut output = BTreeMap::new();
                output.insert("artifact_url".to_string(), Value::String("x".to_string()));
                WorkResult::success(item, "scripted", output, 0.95)
            }
            WorkKind::SocialAction => {
                WorkResult::success(item, "scripted", BTreeMap::new(), 0.80)
            }
            WorkKind::Transaction => {
                WorkResult::success(item, "scripted", BTreeMap::new(), 0.95).with_transaction(
                    &TransactionDetails {
                        currency: "USDC".to_string(),
                        amount: dec!(10),
                        recipient: "0xabc123".to_string(),
                    },
                )
            }
        };
        Ok(result)
    }
}

fn fast_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.coordinator.num_workers = 2;
    config.coordinator.planner_interval_ms = 25;
    config.coordinator.pop_timeout_ms = 25;
    config
}

fn item(kind: WorkKind, goal: &str) -> WorkItem {
    WorkItem::new(kind, WorkContext::new(goal))
}

#[tokio::test]
async fn pipeline_routes_each_kind_to_its_verdict() {
    let planner = Arc::new(OneShotPlanner::new(vec![
        item(WorkKind::GenerateContent, "visual"),
        item(WorkKind::SocialAction, "post"),
        item(WorkKind::Transaction, "tip"),
    ]));

    let coordinator = Coordinator::new(fast_config(), planner, Arc::new(KindScriptedExecutor));
    coordinator.start().await;
    coordinator
        .start_campaign("camp-1", "summer launch")
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(400)).await;
    coordinator.shutdown().await;

    let state = coordinator.store().snapshot();

    // The transaction approval reserved exactly its amount.
    assert_eq!(state.spend("USDC"), dec!(10));

    // The high-confidence content approval was committed by the coordinator.
    assert!(state
        .agent_states
        .values()
        .any(|s| s.starts_with("approved:")));

    // The mid-confidence social result is waiting for a human.
    let pending = coordinator.pending_escalations();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].confidence, 0.80);

    // Everything pushed was consumed.
    let (work, review) = coordinator.queue_stats();
    assert_eq!(work.enqueued_total, 3);
    assert_eq!(work.dequeued_total, 3);
    assert_eq!(review.dequeued_total, 3);
}

#[tokio::test]
async fn budget_ceiling_holds_under_transaction_load() {
    // Twenty 10-USDC transfers against a 50 USDC ceiling: exactly five can
    // ever be approved, the rest must be rejected without reservation.
    let items = (0..20)
        .map(|i| item(WorkKind::Transaction, &format!("transfer {i}")))
        .collect();
    let planner = Arc::new(OneShotPlanner::new(items));

    let coordinator = Coordinator::new(fast_config(), planner, Arc::new(KindScriptedExecutor));
    coordinator.start().await;
    coordinator
        .start_campaign("camp-burst", "bulk transfers")
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(800)).await;
    coordinator.shutdown().await;

    let state = coordinator.store().snapshot();
    assert_eq!(state.spend("USDC"), dec!(50));
    assert!(coordinator.pending_escalations().is_empty());
}

#[tokio::test]
async fn approved_escalation_reserves_its_spend() {
    let planner = Arc::new(OneShotPlanner::new(vec![item(
        WorkKind::Transaction,
        "large tip",
    )]));

    // Suspicious threshold default is 100 USDC; a 150 USDC transfer with a
    // valid recipient escalates instead of approving.
    struct LargeTransferExecutor;
    #[async_trait]
    impl SkillExecutor for LargeTransferExecutor {
        async fn execute(&self, item: &WorkItem) -> Result<WorkResult, CoordinatorError> {
            Ok(
                WorkResult::success(item, "scripted", BTreeMap::new(), 0.95).with_transaction(
                    &TransactionDetails {
                        currency: "USDC".to_string(),
                        amount: dec!(150),
                        recipient: "0xabc123".to_string(),
                    },
                ),
            )
        }
    }

    let mut config = fast_config();
    config.budget.daily_limits.insert("USDC".to_string(), dec!(1000));

    let coordinator = Coordinator::new(config, planner, Arc::new(LargeTransferExecutor));
    coordinator.start().await;
    coordinator
        .start_campaign("camp-large", "reward top fan")
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(400)).await;
    coordinator.shutdown().await;

    let pending = coordinator.pending_escalations();
    assert_eq!(pending.len(), 1);
    let id = pending[0].work_item_id;

    assert!(coordinator.approve_escalation(id).unwrap());
    assert_eq!(coordinator.store().snapshot().spend("USDC"), dec!(150));

    // Second disposition on the same id reports not-found.
    assert!(!coordinator.approve_escalation(id).unwrap());
}
