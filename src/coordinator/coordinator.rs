//! Coordinator — loop lifecycle for the planner/worker/judge pipeline

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::agents::{GoalPlanner, SkillExecutor, Worker};
use crate::config::AppConfig;
use crate::domain::{Verdict, WorkResult};
use crate::error::{CoordinatorError, Result};
use crate::judge::{BudgetGovernor, BudgetGovernorConfig, ConfidenceJudge, Evaluator};
use crate::queue::{QueueStats, ReviewQueue, WorkQueue};
use crate::state::StateStore;

use super::escalation::EscalationBoard;

/// Owns the lifecycle of the concurrent loops: one planning loop, N worker
/// loops, one judging loop, all gated by a shared running flag observed at
/// each timeout boundary. Shutdown is cooperative — nothing is interrupted
/// mid-flight.
pub struct Coordinator {
    config: AppConfig,
    store: Arc<StateStore>,
    work_queue: Arc<WorkQueue>,
    review_queue: Arc<ReviewQueue>,
    planner: Arc<dyn GoalPlanner>,
    executor: Arc<dyn SkillExecutor>,
    judge: Arc<ConfidenceJudge>,
    governor: Arc<BudgetGovernor>,
    escalations: Arc<EscalationBoard>,
    running: Arc<AtomicBool>,
    handles: tokio::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl Coordinator {
    pub fn new(
        config: AppConfig,
        planner: Arc<dyn GoalPlanner>,
        executor: Arc<dyn SkillExecutor>,
    ) -> Self {
        let store = Arc::new(StateStore::with_spend_limits(
            config.budget.daily_limits.clone(),
        ));
        let governor = Arc::new(BudgetGovernor::new(
            Arc::clone(&store),
            ConfidenceJudge::default(),
            BudgetGovernorConfig {
                suspicious_thresholds: config.budget.suspicious_thresholds.clone(),
            },
        ));

        Self {
            config,
            store,
            work_queue: Arc::new(WorkQueue::new("work")),
            review_queue: Arc::new(ReviewQueue::new("review")),
            planner,
            executor,
            judge: Arc::new(ConfidenceJudge::default()),
            governor,
            escalations: Arc::new(EscalationBoard::new()),
            running: Arc::new(AtomicBool::new(false)),
            handles: tokio::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    pub fn governor(&self) -> &Arc<BudgetGovernor> {
        &self.governor
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn queue_stats(&self) -> (QueueStats, QueueStats) {
        (self.work_queue.stats(), self.review_queue.stats())
    }

    /// Seed a campaign and decompose it once immediately, rather than waiting
    /// a full planner interval for the first work items.
    pub async fn start_campaign(&self, campaign_id: &str, goal: &str) -> Result<()> {
        self.store.add_campaign(campaign_id, goal, "coordinator")?;

        match self.planner.decompose(campaign_id, goal).await {
            Ok(items) => {
                let count = items.len();
                for item in &items {
                    self.work_queue.push(item)?;
                }
                info!(campaign = campaign_id, items = count, "campaign seeded");
            }
            Err(e) => {
                warn!(campaign = campaign_id, error = %e, "initial decomposition failed");
            }
        }
        Ok(())
    }

    /// Spawn all loops. Idempotent: calling twice while running is a no-op.
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("coordinator already running");
            return;
        }

        let planner_interval = Duration::from_millis(self.config.coordinator.planner_interval_ms);
        let pop_timeout = Duration::from_millis(self.config.coordinator.pop_timeout_ms);
        let retry_limit = self.config.coordinator.commit_retry_limit;

        let mut handles = self.handles.lock().await;

        handles.push(tokio::spawn(planning_loop(
            Arc::clone(&self.running),
            Arc::clone(&self.store),
            Arc::clone(&self.planner),
            Arc::clone(&self.work_queue),
            planner_interval,
        )));

        for slot in 0..self.config.coordinator.num_workers {
            let worker = Worker::new(format!("worker-{slot}"), Arc::clone(&self.executor));
            if let Err(e) = self
                .store
                .set_agent_state(worker.id(), "idle", "coordinator")
            {
                warn!(worker = worker.id(), error = %e, "failed to register worker");
            }
            handles.push(tokio::spawn(worker_loop(
                Arc::clone(&self.running),
                worker,
                Arc::clone(&self.work_queue),
                Arc::clone(&self.review_queue),
                pop_timeout,
            )));
        }

        handles.push(tokio::spawn(judging_loop(
            Arc::clone(&self.running),
            Arc::clone(&self.store),
            Arc::clone(&self.judge),
            Arc::clone(&self.governor),
            Arc::clone(&self.review_queue),
            Arc::clone(&self.escalations),
            pop_timeout,
            retry_limit,
        )));

        info!(
            workers = self.config.coordinator.num_workers,
            "coordinator started"
        );
    }

    /// Flip the running flag, await every loop at its next timeout boundary,
    /// then disconnect the queues.
    pub async fn shutdown(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        info!("coordinator shutting down");

        let handles: Vec<JoinHandle<()>> = self.handles.lock().await.drain(..).collect();
        for outcome in join_all(handles).await {
            if let Err(e) = outcome {
                error!(error = %e, "loop task panicked during shutdown");
            }
        }

        self.work_queue.close().await;
        self.review_queue.close().await;
        info!("coordinator shut down");
    }

    // --- escalation surface -------------------------------------------------

    pub fn pending_escalations(&self) -> Vec<WorkResult> {
        self.escalations.pending()
    }

    /// Approve a parked result. Returns false when the entry was never parked
    /// or already resolved. Approving a parked *transaction* reserves its
    /// spend.
    pub fn approve_escalation(&self, work_item_id: Uuid) -> Result<bool> {
        let Some(result) = self.escalations.approve(work_item_id) else {
            return Ok(false);
        };

        if let Some(Ok(tx)) = result.transaction() {
            let mut attempts = 0;
            loop {
                match self
                    .store
                    .reserve_spend(&tx.currency, tx.amount, "human-review")
                {
                    Ok(_) => break,
                    Err(e) if e.is_retryable() && attempts < self.config.coordinator.commit_retry_limit => {
                        attempts += 1;
                    }
                    Err(e) => return Err(e),
                }
            }
        }
        Ok(true)
    }

    /// Reject a parked result; symmetric to `approve_escalation`, never
    /// touches the budget.
    pub fn reject_escalation(&self, work_item_id: Uuid) -> Result<bool> {
        Ok(self.escalations.reject(work_item_id).is_some())
    }
}

/// Planning loop: snapshot the state on a fixed interval and decompose every
/// active campaign. A decomposition failure schedules zero items.
async fn planning_loop(
    running: Arc<AtomicBool>,
    store: Arc<StateStore>,
    planner: Arc<dyn GoalPlanner>,
    work_queue: Arc<WorkQueue>,
    interval: Duration,
) {
    info!("planning loop started");
    while running.load(Ordering::SeqCst) {
        let state = store.snapshot();
        for (campaign_id, record) in &state.active_campaigns {
            if !record.is_active() {
                continue;
            }
            match planner.decompose(campaign_id, &record.goal).await {
                Ok(items) => {
                    for item in &items {
                        if let Err(e) = work_queue.push(item) {
                            warn!(campaign = %campaign_id, error = %e, "failed to enqueue item");
                        }
                    }
                }
                Err(e) => {
                    warn!(campaign = %campaign_id, error = %e, "decomposition failed");
                }
            }
        }
        tokio::time::sleep(interval).await;
    }
    info!("planning loop stopped");
}

/// Worker loop: pop with timeout, execute, push the (always well-formed)
/// result to review. Timeouts only re-check the cancellation flag.
async fn worker_loop(
    running: Arc<AtomicBool>,
    worker: Worker,
    work_queue: Arc<WorkQueue>,
    review_queue: Arc<ReviewQueue>,
    pop_timeout: Duration,
) {
    info!(worker = worker.id(), "worker loop started");
    while running.load(Ordering::SeqCst) {
        let Some(item) = work_queue.pop(pop_timeout).await else {
            continue;
        };
        let result = worker.process(&item).await;
        if let Err(e) = review_queue.push(&result) {
            warn!(worker = worker.id(), error = %e, "failed to enqueue result");
        }
    }
    info!(worker = worker.id(), "worker loop stopped");
}

/// Judging loop: route each result through the governor (transaction payload)
/// or the plain judge, then act on the verdict.
#[allow(clippy::too_many_arguments)]
async fn judging_loop(
    running: Arc<AtomicBool>,
    store: Arc<StateStore>,
    judge: Arc<ConfidenceJudge>,
    governor: Arc<BudgetGovernor>,
    review_queue: Arc<ReviewQueue>,
    escalations: Arc<EscalationBoard>,
    pop_timeout: Duration,
    retry_limit: u32,
) {
    info!("judging loop started");
    while running.load(Ordering::SeqCst) {
        let Some(result) = review_queue.pop(pop_timeout).await else {
            continue;
        };

        let is_transaction = result.has_transaction();
        let decision = if is_transaction {
            governor.evaluate(&result)
        } else {
            judge.evaluate(&result)
        };

        match decision.verdict {
            Verdict::Approve => {
                // The governor reserves spend inside its own evaluation; plain
                // approvals are committed here.
                if !is_transaction {
                    record_approval(&store, &result, retry_limit);
                }
                info!(
                    work_item = %result.work_item_id,
                    reason = %decision.reason,
                    "result approved"
                );
            }
            Verdict::Escalate => {
                escalations.park(result);
            }
            Verdict::Reject => {
                // No automatic requeue; retry is an explicit extension point.
                warn!(
                    work_item = %result.work_item_id,
                    reason = %decision.reason,
                    "result rejected"
                );
            }
        }
    }
    info!("judging loop stopped");
}

/// Record a plain approval in the shared state via bounded OCC retry.
fn record_approval(store: &StateStore, result: &WorkResult, retry_limit: u32) {
    let mut attempts = 0;
    loop {
        let snapshot = store.snapshot();
        let expected = snapshot.version.hash.clone();
        let mut candidate = snapshot;
        candidate.agent_states.insert(
            result.worker_id.clone(),
            format!("approved:{}", result.work_item_id),
        );
        match store.commit(candidate, &expected, "judge") {
            Ok(_) => return,
            Err(CoordinatorError::Conflict { .. }) if attempts < retry_limit => {
                attempts += 1;
            }
            Err(e) => {
                warn!(
                    work_item = %result.work_item_id,
                    error = %e,
                    "giving up recording approval"
                );
                return;
            }
        }
    }
}
