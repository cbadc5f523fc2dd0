//! Collaborator traits consumed by the coordinator loops

use async_trait::async_trait;

use crate::domain::{WorkItem, WorkResult};
use crate::error::Result;

/// Goal decomposition collaborator (planner side).
///
/// A failure is treated as zero items by the planning loop: logged, never
/// fatal to the loop.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GoalPlanner: Send + Sync {
    async fn decompose(&self, campaign_id: &str, goal: &str) -> Result<Vec<WorkItem>>;
}

/// Work execution collaborator (worker side).
///
/// May fail; the worker loop normalizes any error into a `Failed`-status
/// result rather than propagating it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SkillExecutor: Send + Sync {
    async fn execute(&self, item: &WorkItem) -> Result<WorkResult>;
}
