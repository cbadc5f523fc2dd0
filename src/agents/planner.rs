//! Built-in deterministic planner

use async_trait::async_trait;
use tracing::debug;

use crate::domain::{WorkContext, WorkItem, WorkKind, WorkPriority};
use crate::error::Result;

use super::traits::GoalPlanner;

/// Deterministic goal decomposition: one content item and one social item per
/// goal. Stands in for the LLM decomposition collaborator in the demo binary
/// and in tests.
#[derive(Debug, Clone, Default)]
pub struct HeuristicPlanner {
    /// Constraint attached to every generated content item.
    pub style_constraint: Option<String>,
}

impl HeuristicPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_style(mut self, constraint: impl Into<String>) -> Self {
        self.style_constraint = Some(constraint.into());
        self
    }
}

#[async_trait]
impl GoalPlanner for HeuristicPlanner {
    async fn decompose(&self, campaign_id: &str, goal: &str) -> Result<Vec<WorkItem>> {
        debug!(campaign = campaign_id, goal, "decomposing goal");

        let mut content_context = WorkContext::new(format!("Visual for: {goal}"));
        if let Some(constraint) = &self.style_constraint {
            content_context = content_context.with_constraint(constraint.clone());
        }

        Ok(vec![
            WorkItem::new(WorkKind::GenerateContent, content_context)
                .with_priority(WorkPriority::High),
            WorkItem::new(
                WorkKind::SocialAction,
                WorkContext::new(format!("Social post for: {goal}")),
            )
            .with_priority(WorkPriority::Medium),
        ])
    }
}
