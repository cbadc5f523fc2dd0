//! Work items produced by the planning loop

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of work a planner can schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkKind {
    /// Produce a content artifact (image, copy, ...)
    GenerateContent,
    /// Publish or interact on a social surface
    SocialAction,
    /// Transfer value; always routed through the budget governor
    Transaction,
}

impl std::fmt::Display for WorkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkKind::GenerateContent => write!(f, "generate_content"),
            WorkKind::SocialAction => write!(f, "social_action"),
            WorkKind::Transaction => write!(f, "transaction"),
        }
    }
}

/// Scheduling priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkPriority {
    High,
    Medium,
    Low,
}

impl Default for WorkPriority {
    fn default() -> Self {
        WorkPriority::Medium
    }
}

/// Lifecycle status of a work item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    Pending,
    Processing,
    Review,
    Complete,
    Failed,
}

/// Goal text plus the constraints the executor must honor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkContext {
    pub goal: String,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default)]
    pub resources: Vec<String>,
}

impl WorkContext {
    pub fn new(goal: impl Into<String>) -> Self {
        Self {
            goal: goal.into(),
            constraints: Vec::new(),
            resources: Vec::new(),
        }
    }

    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraints.push(constraint.into());
        self
    }
}

/// A unit of work flowing planner -> worker.
///
/// Immutable once enqueued. Delivery is at-least-once; `id` is the stable
/// idempotency key consumers must dedupe on if re-execution is not tolerable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: Uuid,
    pub kind: WorkKind,
    pub priority: WorkPriority,
    pub context: WorkContext,
    pub status: WorkStatus,
    pub created_at: DateTime<Utc>,
}

impl WorkItem {
    pub fn new(kind: WorkKind, context: WorkContext) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            priority: WorkPriority::default(),
            context,
            status: WorkStatus::Pending,
            created_at: Utc::now(),
        }
    }

    pub fn with_priority(mut self, priority: WorkPriority) -> Self {
        self.priority = priority;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_round_trip_is_byte_identical() {
        let item = WorkItem::new(
            WorkKind::GenerateContent,
            WorkContext::new("Visual for: summer launch").with_constraint("Cyberpunk"),
        )
        .with_priority(WorkPriority::High);

        let first = serde_json::to_vec(&item).unwrap();
        let decoded: WorkItem = serde_json::from_slice(&first).unwrap();
        let second = serde_json::to_vec(&decoded).unwrap();

        assert_eq!(first, second);
        assert_eq!(item, decoded);
    }

    #[test]
    fn test_kind_wire_tags_are_snake_case() {
        let json = serde_json::to_string(&WorkKind::SocialAction).unwrap();
        assert_eq!(json, "\"social_action\"");
        let json = serde_json::to_string(&WorkKind::GenerateContent).unwrap();
        assert_eq!(json, "\"generate_content\"");
    }

    #[test]
    fn test_default_priority_is_medium() {
        let item = WorkItem::new(WorkKind::Transaction, WorkContext::new("tip a creator"));
        assert_eq!(item.priority, WorkPriority::Medium);
        assert_eq!(item.status, WorkStatus::Pending);
    }
}
