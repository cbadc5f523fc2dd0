pub mod agents;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod domain;
pub mod error;
pub mod judge;
pub mod queue;
pub mod state;

pub use agents::{GoalPlanner, HeuristicPlanner, SimulatedExecutor, SkillExecutor, Worker};
pub use config::AppConfig;
pub use coordinator::{Coordinator, EscalationBoard};
pub use domain::{
    ResultStatus, TransactionDetails, Verdict, VerdictDecision, WorkContext, WorkItem, WorkKind,
    WorkPriority, WorkResult, WorkStatus,
};
pub use error::{CoordinatorError, GovernanceError, Result};
pub use judge::{BudgetGovernor, BudgetGovernorConfig, ConfidenceJudge, Evaluator};
pub use queue::{QueueStats, ReviewQueue, TransportQueue, WorkQueue};
pub use state::{CampaignRecord, CampaignStatus, CoordinationState, StateStore, StateVersion};
