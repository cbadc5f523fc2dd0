//! Collaborator seams and the built-in role implementations
//!
//! The planning and execution collaborators (an LLM decomposer, a remote
//! tool client) live outside this crate; here are the traits the coordinator
//! consumes plus the deterministic built-ins used by the demo binary and the
//! test suite.

pub mod planner;
pub mod traits;
pub mod worker;

pub use planner::HeuristicPlanner;
pub use traits::{GoalPlanner, SkillExecutor};
pub use worker::{SimulatedExecutor, Worker};

#[cfg(test)]
pub use traits::{MockGoalPlanner, MockSkillExecutor};
