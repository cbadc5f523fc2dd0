//! Shared coordination state under optimistic concurrency control
//!
//! The store is the single source of truth for the pipeline. Readers never
//! block each other: every consumer works on a deep snapshot and publishes
//! its modification through `StateStore::commit`, which accepts the candidate
//! only if the state is unchanged since the snapshot was taken.

pub mod model;
pub mod store;

pub use model::{CampaignRecord, CampaignStatus, CoordinationState, StateVersion};
pub use store::StateStore;
