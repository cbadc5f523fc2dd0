//! Human-escalation holding list

use std::sync::Mutex;

use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::WorkResult;

/// Results parked for human disposition, keyed by work item id.
///
/// Deliberately outside the OCC discipline of the state store: entries never
/// feed the hashed coordination state. Writers are the judge loop (insert)
/// and the external approve/reject surface (remove); one mutex covers both.
/// Removal is idempotent — the second caller observes not-found.
pub struct EscalationBoard {
    entries: Mutex<Vec<WorkResult>>,
}

impl EscalationBoard {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Park a result for human review.
    pub fn park(&self, result: WorkResult) {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        info!(work_item = %result.work_item_id, "parked for human review");
        entries.push(result);
    }

    /// Snapshot of the pending entries, oldest first.
    pub fn pending(&self) -> Vec<WorkResult> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Approve and remove an entry. `None` means it was never parked or was
    /// already resolved by another caller.
    pub fn approve(&self, work_item_id: Uuid) -> Option<WorkResult> {
        match self.take(work_item_id) {
            Some(result) => {
                info!(work_item = %work_item_id, "escalation approved");
                Some(result)
            }
            None => {
                warn!(work_item = %work_item_id, "escalation not found");
                None
            }
        }
    }

    /// Reject and remove an entry; symmetric to `approve`.
    pub fn reject(&self, work_item_id: Uuid) -> Option<WorkResult> {
        match self.take(work_item_id) {
            Some(result) => {
                info!(work_item = %work_item_id, "escalation rejected");
                Some(result)
            }
            None => {
                warn!(work_item = %work_item_id, "escalation not found");
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn take(&self, work_item_id: Uuid) -> Option<WorkResult> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let index = entries.iter().position(|r| r.work_item_id == work_item_id)?;
        Some(entries.remove(index))
    }
}

impl Default for EscalationBoard {
    fn default() -> Self {
        Self::new()
    }
}
