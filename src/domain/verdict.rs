//! Verdicts assigned to completed work

use serde::{Deserialize, Serialize};

/// Outcome classification for a reviewed result.
///
/// All three are terminal: a rejected or escalated item never re-enters
/// review without a brand-new `WorkResult`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Approve,
    Escalate,
    Reject,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Approve => write!(f, "approve"),
            Verdict::Escalate => write!(f, "escalate"),
            Verdict::Reject => write!(f, "reject"),
        }
    }
}

/// A verdict plus the human-readable reason behind it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictDecision {
    pub verdict: Verdict,
    pub reason: String,
}

impl VerdictDecision {
    pub fn approve(reason: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Approve,
            reason: reason.into(),
        }
    }

    pub fn escalate(reason: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Escalate,
            reason: reason.into(),
        }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Reject,
            reason: reason.into(),
        }
    }
}
