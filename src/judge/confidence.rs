//! Confidence-based verdict state machine

use tracing::debug;

use crate::domain::{ResultStatus, VerdictDecision, WorkResult};

use super::Evaluator;

/// Plain verdict engine: `PendingReview -> {Approved, Escalated, Rejected}`.
///
/// Boundaries are inclusive on the high side: a score of exactly
/// `approve_threshold` approves, exactly `escalate_threshold` escalates.
#[derive(Debug, Clone)]
pub struct ConfidenceJudge {
    pub approve_threshold: f64,
    pub escalate_threshold: f64,
}

impl Default for ConfidenceJudge {
    fn default() -> Self {
        Self {
            approve_threshold: 0.90,
            escalate_threshold: 0.70,
        }
    }
}

impl Evaluator for ConfidenceJudge {
    fn evaluate(&self, result: &WorkResult) -> VerdictDecision {
        debug!(
            work_item = %result.work_item_id,
            worker = %result.worker_id,
            confidence = result.confidence,
            "evaluating result"
        );

        if result.status == ResultStatus::Failed {
            return VerdictDecision::reject("execution failed");
        }

        if result.confidence >= self.approve_threshold {
            VerdictDecision::approve("high confidence")
        } else if result.confidence >= self.escalate_threshold {
            VerdictDecision::escalate("needs review")
        } else {
            VerdictDecision::reject("low confidence")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Verdict, WorkContext, WorkItem, WorkKind};
    use std::collections::BTreeMap;

    fn result_with_confidence(confidence: f64) -> WorkResult {
        let item = WorkItem::new(WorkKind::GenerateContent, WorkContext::new("goal"));
        WorkResult::success(&item, "worker-0", BTreeMap::new(), confidence)
    }

    #[test]
    fn test_confidence_grid() {
        let judge = ConfidenceJudge::default();
        let cases = [
            (0.95, Verdict::Approve),
            (0.91, Verdict::Approve),
            (0.90, Verdict::Approve),
            (0.89, Verdict::Escalate),
            (0.80, Verdict::Escalate),
            (0.70, Verdict::Escalate),
            (0.69, Verdict::Reject),
            (0.50, Verdict::Reject),
            (0.10, Verdict::Reject),
            (0.00, Verdict::Reject),
        ];

        for (confidence, expected) in cases {
            let decision = judge.evaluate(&result_with_confidence(confidence));
            assert_eq!(
                decision.verdict, expected,
                "confidence {confidence} should yield {expected:?}"
            );
        }
    }

    #[test]
    fn test_failed_status_rejects_regardless_of_score() {
        let judge = ConfidenceJudge::default();
        let item = WorkItem::new(WorkKind::GenerateContent, WorkContext::new("goal"));
        let mut result = WorkResult::failed(&item, "worker-0", "tool crashed");
        result.confidence = 0.99;

        let decision = judge.evaluate(&result);
        assert_eq!(decision.verdict, Verdict::Reject);
        assert_eq!(decision.reason, "execution failed");
    }
}
