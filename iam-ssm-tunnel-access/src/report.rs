//! Read-only summary of a reconciliation outcome.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::principal::PrincipalKind;
use crate::types::ReconciliationOutcome;

/// Aggregated counts used by callers to decide success/failure reporting and
/// exit behavior. Kind-level fetch failures count into `failures_by_kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationSummary {
    pub total_attempted: usize,
    pub total_succeeded: usize,
    pub total_failed: usize,
    pub failures_by_kind: BTreeMap<PrincipalKind, usize>,
    pub cancelled: bool,
}

/// Pure aggregation; no side effects.
#[must_use]
pub fn summarize(outcome: &ReconciliationOutcome) -> ReconciliationSummary {
    let mut failures_by_kind = BTreeMap::new();
    for failure in &outcome.failed {
        *failures_by_kind.entry(failure.record.kind).or_insert(0) += 1;
    }
    for failure in &outcome.kind_failures {
        *failures_by_kind.entry(failure.kind).or_insert(0) += 1;
    }
    ReconciliationSummary {
        total_attempted: outcome.attempted.len(),
        total_succeeded: outcome.succeeded.len(),
        total_failed: outcome.failed.len() + outcome.kind_failures.len(),
        failures_by_kind,
        cancelled: outcome.cancelled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::AwsError;
    use crate::error::TunnelAccessError;
    use crate::types::{AttachmentOp, AttachmentRecord, FailedAttachment, KindFailure};

    fn record(kind: PrincipalKind, arn: &str) -> AttachmentRecord {
        AttachmentRecord {
            kind,
            principal_arn: arn.to_string(),
            policy_arn: "arn:aws:iam::123456789012:policy/test".to_string(),
            op: AttachmentOp::Attach,
        }
    }

    #[test]
    fn test_summarize_empty_outcome() {
        let summary = summarize(&ReconciliationOutcome::default());
        assert_eq!(summary.total_attempted, 0);
        assert_eq!(summary.total_succeeded, 0);
        assert_eq!(summary.total_failed, 0);
        assert!(summary.failures_by_kind.is_empty());
        assert!(!summary.cancelled);
    }

    #[test]
    fn test_summarize_counts_operation_and_kind_failures() {
        let user = record(PrincipalKind::User, "arn:aws:iam::123456789012:user/a");
        let role = record(PrincipalKind::Role, "arn:aws:iam::123456789012:role/b");
        let outcome = ReconciliationOutcome {
            attempted: vec![user.clone(), role.clone()],
            succeeded: vec![user],
            failed: vec![FailedAttachment {
                error: TunnelAccessError::AttachmentOperation {
                    kind: role.kind,
                    arn: role.principal_arn.clone(),
                    source: AwsError::IamError("boom".to_string()),
                },
                record: role,
            }],
            kind_failures: vec![KindFailure {
                kind: PrincipalKind::Group,
                error: AwsError::IamError("list failed".to_string()),
            }],
            cancelled: false,
        };
        let summary = summarize(&outcome);
        assert_eq!(summary.total_attempted, 2);
        assert_eq!(summary.total_succeeded, 1);
        assert_eq!(summary.total_failed, 2);
        assert_eq!(summary.failures_by_kind[&PrincipalKind::Role], 1);
        assert_eq!(summary.failures_by_kind[&PrincipalKind::Group], 1);
        assert!(!summary.failures_by_kind.contains_key(&PrincipalKind::User));
    }
}
