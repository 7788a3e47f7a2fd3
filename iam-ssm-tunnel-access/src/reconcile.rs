//! Attachment reconciliation: diff the declared principals against live
//! attachments and apply the minimal attach/detach set.

use std::collections::HashSet;

use log::{debug, warn};
use tokio_util::sync::CancellationToken;

use crate::aws::iam_api::IamApi;
use crate::aws::AwsError;
use crate::error::{TunnelAccessError, TunnelAccessResult};
use crate::principal::{principal_name, PrincipalKind, PrincipalRef, PrincipalSet};
use crate::types::{
    AttachmentOp, AttachmentRecord, FailedAttachment, KindFailure, ManagedPolicy,
    ReconciliationOutcome,
};

/// Bring the live attachment state for `policy` into agreement with
/// `desired`.
///
/// With `attach_enabled` false the desired set is treated as empty regardless
/// of its contents, so attachments left over from a prior run with the toggle
/// on are detached. Individual operation failures are recorded in the outcome
/// and never abort the remaining operations; the only error this function
/// raises itself is an unusable policy ARN.
///
/// Within a kind, attaches apply before detaches. A fetch failure for one
/// kind is recorded as a kind-level failure and does not block the others.
///
/// Cancellation stops new operations from being issued; the outcome reflects
/// only what completed and carries the `cancelled` flag.
pub async fn reconcile<C: IamApi + ?Sized>(
    client: &C,
    policy: &ManagedPolicy,
    desired: &PrincipalSet,
    attach_enabled: bool,
    cancel: &CancellationToken,
) -> TunnelAccessResult<ReconciliationOutcome> {
    if policy.arn.is_empty() || !policy.arn.starts_with("arn:") {
        return Err(TunnelAccessError::InvalidPolicyArn(policy.arn.clone()));
    }

    let mut outcome = ReconciliationOutcome::default();
    for kind in PrincipalKind::ALL {
        if cancel.is_cancelled() {
            outcome.cancelled = true;
            return Ok(outcome);
        }
        let declared: &[PrincipalRef] = if attach_enabled {
            desired.of_kind(kind)
        } else {
            &[]
        };
        let actual = match client.list_attached_principals(&policy.arn, kind).await {
            Ok(arns) => arns,
            Err(e) => {
                // One kind's fetch failure must not block the other kinds.
                warn!("skipping {kind} reconciliation, failed to list attachments: {e}");
                outcome.kind_failures.push(KindFailure { kind, error: e });
                continue;
            }
        };
        let (to_attach, to_detach) = diff(declared, &actual);
        debug!(
            "{kind}: {} to attach, {} to detach",
            to_attach.len(),
            to_detach.len()
        );

        // Attaches before detaches within a kind.
        for arn in to_attach {
            if cancel.is_cancelled() {
                outcome.cancelled = true;
                return Ok(outcome);
            }
            apply_one(client, &mut outcome, kind, arn, &policy.arn, AttachmentOp::Attach).await;
        }
        for arn in to_detach {
            if cancel.is_cancelled() {
                outcome.cancelled = true;
                return Ok(outcome);
            }
            apply_one(client, &mut outcome, kind, arn, &policy.arn, AttachmentOp::Detach).await;
        }
    }
    Ok(outcome)
}

/// Set difference keyed on the principal's IAM name: the live API reports
/// attached entities by name, and names are unique per account and kind, so a
/// declared ARN carrying an IAM path still matches its attached entity.
fn diff(declared: &[PrincipalRef], actual: &[String]) -> (Vec<String>, Vec<String>) {
    let declared_names: HashSet<&str> = declared.iter().map(PrincipalRef::name).collect();
    let actual_names: HashSet<&str> = actual.iter().map(|a| principal_name(a)).collect();

    let mut seen_attach = HashSet::new();
    let to_attach = declared
        .iter()
        .filter(|p| !actual_names.contains(p.name()))
        .filter(|p| seen_attach.insert(p.name()))
        .map(|p| p.arn.clone())
        .collect();

    let mut seen_detach = HashSet::new();
    let to_detach = actual
        .iter()
        .filter(|a| !declared_names.contains(principal_name(a)))
        .filter(|a| seen_detach.insert(principal_name(a)))
        .cloned()
        .collect();

    (to_attach, to_detach)
}

async fn apply_one<C: IamApi + ?Sized>(
    client: &C,
    outcome: &mut ReconciliationOutcome,
    kind: PrincipalKind,
    principal_arn: String,
    policy_arn: &str,
    op: AttachmentOp,
) {
    let record = AttachmentRecord {
        kind,
        principal_arn,
        policy_arn: policy_arn.to_string(),
        op,
    };
    outcome.attempted.push(record.clone());
    let result = match op {
        AttachmentOp::Attach => {
            client
                .attach_policy(kind, &record.principal_arn, policy_arn)
                .await
        }
        AttachmentOp::Detach => {
            client
                .detach_policy(kind, &record.principal_arn, policy_arn)
                .await
        }
    };
    match (op, result) {
        (_, Ok(())) => outcome.succeeded.push(record),
        // Already in the desired state counts as success.
        (AttachmentOp::Attach, Err(AwsError::AlreadyExists))
        | (AttachmentOp::Detach, Err(AwsError::NoSuchEntity)) => {
            debug!("{kind} '{}' already in desired state", record.principal_arn);
            outcome.succeeded.push(record);
        }
        (_, Err(e)) => {
            warn!("{op:?} failed for {kind} '{}': {e}", record.principal_arn);
            outcome.failed.push(FailedAttachment {
                error: TunnelAccessError::AttachmentOperation {
                    kind,
                    arn: record.principal_arn.clone(),
                    source: e,
                },
                record,
            });
        }
    }
}
