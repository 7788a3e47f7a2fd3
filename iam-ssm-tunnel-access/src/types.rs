//! Shared data model for policy provisioning and attachment reconciliation.

use serde::Serialize;
use serde_json::Value;

use crate::aws::AwsError;
use crate::error::TunnelAccessError;
use crate::principal::PrincipalKind;

/// Declared configuration for one reconciliation run. Read-only after
/// construction.
#[derive(Debug, Clone)]
pub struct PolicySpec {
    pub name_prefix: String,
    pub env_name: String,
    /// Policy-language JSON document, opaque to the core.
    pub document: Value,
    pub attach_enabled: bool,
}

impl PolicySpec {
    /// The resolved managed policy name, `{env_name}-{name_prefix}`.
    #[must_use]
    pub fn resolved_name(&self) -> String {
        format!("{}-{}", self.env_name, self.name_prefix)
    }
}

/// The managed policy as created or discovered during provisioning. Its
/// `arn` is the only state the reconciler consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManagedPolicy {
    pub arn: String,
    pub name: String,
    pub document: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AttachmentOp {
    Attach,
    Detach,
}

/// One edge in the desired-vs-actual attachment graph: a desired-only edge
/// yields an attach operation, an actual-only edge a detach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentRecord {
    pub kind: PrincipalKind,
    pub principal_arn: String,
    pub policy_arn: String,
    pub op: AttachmentOp,
}

#[derive(Debug)]
pub struct FailedAttachment {
    pub record: AttachmentRecord,
    pub error: TunnelAccessError,
}

/// A failed actual-state fetch for one kind. The other kinds reconcile
/// independently.
#[derive(Debug)]
pub struct KindFailure {
    pub kind: PrincipalKind,
    pub error: AwsError,
}

/// Aggregated result of one reconciliation run, built incrementally during
/// apply. Never persisted.
#[derive(Debug, Default)]
pub struct ReconciliationOutcome {
    pub attempted: Vec<AttachmentRecord>,
    pub succeeded: Vec<AttachmentRecord>,
    pub failed: Vec<FailedAttachment>,
    pub kind_failures: Vec<KindFailure>,
    /// True when the run was cancelled before every operation was issued.
    pub cancelled: bool,
}

impl ReconciliationOutcome {
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty() || !self.kind_failures.is_empty()
    }
}
