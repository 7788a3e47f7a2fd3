//! Error types for SSM tunnel access management.

use std::fmt;

use thiserror::Error;

use crate::aws::AwsError;
use crate::principal::PrincipalKind;

pub type TunnelAccessResult<T> = Result<T, TunnelAccessError>;

/// One declared ARN that failed validation, with the reason it was rejected.
#[derive(Debug)]
pub struct InvalidPrincipalRef {
    pub kind: PrincipalKind,
    pub value: String,
    pub reason: String,
}

impl fmt::Display for InvalidPrincipalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ARN '{}': {}", self.kind, self.value, self.reason)
    }
}

#[derive(Error, Debug)]
pub enum TunnelAccessError {
    /// Every invalid declared ARN, collected in one pass.
    #[error("invalid principal references: {}", format_refs(.0))]
    InvalidPrincipalRefs(Vec<InvalidPrincipalRef>),

    /// Could not create or locate the managed policy. Fatal to the run.
    #[error("failed to provision managed policy '{name}': {source}")]
    PolicyProvision {
        name: String,
        #[source]
        source: AwsError,
    },

    /// Reconciliation cannot begin without a usable policy ARN.
    #[error("cannot reconcile attachments: invalid policy ARN '{0}'")]
    InvalidPolicyArn(String),

    /// One attach/detach call failed for reasons other than already being in
    /// the desired state. Recorded per principal, never fatal to the batch.
    #[error("{kind} attachment operation failed for '{arn}': {source}")]
    AttachmentOperation {
        kind: PrincipalKind,
        arn: String,
        #[source]
        source: AwsError,
    },

    /// The run was cancelled mid-flight; the outcome reflects only what
    /// completed before the cancellation was observed.
    #[error("reconciliation cancelled before completion")]
    Cancelled,

    #[error(transparent)]
    Aws(#[from] AwsError),
}

fn format_refs(refs: &[InvalidPrincipalRef]) -> String {
    refs.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_refs_message_names_every_offender() {
        let err = TunnelAccessError::InvalidPrincipalRefs(vec![
            InvalidPrincipalRef {
                kind: PrincipalKind::User,
                value: "not-an-arn".to_string(),
                reason: "not an ARN".to_string(),
            },
            InvalidPrincipalRef {
                kind: PrincipalKind::Group,
                value: "arn:aws:iam::123456789012:user/alice".to_string(),
                reason: "resource must start with 'group/'".to_string(),
            },
        ]);
        let msg = err.to_string();
        assert!(msg.contains("not-an-arn"), "message was: {msg}");
        assert!(msg.contains("user/alice"), "message was: {msg}");
        assert!(msg.contains("group/"), "message was: {msg}");
    }

    #[test]
    fn cancelled_message_names_the_interruption() {
        assert_eq!(
            TunnelAccessError::Cancelled.to_string(),
            "reconciliation cancelled before completion"
        );
    }
}
