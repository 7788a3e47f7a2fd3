//! Core library for SSM Session Manager tunnel access management:
//! - declared principal validation (users, roles, groups)
//! - idempotent managed policy provisioning
//! - attach/detach reconciliation with per-principal outcome capture
//!

pub mod aws;
mod commands;
mod document;
mod error;
mod principal;
mod provision;
mod reconcile;
mod report;
mod types;

// Re-exports for a small, focused public API
pub use aws::iam_api::IamApi;
pub use aws::iam_client::SdkIamClient;
pub use aws::{AwsError, AwsResult};
pub use commands::{RunReport, TunnelAccessService};
pub use document::tunnel_policy_document;
pub use error::{InvalidPrincipalRef, TunnelAccessError, TunnelAccessResult};
pub use principal::{principal_name, PrincipalKind, PrincipalRef, PrincipalSet};
pub use provision::ensure_policy;
pub use reconcile::reconcile;
pub use report::{summarize, ReconciliationSummary};
pub use types::{
    AttachmentOp, AttachmentRecord, FailedAttachment, KindFailure, ManagedPolicy, PolicySpec,
    ReconciliationOutcome,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_policy_name_joins_env_and_prefix() {
        let spec = PolicySpec {
            name_prefix: "ssm-tunnel-access".to_string(),
            env_name: "staging".to_string(),
            document: serde_json::json!({}),
            attach_enabled: true,
        };
        assert_eq!(spec.resolved_name(), "staging-ssm-tunnel-access");
    }
}
