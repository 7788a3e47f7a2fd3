//! Backend capability trait for the IAM operations the core needs.
//!
//! The provisioner and reconciler only ever see this trait, so tests can
//! substitute an in-memory backend for the live IAM API.

use async_trait::async_trait;
use serde_json::Value;

use crate::aws::AwsResult;
use crate::principal::PrincipalKind;
use crate::types::ManagedPolicy;

#[async_trait]
pub trait IamApi: Send + Sync {
    /// Look up a customer managed policy by name. `None` when absent.
    async fn find_policy_by_name(&self, name: &str) -> AwsResult<Option<ManagedPolicy>>;

    /// Create a managed policy with the given document.
    async fn create_policy(&self, name: &str, document: &Value) -> AwsResult<ManagedPolicy>;

    /// Delete a managed policy.
    async fn delete_policy(&self, policy_arn: &str) -> AwsResult<()>;

    /// ARNs of the principals of one kind the policy is attached to.
    async fn list_attached_principals(
        &self,
        policy_arn: &str,
        kind: PrincipalKind,
    ) -> AwsResult<Vec<String>>;

    /// Attach the policy to one principal.
    async fn attach_policy(
        &self,
        kind: PrincipalKind,
        principal_arn: &str,
        policy_arn: &str,
    ) -> AwsResult<()>;

    /// Detach the policy from one principal.
    async fn detach_policy(
        &self,
        kind: PrincipalKind,
        principal_arn: &str,
        policy_arn: &str,
    ) -> AwsResult<()>;
}
