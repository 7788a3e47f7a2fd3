//! AWS IAM client wrapper implementing the backend trait over the live API.

use async_trait::async_trait;
use aws_sdk_iam::error::ProvideErrorMetadata;
use aws_sdk_iam::types::EntityType;
use aws_sdk_iam::Client as IamClient;
use serde_json::Value;

use crate::aws::iam_api::IamApi;
use crate::aws::{AwsError, AwsResult};
use crate::principal::{principal_name, PrincipalKind};
use crate::types::ManagedPolicy;

pub struct SdkIamClient {
    client: IamClient,
    account_id: String,
    partition: String,
}

impl SdkIamClient {
    pub fn new(
        client: IamClient,
        account_id: impl Into<String>,
        partition: impl Into<String>,
    ) -> Self {
        Self {
            client,
            account_id: account_id.into(),
            partition: partition.into(),
        }
    }

    fn policy_arn_for(&self, name: &str) -> String {
        format!(
            "arn:{}:iam::{}:policy/{}",
            self.partition, self.account_id, name
        )
    }

    /// ListEntitiesForPolicy reports names only; reconstruct path-less ARNs.
    fn principal_arn_for(&self, kind: PrincipalKind, name: &str) -> String {
        format!(
            "arn:{}:iam::{}:{}{}",
            self.partition,
            self.account_id,
            kind.arn_resource_prefix(),
            name
        )
    }

    async fn fetch_document(&self, policy_arn: &str, version_id: &str) -> AwsResult<Value> {
        let resp = self
            .client
            .get_policy_version()
            .policy_arn(policy_arn)
            .version_id(version_id)
            .send()
            .await
            .map_err(|e| {
                classify(
                    e.code(),
                    format!("GetPolicyVersion failed for '{policy_arn}': {e}"),
                )
            })?;
        let encoded = resp
            .policy_version()
            .and_then(|v| v.document())
            .ok_or_else(|| {
                AwsError::IamError(format!("policy version for '{policy_arn}' has no document"))
            })?;
        // AWS returns URL-encoded JSON
        let decoded = percent_encoding::percent_decode_str(encoded)
            .decode_utf8()
            .map_err(|e| AwsError::IamError(format!("failed to URL decode policy document: {e}")))?;
        serde_json::from_str(&decoded)
            .map_err(|e| AwsError::IamError(format!("failed to parse policy document JSON: {e}")))
    }
}

/// Follow-up marker for a paginated listing. A truncated response that
/// carries no marker cannot be followed, so it is treated as the last page
/// rather than re-issuing an identical request forever.
fn next_marker(is_truncated: bool, marker: Option<&str>) -> Option<String> {
    if is_truncated {
        marker.map(ToString::to_string)
    } else {
        None
    }
}

/// Map the two "already in desired state" IAM error codes to their own
/// variants so callers can tolerate them specifically.
fn classify(code: Option<&str>, detail: String) -> AwsError {
    match code {
        Some("EntityAlreadyExists") => AwsError::AlreadyExists,
        Some("NoSuchEntity") => AwsError::NoSuchEntity,
        _ => AwsError::IamError(detail),
    }
}

#[async_trait]
impl IamApi for SdkIamClient {
    async fn find_policy_by_name(&self, name: &str) -> AwsResult<Option<ManagedPolicy>> {
        let arn = self.policy_arn_for(name);
        let resp = match self.client.get_policy().policy_arn(&arn).send().await {
            Ok(resp) => resp,
            Err(e) => {
                return match classify(e.code(), format!("GetPolicy failed for '{arn}': {e}")) {
                    AwsError::NoSuchEntity => Ok(None),
                    other => Err(other),
                }
            }
        };
        let Some(policy) = resp.policy() else {
            return Ok(None);
        };
        let version_id = policy.default_version_id().unwrap_or("v1");
        let document = self.fetch_document(&arn, version_id).await?;
        Ok(Some(ManagedPolicy {
            arn: policy.arn().unwrap_or(&arn).to_string(),
            name: policy.policy_name().unwrap_or(name).to_string(),
            document,
        }))
    }

    async fn create_policy(&self, name: &str, document: &Value) -> AwsResult<ManagedPolicy> {
        let body = serde_json::to_string(document)
            .map_err(|e| AwsError::IamError(format!("failed to serialize policy document: {e}")))?;
        let resp = self
            .client
            .create_policy()
            .policy_name(name)
            .policy_document(body)
            .description("SSM Session Manager tunnel access")
            .send()
            .await
            .map_err(|e| classify(e.code(), format!("CreatePolicy failed for '{name}': {e}")))?;
        let arn = resp
            .policy()
            .and_then(|p| p.arn())
            .map(ToString::to_string)
            .ok_or_else(|| {
                AwsError::IamError(format!("CreatePolicy for '{name}' returned no ARN"))
            })?;
        Ok(ManagedPolicy {
            arn,
            name: name.to_string(),
            document: document.clone(),
        })
    }

    async fn delete_policy(&self, policy_arn: &str) -> AwsResult<()> {
        self.client
            .delete_policy()
            .policy_arn(policy_arn)
            .send()
            .await
            .map_err(|e| {
                classify(
                    e.code(),
                    format!("DeletePolicy failed for '{policy_arn}': {e}"),
                )
            })?;
        Ok(())
    }

    async fn list_attached_principals(
        &self,
        policy_arn: &str,
        kind: PrincipalKind,
    ) -> AwsResult<Vec<String>> {
        let filter = match kind {
            PrincipalKind::User => EntityType::User,
            PrincipalKind::Role => EntityType::Role,
            PrincipalKind::Group => EntityType::Group,
        };
        let mut arns = Vec::new();
        let mut marker: Option<String> = None;
        loop {
            let mut req = self
                .client
                .list_entities_for_policy()
                .policy_arn(policy_arn)
                .entity_filter(filter.clone());
            if let Some(m) = &marker {
                req = req.marker(m);
            }
            let resp = req.send().await.map_err(|e| {
                classify(
                    e.code(),
                    format!("ListEntitiesForPolicy failed for '{policy_arn}': {e}"),
                )
            })?;
            match kind {
                PrincipalKind::User => arns.extend(
                    resp.policy_users()
                        .iter()
                        .filter_map(|u| u.user_name())
                        .map(|n| self.principal_arn_for(kind, n)),
                ),
                PrincipalKind::Role => arns.extend(
                    resp.policy_roles()
                        .iter()
                        .filter_map(|r| r.role_name())
                        .map(|n| self.principal_arn_for(kind, n)),
                ),
                PrincipalKind::Group => arns.extend(
                    resp.policy_groups()
                        .iter()
                        .filter_map(|g| g.group_name())
                        .map(|n| self.principal_arn_for(kind, n)),
                ),
            }
            match next_marker(resp.is_truncated(), resp.marker()) {
                Some(m) => marker = Some(m),
                None => break,
            }
        }
        Ok(arns)
    }

    async fn attach_policy(
        &self,
        kind: PrincipalKind,
        principal_arn: &str,
        policy_arn: &str,
    ) -> AwsResult<()> {
        let name = principal_name(principal_arn);
        match kind {
            PrincipalKind::User => self
                .client
                .attach_user_policy()
                .user_name(name)
                .policy_arn(policy_arn)
                .send()
                .await
                .map(|_| ())
                .map_err(|e| {
                    classify(e.code(), format!("AttachUserPolicy failed for '{name}': {e}"))
                }),
            PrincipalKind::Role => self
                .client
                .attach_role_policy()
                .role_name(name)
                .policy_arn(policy_arn)
                .send()
                .await
                .map(|_| ())
                .map_err(|e| {
                    classify(e.code(), format!("AttachRolePolicy failed for '{name}': {e}"))
                }),
            PrincipalKind::Group => self
                .client
                .attach_group_policy()
                .group_name(name)
                .policy_arn(policy_arn)
                .send()
                .await
                .map(|_| ())
                .map_err(|e| {
                    classify(e.code(), format!("AttachGroupPolicy failed for '{name}': {e}"))
                }),
        }
    }

    async fn detach_policy(
        &self,
        kind: PrincipalKind,
        principal_arn: &str,
        policy_arn: &str,
    ) -> AwsResult<()> {
        let name = principal_name(principal_arn);
        match kind {
            PrincipalKind::User => self
                .client
                .detach_user_policy()
                .user_name(name)
                .policy_arn(policy_arn)
                .send()
                .await
                .map(|_| ())
                .map_err(|e| {
                    classify(e.code(), format!("DetachUserPolicy failed for '{name}': {e}"))
                }),
            PrincipalKind::Role => self
                .client
                .detach_role_policy()
                .role_name(name)
                .policy_arn(policy_arn)
                .send()
                .await
                .map(|_| ())
                .map_err(|e| {
                    classify(e.code(), format!("DetachRolePolicy failed for '{name}': {e}"))
                }),
            PrincipalKind::Group => self
                .client
                .detach_group_policy()
                .group_name(name)
                .policy_arn(policy_arn)
                .send()
                .await
                .map(|_| ())
                .map_err(|e| {
                    classify(e.code(), format!("DetachGroupPolicy failed for '{name}': {e}"))
                }),
        }
    }
}
