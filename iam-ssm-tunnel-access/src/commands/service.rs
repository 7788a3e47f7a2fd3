//! Tunnel access service layer.
//!
//! Holds the IAM backend and provides the high-level operations (apply,
//! destroy) used by adapters such as the CLI. The backend is an injected
//! capability, so tests run the same operations against an in-memory IAM.

use aws_sdk_iam::Client as IamClient;
use aws_sdk_sts::Client as StsClient;

use crate::aws::iam_api::IamApi;
use crate::aws::iam_client::SdkIamClient;
use crate::aws::sts::caller_identity;
use crate::error::TunnelAccessResult;
use crate::report::ReconciliationSummary;
use crate::types::ReconciliationOutcome;

/// High-level result of one run: the policy ARN output plus the per-principal
/// outcome and its summary.
#[derive(Debug)]
pub struct RunReport {
    pub policy_arn: String,
    pub outcome: ReconciliationOutcome,
    pub summary: ReconciliationSummary,
}

pub struct TunnelAccessService<C: IamApi = SdkIamClient> {
    pub(crate) iam: C,
}

impl TunnelAccessService<SdkIamClient> {
    /// Create a service instance backed by the live IAM API.
    ///
    /// Configuration is loaded from the default credential provider chain
    /// (which honors endpoint overrides such as `AWS_ENDPOINT_URL`). The
    /// caller's account id and partition are probed once via STS so managed
    /// policies can be looked up by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the STS identity probe fails.
    pub async fn new() -> TunnelAccessResult<Self> {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .load()
            .await;
        let sts = StsClient::new(&config);
        let identity = caller_identity(&sts).await?;
        Ok(Self {
            iam: SdkIamClient::new(
                IamClient::new(&config),
                identity.account_id,
                identity.partition,
            ),
        })
    }
}

impl<C: IamApi> TunnelAccessService<C> {
    /// Create a service instance over an arbitrary IAM backend.
    pub fn with_client(iam: C) -> Self {
        Self { iam }
    }

    // apply() method implementation is in apply.rs
    // destroy() method implementation is in destroy.rs
}
