use aws_sdk_sts::Client as StsClient;

use crate::aws::{AwsError, AwsResult};

/// Identity of the calling account, from STS GetCallerIdentity.
#[derive(Debug, Clone)]
pub(crate) struct CallerIdentity {
    pub account_id: String,
    pub partition: String,
}

/// Resolve the caller's account id and partition. Both are needed to build
/// managed policy ARNs for lookup by name.
pub(crate) async fn caller_identity(client: &StsClient) -> AwsResult<CallerIdentity> {
    let out = client
        .get_caller_identity()
        .send()
        .await
        .map_err(|e| AwsError::SdkError(format!("STS GetCallerIdentity failed: {e}")))?;
    let account_id = out
        .account()
        .map(ToString::to_string)
        .ok_or_else(|| AwsError::SdkError("STS GetCallerIdentity missing Account".to_string()))?;
    let partition = out
        .arn()
        .and_then(|arn| arn.split(':').nth(1))
        .filter(|p| !p.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| AwsError::SdkError("STS GetCallerIdentity missing Arn".to_string()))?;
    Ok(CallerIdentity {
        account_id,
        partition,
    })
}
