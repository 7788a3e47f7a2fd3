//! Idempotent create-or-verify of the managed policy.

use log::{debug, info};

use crate::aws::iam_api::IamApi;
use crate::aws::AwsError;
use crate::error::{TunnelAccessError, TunnelAccessResult};
use crate::types::{ManagedPolicy, PolicySpec};

/// Ensure exactly one managed policy exists with the spec's resolved name.
///
/// An existing policy's document is authoritative; the declared document is
/// only used when the policy has to be created. Document drift is not
/// reconciled.
pub async fn ensure_policy<C: IamApi + ?Sized>(
    client: &C,
    spec: &PolicySpec,
) -> TunnelAccessResult<ManagedPolicy> {
    let name = spec.resolved_name();
    if let Some(existing) = client
        .find_policy_by_name(&name)
        .await
        .map_err(|e| provision_error(&name, e))?
    {
        debug!("managed policy '{name}' already exists as {}", existing.arn);
        return Ok(existing);
    }
    match client.create_policy(&name, &spec.document).await {
        Ok(policy) => {
            info!("created managed policy '{name}' as {}", policy.arn);
            Ok(policy)
        }
        // Lost a create race between lookup and create. The existing policy
        // wins; re-fetch and return it.
        Err(AwsError::AlreadyExists) => client
            .find_policy_by_name(&name)
            .await
            .map_err(|e| provision_error(&name, e))?
            .ok_or_else(|| {
                provision_error(
                    &name,
                    AwsError::IamError(
                        "policy reported as existing but lookup found nothing".to_string(),
                    ),
                )
            }),
        Err(e) => Err(provision_error(&name, e)),
    }
}

fn provision_error(name: &str, source: AwsError) -> TunnelAccessError {
    TunnelAccessError::PolicyProvision {
        name: name.to_string(),
        source,
    }
}
