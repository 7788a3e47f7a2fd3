//! Destroy logic: detach everything, then delete the managed policy.

use log::info;
use tokio_util::sync::CancellationToken;

use crate::aws::iam_api::IamApi;
use crate::aws::AwsError;
use crate::error::{TunnelAccessError, TunnelAccessResult};
use crate::principal::PrincipalSet;
use crate::reconcile::reconcile;
use crate::report::summarize;
use crate::types::PolicySpec;

use super::service::RunReport;

impl<C: IamApi> super::service::TunnelAccessService<C> {
    /// Remove the managed policy and every attachment it still has.
    ///
    /// A policy that does not exist is treated as already destroyed and
    /// yields `None`. When detaching leaves failures behind, the policy is
    /// kept (deleting would fail while attachments remain) and the report
    /// carries the partial outcome.
    pub async fn destroy(
        &self,
        spec: &PolicySpec,
        cancel: &CancellationToken,
    ) -> TunnelAccessResult<Option<RunReport>> {
        let name = spec.resolved_name();
        let Some(policy) = self.iam.find_policy_by_name(&name).await? else {
            info!("managed policy '{name}' does not exist, nothing to destroy");
            return Ok(None);
        };
        let outcome = reconcile(&self.iam, &policy, &PrincipalSet::empty(), false, cancel).await?;
        if outcome.has_failures() || outcome.cancelled {
            let summary = summarize(&outcome);
            return Ok(Some(RunReport {
                policy_arn: policy.arn,
                outcome,
                summary,
            }));
        }
        match self.iam.delete_policy(&policy.arn).await {
            Ok(()) | Err(AwsError::NoSuchEntity) => {}
            Err(e) => return Err(TunnelAccessError::Aws(e)),
        }
        info!("deleted managed policy '{name}' ({})", policy.arn);
        let summary = summarize(&outcome);
        Ok(Some(RunReport {
            policy_arn: policy.arn,
            outcome,
            summary,
        }))
    }
}
