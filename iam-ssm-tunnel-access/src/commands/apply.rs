//! Apply logic: provision the policy, then reconcile attachments.

use tokio_util::sync::CancellationToken;

use crate::aws::iam_api::IamApi;
use crate::error::TunnelAccessResult;
use crate::principal::PrincipalSet;
use crate::provision::ensure_policy;
use crate::reconcile::reconcile;
use crate::report::summarize;
use crate::types::PolicySpec;

use super::service::RunReport;

impl<C: IamApi> super::service::TunnelAccessService<C> {
    /// Provision the managed policy and converge its attachments on the
    /// declared principal set.
    ///
    /// Provisioning failures are fatal; per-principal attachment failures are
    /// captured in the report instead of aborting the run. The caller decides
    /// whether any failure constitutes an overall failed run.
    pub async fn apply(
        &self,
        spec: &PolicySpec,
        principals: &PrincipalSet,
        cancel: &CancellationToken,
    ) -> TunnelAccessResult<RunReport> {
        let policy = ensure_policy(&self.iam, spec).await?;
        let outcome =
            reconcile(&self.iam, &policy, principals, spec.attach_enabled, cancel).await?;
        let summary = summarize(&outcome);
        Ok(RunReport {
            policy_arn: policy.arn,
            outcome,
            summary,
        })
    }
}
