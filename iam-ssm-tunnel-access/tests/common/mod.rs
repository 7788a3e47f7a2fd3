//! In-memory IAM backend for scenario tests: a policy store, an attachment
//! set, failure-injection knobs, and a call log for ordering assertions.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use iam_ssm_tunnel_access::{
    principal_name, AwsError, AwsResult, IamApi, ManagedPolicy, PrincipalKind,
};

pub const ACCOUNT: &str = "123456789012";

#[derive(Default)]
pub struct FakeIam {
    state: Mutex<FakeState>,
}

#[derive(Default)]
pub struct FakeState {
    /// Managed policies keyed by name.
    pub policies: BTreeMap<String, ManagedPolicy>,
    /// (kind, principal name, policy arn) attachment edges.
    pub attachments: BTreeSet<(PrincipalKind, String, String)>,
    /// Kinds whose attachment listing fails.
    pub fail_list_kinds: BTreeSet<PrincipalKind>,
    /// Principal names whose attach call fails hard.
    pub fail_attach_names: BTreeSet<String>,
    /// Principal names whose attach call reports an existing attachment.
    pub conflict_attach_names: BTreeSet<String>,
    /// Principal names whose detach call reports a missing attachment.
    pub conflict_detach_names: BTreeSet<String>,
    /// Cancelled when the next attach call lands, while that call is still
    /// allowed to complete.
    pub cancel_on_attach: Option<CancellationToken>,
    /// Lose exactly one create race: the policy appears, but create errors.
    pub create_conflict: bool,
    /// Policy lookup fails hard.
    pub fail_find: bool,
    pub calls: Vec<String>,
}

impl FakeIam {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn policy_arn(name: &str) -> String {
        format!("arn:aws:iam::{ACCOUNT}:policy/{name}")
    }

    pub fn configure(&self, f: impl FnOnce(&mut FakeState)) {
        f(&mut self.state.lock().expect("state poisoned"));
    }

    pub fn inspect<T>(&self, f: impl FnOnce(&FakeState) -> T) -> T {
        f(&self.state.lock().expect("state poisoned"))
    }

    pub fn insert_policy(&self, name: &str, document: Value) -> ManagedPolicy {
        let policy = ManagedPolicy {
            arn: Self::policy_arn(name),
            name: name.to_string(),
            document,
        };
        self.configure(|s| {
            s.policies.insert(name.to_string(), policy.clone());
        });
        policy
    }

    pub fn insert_attachment(&self, kind: PrincipalKind, name: &str, policy_arn: &str) {
        self.configure(|s| {
            s.attachments
                .insert((kind, name.to_string(), policy_arn.to_string()));
        });
    }

    pub fn attached_names(&self, kind: PrincipalKind) -> Vec<String> {
        self.inspect(|s| {
            s.attachments
                .iter()
                .filter(|(k, _, _)| *k == kind)
                .map(|(_, name, _)| name.clone())
                .collect()
        })
    }

    pub fn attachment_count(&self) -> usize {
        self.inspect(|s| s.attachments.len())
    }

    pub fn calls(&self) -> Vec<String> {
        self.inspect(|s| s.calls.clone())
    }
}

#[async_trait]
impl IamApi for FakeIam {
    async fn find_policy_by_name(&self, name: &str) -> AwsResult<Option<ManagedPolicy>> {
        let mut state = self.state.lock().expect("state poisoned");
        state.calls.push(format!("find {name}"));
        if state.fail_find {
            return Err(AwsError::IamError("injected find failure".to_string()));
        }
        Ok(state.policies.get(name).cloned())
    }

    async fn create_policy(&self, name: &str, document: &Value) -> AwsResult<ManagedPolicy> {
        let mut state = self.state.lock().expect("state poisoned");
        state.calls.push(format!("create {name}"));
        let policy = ManagedPolicy {
            arn: Self::policy_arn(name),
            name: name.to_string(),
            document: document.clone(),
        };
        if state.create_conflict {
            state.create_conflict = false;
            state.policies.insert(name.to_string(), policy);
            return Err(AwsError::AlreadyExists);
        }
        if state.policies.contains_key(name) {
            return Err(AwsError::AlreadyExists);
        }
        state.policies.insert(name.to_string(), policy.clone());
        Ok(policy)
    }

    async fn delete_policy(&self, policy_arn: &str) -> AwsResult<()> {
        let mut state = self.state.lock().expect("state poisoned");
        state.calls.push(format!("delete {policy_arn}"));
        let Some(name) = state
            .policies
            .iter()
            .find(|(_, p)| p.arn == policy_arn)
            .map(|(name, _)| name.clone())
        else {
            return Err(AwsError::NoSuchEntity);
        };
        if state.attachments.iter().any(|(_, _, arn)| arn == policy_arn) {
            return Err(AwsError::IamError(
                "DeleteConflict: policy still attached".to_string(),
            ));
        }
        state.policies.remove(&name);
        Ok(())
    }

    async fn list_attached_principals(
        &self,
        policy_arn: &str,
        kind: PrincipalKind,
    ) -> AwsResult<Vec<String>> {
        let mut state = self.state.lock().expect("state poisoned");
        state.calls.push(format!("list {kind}"));
        if state.fail_list_kinds.contains(&kind) {
            return Err(AwsError::IamError("injected list failure".to_string()));
        }
        Ok(state
            .attachments
            .iter()
            .filter(|(k, _, arn)| *k == kind && arn == policy_arn)
            .map(|(_, name, _)| format!("arn:aws:iam::{ACCOUNT}:{kind}/{name}"))
            .collect())
    }

    async fn attach_policy(
        &self,
        kind: PrincipalKind,
        principal_arn: &str,
        policy_arn: &str,
    ) -> AwsResult<()> {
        let name = principal_name(principal_arn).to_string();
        let mut state = self.state.lock().expect("state poisoned");
        state.calls.push(format!("attach {kind} {name}"));
        if let Some(token) = state.cancel_on_attach.take() {
            token.cancel();
        }
        if state.fail_attach_names.contains(&name) {
            return Err(AwsError::SdkError("injected attach failure".to_string()));
        }
        let edge = (kind, name.clone(), policy_arn.to_string());
        if state.conflict_attach_names.contains(&name) {
            state.attachments.insert(edge);
            return Err(AwsError::AlreadyExists);
        }
        if !state.attachments.insert(edge) {
            return Err(AwsError::AlreadyExists);
        }
        Ok(())
    }

    async fn detach_policy(
        &self,
        kind: PrincipalKind,
        principal_arn: &str,
        policy_arn: &str,
    ) -> AwsResult<()> {
        let name = principal_name(principal_arn).to_string();
        let mut state = self.state.lock().expect("state poisoned");
        state.calls.push(format!("detach {kind} {name}"));
        let edge = (kind, name.clone(), policy_arn.to_string());
        if state.conflict_detach_names.contains(&name) {
            state.attachments.remove(&edge);
            return Err(AwsError::NoSuchEntity);
        }
        if !state.attachments.remove(&edge) {
            return Err(AwsError::NoSuchEntity);
        }
        Ok(())
    }
}
