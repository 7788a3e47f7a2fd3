//! Principal references and the declared principal set.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::error::{InvalidPrincipalRef, TunnelAccessError, TunnelAccessResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PrincipalKind {
    User,
    Role,
    Group,
}

impl PrincipalKind {
    pub const ALL: [Self; 3] = [Self::User, Self::Role, Self::Group];

    pub(crate) fn arn_resource_prefix(self) -> &'static str {
        match self {
            Self::User => "user/",
            Self::Role => "role/",
            Self::Group => "group/",
        }
    }
}

impl fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::User => "user",
            Self::Role => "role",
            Self::Group => "group",
        };
        f.write_str(s)
    }
}

/// A validated reference to one IAM principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrincipalRef {
    pub kind: PrincipalKind,
    pub arn: String,
}

impl PrincipalRef {
    /// The principal's IAM name, the last path segment of the ARN.
    #[must_use]
    pub fn name(&self) -> &str {
        principal_name(&self.arn)
    }
}

/// Last path segment of an IAM principal ARN. IAM names are unique per
/// account and kind, so this is a stable key even when the ARN carries a path.
#[must_use]
pub fn principal_name(arn: &str) -> &str {
    arn.rsplit('/').next().unwrap_or(arn)
}

/// The declared attachment targets, partitioned by kind.
///
/// Built once per run; duplicates within a kind collapse silently and
/// insertion order is preserved for deterministic reporting.
#[derive(Debug, Clone, Default)]
pub struct PrincipalSet {
    users: Vec<PrincipalRef>,
    roles: Vec<PrincipalRef>,
    groups: Vec<PrincipalRef>,
}

impl PrincipalSet {
    /// Validate and partition the declared ARNs.
    ///
    /// Validation does not fail fast: every invalid entry is collected and
    /// reported together in a single `InvalidPrincipalRefs` error.
    pub fn new(
        users: impl IntoIterator<Item = String>,
        roles: impl IntoIterator<Item = String>,
        groups: impl IntoIterator<Item = String>,
    ) -> TunnelAccessResult<Self> {
        let mut invalid = Vec::new();
        let users = collect_kind(PrincipalKind::User, users, &mut invalid);
        let roles = collect_kind(PrincipalKind::Role, roles, &mut invalid);
        let groups = collect_kind(PrincipalKind::Group, groups, &mut invalid);
        if !invalid.is_empty() {
            return Err(TunnelAccessError::InvalidPrincipalRefs(invalid));
        }
        Ok(Self {
            users,
            roles,
            groups,
        })
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn of_kind(&self, kind: PrincipalKind) -> &[PrincipalRef] {
        match kind {
            PrincipalKind::User => &self.users,
            PrincipalKind::Role => &self.roles,
            PrincipalKind::Group => &self.groups,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len() + self.roles.len() + self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn collect_kind(
    kind: PrincipalKind,
    arns: impl IntoIterator<Item = String>,
    invalid: &mut Vec<InvalidPrincipalRef>,
) -> Vec<PrincipalRef> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for arn in arns {
        if let Err(reason) = validate_arn(kind, &arn) {
            invalid.push(InvalidPrincipalRef {
                kind,
                value: arn,
                reason,
            });
            continue;
        }
        if seen.insert(arn.clone()) {
            out.push(PrincipalRef { kind, arn });
        }
    }
    out
}

/// Check that `arn` is a syntactically valid IAM principal ARN of the given
/// kind: `arn:{partition}:iam::{12-digit-account}:{kind}/[{path}/]{name}`.
fn validate_arn(kind: PrincipalKind, arn: &str) -> Result<(), String> {
    let parts: Vec<&str> = arn.splitn(6, ':').collect();
    if parts.len() != 6 || parts[0] != "arn" {
        return Err("not an ARN".to_string());
    }
    if parts[1].is_empty() {
        return Err("missing partition".to_string());
    }
    if parts[2] != "iam" {
        return Err(format!("service is '{}', expected 'iam'", parts[2]));
    }
    if !parts[3].is_empty() {
        return Err("IAM ARNs carry no region".to_string());
    }
    let account = parts[4];
    if account.len() != 12 || !account.chars().all(|c| c.is_ascii_digit()) {
        return Err("account id must be 12 digits".to_string());
    }
    let prefix = kind.arn_resource_prefix();
    let Some(rest) = parts[5].strip_prefix(prefix) else {
        return Err(format!("resource must start with '{prefix}'"));
    };
    if rest.is_empty() || rest.ends_with('/') {
        return Err("principal name is empty".to_string());
    }
    Ok(())
}
