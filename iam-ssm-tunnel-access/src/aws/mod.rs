//! AWS SDK integration: backend capability trait, IAM client wrapper, caller
//! identity.

pub mod iam_api;
pub mod iam_client;
pub(crate) mod sts;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AwsError {
    #[error("IAM client error: {0}")]
    IamError(String),
    /// The entity already exists or the policy is already attached. Tolerated
    /// by the provisioner's create race and by attach idempotency.
    #[error("entity already exists or is already attached")]
    AlreadyExists,
    /// The entity does not exist or the policy is not attached. Tolerated by
    /// detach idempotency.
    #[error("no such entity or attachment")]
    NoSuchEntity,
    #[error("AWS SDK error: {0}")]
    SdkError(String),
}

pub type AwsResult<T> = Result<T, AwsError>;
