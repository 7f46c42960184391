//! AWS account identity
//!
//! The API Gateway permission grant needs the caller's account id in its
//! source ARN, so every deploy resolves it once up front. Doubles as a
//! credential check before any resource is touched.

use anyhow::{Context, Result};
use tracing::info;

use super::context::AwsContext;

/// Strongly-typed AWS account ID (12-digit string)
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display, derive_more::Deref)]
pub struct AccountId(String);

impl AccountId {
    #[cfg(test)]
    pub fn new(s: String) -> Self {
        AccountId(s)
    }
}

/// Fetch the current AWS account ID via STS GetCallerIdentity.
///
/// Requires no special permissions; it succeeds whenever the credentials
/// are valid, which makes it a cheap early failure point for bad setups.
pub async fn get_current_account_id(ctx: &AwsContext) -> Result<AccountId> {
    let identity = ctx
        .sts_client()
        .get_caller_identity()
        .send()
        .await
        .context("Failed to get AWS caller identity - check credentials")?;

    let account = identity
        .account()
        .context("No account ID returned from STS GetCallerIdentity")?;

    info!(account_id = %account, "AWS account validated");

    Ok(AccountId(account.to_string()))
}
