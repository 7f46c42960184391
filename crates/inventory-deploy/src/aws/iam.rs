//! IAM execution-role handling.
//!
//! Sandboxed accounts (the usual home of this pipeline) ship a preexisting
//! role and forbid creating new ones, so the deployer prefers adopting that
//! role and only falls back to creating its own. A role this tool created
//! is torn down with it; an adopted role is never touched.

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info};

use super::context::AwsContext;
use super::error::is_not_found;

/// Managed policy granting CloudWatch Logs access to function code.
pub const BASIC_EXECUTION_POLICY_ARN: &str =
    "arn:aws:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole";

/// Trust policy letting the Lambda service assume the role.
pub const LAMBDA_TRUST_POLICY: &str = r#"{
  "Version": "2012-10-17",
  "Statement": [
    {
      "Effect": "Allow",
      "Principal": { "Service": "lambda.amazonaws.com" },
      "Action": "sts:AssumeRole"
    }
  ]
}"#;

/// Freshly created roles are not immediately visible to Lambda; creating a
/// function right away fails with an assume-role error.
const IAM_PROPAGATION_DELAY: Duration = Duration::from_secs(10);

/// The role the deployment will run its functions under.
pub struct ExecutionRole {
    pub arn: String,
    pub name: String,
    /// Whether this deploy created the role (and therefore owns it).
    pub created: bool,
}

pub struct IamClient {
    client: aws_sdk_iam::Client,
}

impl IamClient {
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.iam_client(),
        }
    }

    /// ARN of the named role, or None when it does not exist.
    pub async fn role_arn(&self, role: &str) -> Result<Option<String>> {
        match self.client.get_role().role_name(role).send().await {
            Ok(out) => Ok(out.role().map(|r| r.arn().to_string())),
            Err(err) if is_not_found(&err) => Ok(None),
            Err(err) => Err(err).with_context(|| format!("Failed to look up role {role}")),
        }
    }

    /// Resolve the execution role: adopt `preferred` when present, else
    /// adopt or create `fallback`.
    pub async fn ensure_execution_role(
        &self,
        preferred: &str,
        fallback: &str,
    ) -> Result<ExecutionRole> {
        if let Some(arn) = self.role_arn(preferred).await? {
            info!(role = %preferred, "Using preexisting execution role");
            return Ok(ExecutionRole {
                arn,
                name: preferred.to_string(),
                created: false,
            });
        }
        debug!(role = %preferred, "Preferred role not found");

        if let Some(arn) = self.role_arn(fallback).await? {
            info!(role = %fallback, "Execution role already exists, reusing");
            return Ok(ExecutionRole {
                arn,
                name: fallback.to_string(),
                created: false,
            });
        }

        let created = self
            .client
            .create_role()
            .role_name(fallback)
            .assume_role_policy_document(LAMBDA_TRUST_POLICY)
            .description("Execution role for the inventory pipeline functions")
            .send()
            .await
            .with_context(|| format!("Failed to create role {fallback}"))?;
        let arn = created
            .role()
            .map(|r| r.arn().to_string())
            .with_context(|| format!("CreateRole returned no role for {fallback}"))?;

        self.client
            .attach_role_policy()
            .role_name(fallback)
            .policy_arn(BASIC_EXECUTION_POLICY_ARN)
            .send()
            .await
            .with_context(|| format!("Failed to attach execution policy to {fallback}"))?;

        info!(role = %fallback, "Role created, waiting for IAM propagation");
        tokio::time::sleep(IAM_PROPAGATION_DELAY).await;

        Ok(ExecutionRole {
            arn,
            name: fallback.to_string(),
            created: true,
        })
    }

    /// Delete the role after stripping its inline and attached policies.
    /// Returns false when the role was already gone.
    pub async fn delete_role(&self, role: &str) -> Result<bool> {
        let mut marker: Option<String> = None;
        loop {
            let page = match self
                .client
                .list_role_policies()
                .role_name(role)
                .set_marker(marker.take())
                .send()
                .await
            {
                Ok(page) => page,
                Err(err) if is_not_found(&err) => return Ok(false),
                Err(err) => {
                    return Err(err)
                        .with_context(|| format!("Failed to list inline policies of {role}"))
                }
            };
            for policy in page.policy_names() {
                self.client
                    .delete_role_policy()
                    .role_name(role)
                    .policy_name(policy)
                    .send()
                    .await
                    .with_context(|| {
                        format!("Failed to delete inline policy {policy} from {role}")
                    })?;
            }
            if page.is_truncated() {
                marker = page.marker().map(str::to_string);
            } else {
                break;
            }
        }

        let mut marker: Option<String> = None;
        loop {
            let page = match self
                .client
                .list_attached_role_policies()
                .role_name(role)
                .set_marker(marker.take())
                .send()
                .await
            {
                Ok(page) => page,
                Err(err) if is_not_found(&err) => return Ok(false),
                Err(err) => {
                    return Err(err)
                        .with_context(|| format!("Failed to list attached policies of {role}"))
                }
            };
            for policy in page.attached_policies() {
                let Some(policy_arn) = policy.policy_arn() else {
                    continue;
                };
                self.client
                    .detach_role_policy()
                    .role_name(role)
                    .policy_arn(policy_arn)
                    .send()
                    .await
                    .with_context(|| {
                        format!("Failed to detach policy {policy_arn} from {role}")
                    })?;
            }
            if page.is_truncated() {
                marker = page.marker().map(str::to_string);
            } else {
                break;
            }
        }

        match self.client.delete_role().role_name(role).send().await {
            Ok(_) => {
                info!(%role, "Role deleted");
                Ok(true)
            }
            Err(err) if is_not_found(&err) => Ok(false),
            Err(err) => Err(err).with_context(|| format!("Failed to delete role {role}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trust_policy_names_the_lambda_service() {
        let parsed: serde_json::Value =
            serde_json::from_str(LAMBDA_TRUST_POLICY).expect("trust policy must be valid JSON");
        assert_eq!(
            parsed["Statement"][0]["Principal"]["Service"],
            "lambda.amazonaws.com"
        );
        assert_eq!(parsed["Statement"][0]["Action"], "sts:AssumeRole");
    }
}
