//! Lambda function lifecycle, invoke permissions, and stream mappings.
//!
//! Functions are custom-runtime binaries: `provided.al2023` with a
//! `bootstrap` handler, uploaded as zip archives. Re-deploys adopt the
//! existing function and push fresh code and configuration instead of
//! failing on the name collision.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::{
    Environment, EventSourcePosition, FunctionCode, LastUpdateStatus, Runtime, State,
};
use tracing::{info, warn};

use super::context::AwsContext;
use super::error::{is_already_exists, is_not_found};
use crate::wait::{wait_until, WaitConfig};

/// Records pulled off the table stream per notifier invocation.
const STREAM_BATCH_SIZE: i32 = 100;

/// Lambda finishes ingesting new code asynchronously; pushing configuration
/// on its heels triggers a conflict.
const CODE_SETTLE_DELAY: Duration = Duration::from_secs(3);

/// Everything needed to create or refresh one function, code aside.
pub struct FunctionSpec {
    pub name: &'static str,
    pub memory_mb: i32,
    pub timeout_secs: i32,
    pub env: HashMap<String, String>,
}

/// Result of [`LambdaClient::ensure_function`].
pub struct EnsuredFunction {
    pub arn: String,
    /// Whether this call created the function.
    pub created: bool,
}

/// Point-in-time function state for the validation report.
pub struct FunctionSummary {
    pub state: String,
    pub runtime: String,
    pub memory_mb: i32,
    pub timeout_secs: i32,
}

pub struct LambdaClient {
    client: aws_sdk_lambda::Client,
}

impl LambdaClient {
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.lambda_client(),
        }
    }

    /// Create the function, or refresh the existing one with the given code
    /// and configuration.
    pub async fn ensure_function(
        &self,
        spec: &FunctionSpec,
        role_arn: &str,
        zip: &[u8],
    ) -> Result<EnsuredFunction> {
        let name = spec.name;
        let attempt = self
            .client
            .create_function()
            .function_name(name)
            .runtime(Runtime::Providedal2023)
            .handler("bootstrap")
            .role(role_arn)
            .code(FunctionCode::builder().zip_file(Blob::new(zip)).build())
            .memory_size(spec.memory_mb)
            .timeout(spec.timeout_secs)
            .environment(
                Environment::builder()
                    .set_variables(Some(spec.env.clone()))
                    .build(),
            )
            .send()
            .await;

        match attempt {
            Ok(out) => {
                let arn = out
                    .function_arn()
                    .map(str::to_string)
                    .with_context(|| format!("CreateFunction returned no ARN for {name}"))?;
                info!(function = %name, "Function created");
                Ok(EnsuredFunction { arn, created: true })
            }
            Err(err) if is_already_exists(&err) => {
                info!(function = %name, "Function already exists, refreshing");
                let arn = self.refresh_function(spec, role_arn, zip).await?;
                Ok(EnsuredFunction {
                    arn,
                    created: false,
                })
            }
            Err(err) => {
                Err(err).with_context(|| format!("Failed to create function {name}"))
            }
        }
    }

    /// Push new code and configuration to an existing function.
    async fn refresh_function(
        &self,
        spec: &FunctionSpec,
        role_arn: &str,
        zip: &[u8],
    ) -> Result<String> {
        let name = spec.name;

        let settled = wait_until(
            WaitConfig::default(),
            || async move { self.function_settled(name).await },
            name,
        )
        .await?;
        if !settled {
            warn!(function = %name, "Function still busy, attempting update anyway");
        }

        self.client
            .update_function_code()
            .function_name(name)
            .zip_file(Blob::new(zip))
            .send()
            .await
            .with_context(|| format!("Failed to update code of {name}"))?;
        info!(function = %name, "Code updated");

        tokio::time::sleep(CODE_SETTLE_DELAY).await;

        let config_update = self
            .client
            .update_function_configuration()
            .function_name(name)
            .role(role_arn)
            .memory_size(spec.memory_mb)
            .timeout(spec.timeout_secs)
            .environment(
                Environment::builder()
                    .set_variables(Some(spec.env.clone()))
                    .build(),
            )
            .send()
            .await;
        match config_update {
            Ok(_) => info!(function = %name, "Configuration updated"),
            Err(err) if is_already_exists(&err) => {
                // A previous update is still being applied. The code push
                // above landed, which is what a re-deploy cares about.
                warn!(function = %name, "Update already in progress, leaving configuration as is");
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Failed to update configuration of {name}"))
            }
        }

        let arn = self
            .client
            .get_function_configuration()
            .function_name(name)
            .send()
            .await
            .with_context(|| format!("Failed to read back configuration of {name}"))?
            .function_arn()
            .map(str::to_string)
            .with_context(|| format!("Function {name} has no ARN"))?;
        Ok(arn)
    }

    /// Whether the function is Active with no update in flight.
    async fn function_settled(&self, name: &str) -> Result<bool> {
        let config = match self
            .client
            .get_function_configuration()
            .function_name(name)
            .send()
            .await
        {
            Ok(config) => config,
            Err(err) if is_not_found(&err) => return Ok(false),
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to read state of {name}"))
            }
        };
        let active = config.state() == Some(&State::Active);
        let updating = config.last_update_status() == Some(&LastUpdateStatus::InProgress);
        Ok(active && !updating)
    }

    /// State and memory of the named function, or None when it is gone.
    pub async fn function_summary(&self, name: &str) -> Result<Option<FunctionSummary>> {
        match self
            .client
            .get_function_configuration()
            .function_name(name)
            .send()
            .await
        {
            Ok(config) => Ok(Some(FunctionSummary {
                state: config
                    .state()
                    .map(|s| s.as_str().to_string())
                    .unwrap_or_else(|| "UNKNOWN".to_string()),
                runtime: config
                    .runtime()
                    .map(|r| r.as_str().to_string())
                    .unwrap_or_else(|| "unknown".to_string()),
                memory_mb: config.memory_size().unwrap_or(0),
                timeout_secs: config.timeout().unwrap_or(0),
            })),
            Err(err) if is_not_found(&err) => Ok(None),
            Err(err) => Err(err).with_context(|| format!("Failed to read state of {name}")),
        }
    }

    /// Grant a service principal permission to invoke the function. Returns
    /// false when the statement was already in place.
    pub async fn allow_invoke(
        &self,
        function: &str,
        statement_id: &str,
        principal: &str,
        source_arn: &str,
    ) -> Result<bool> {
        let attempt = self
            .client
            .add_permission()
            .function_name(function)
            .statement_id(statement_id)
            .action("lambda:InvokeFunction")
            .principal(principal)
            .source_arn(source_arn)
            .send()
            .await;
        match attempt {
            Ok(_) => {
                info!(%function, %principal, "Invoke permission granted");
                Ok(true)
            }
            Err(err) if is_already_exists(&err) => Ok(false),
            Err(err) => Err(err).with_context(|| {
                format!("Failed to let {principal} invoke function {function}")
            }),
        }
    }

    /// Point the function at the table stream, replacing any mapping it
    /// already has.
    pub async fn replace_stream_mapping(&self, function: &str, stream_arn: &str) -> Result<()> {
        let removed = self.delete_mappings_for(function).await?;
        if removed > 0 {
            info!(%function, removed, "Removed stale event source mappings");
        }

        let attempt = self
            .client
            .create_event_source_mapping()
            .function_name(function)
            .event_source_arn(stream_arn)
            .starting_position(EventSourcePosition::TrimHorizon)
            .batch_size(STREAM_BATCH_SIZE)
            .enabled(true)
            .send()
            .await;
        match attempt {
            Ok(_) => {
                info!(%function, "Stream mapping created");
                Ok(())
            }
            Err(err) if is_already_exists(&err) => {
                // The old mapping is still draining out of Deleting state;
                // it pointed at the same stream, so keeping it is fine.
                warn!(%function, "A stream mapping already exists, keeping it");
                Ok(())
            }
            Err(err) => {
                Err(err).with_context(|| format!("Failed to map stream to {function}"))
            }
        }
    }

    /// Delete every event source mapping feeding the function. Returns how
    /// many were removed.
    pub async fn delete_mappings_for(&self, function: &str) -> Result<usize> {
        let mappings = match self
            .client
            .list_event_source_mappings()
            .function_name(function)
            .send()
            .await
        {
            Ok(out) => out,
            Err(err) if is_not_found(&err) => return Ok(0),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Failed to list event source mappings of {function}"))
            }
        };

        let mut removed = 0;
        for mapping in mappings.event_source_mappings() {
            let Some(uuid) = mapping.uuid() else {
                continue;
            };
            match self
                .client
                .delete_event_source_mapping()
                .uuid(uuid)
                .send()
                .await
            {
                Ok(_) => removed += 1,
                Err(err) if is_not_found(&err) => {}
                Err(err) => {
                    return Err(err)
                        .with_context(|| format!("Failed to delete event source mapping {uuid}"))
                }
            }
        }
        Ok(removed)
    }

    /// Delete the function. Returns false when it was already gone.
    pub async fn delete_function(&self, name: &str) -> Result<bool> {
        match self
            .client
            .delete_function()
            .function_name(name)
            .send()
            .await
        {
            Ok(_) => {
                info!(function = %name, "Function deleted");
                Ok(true)
            }
            Err(err) if is_not_found(&err) => Ok(false),
            Err(err) => Err(err).with_context(|| format!("Failed to delete function {name}")),
        }
    }
}
