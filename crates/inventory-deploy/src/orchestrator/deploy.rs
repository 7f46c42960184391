//! Provisioning, in dependency order.
//!
//! Storage and identity come first, then the functions, then the wiring
//! that points events at them, and the record is written only after
//! everything else succeeded. A re-run reads the previous record's suffix
//! and converges on the same resources.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};

use crate::aws::apigateway::ApiGatewayClient;
use crate::aws::dynamodb::DynamoDbClient;
use crate::aws::iam::IamClient;
use crate::aws::lambda::{FunctionSpec, LambdaClient};
use crate::aws::s3::S3Client;
use crate::aws::sns::SnsClient;
use crate::aws::{get_current_account_id, AwsContext};
use crate::naming::{ResourceNames, DEFAULT_SUFFIX, FN_API, FN_LOAD, FN_NOTIFY, PREFERRED_ROLE};
use crate::package::package_function;
use crate::record::{DeploymentRecord, RECORD_PATH};
use crate::site::{publish_site, DEFAULT_SITE_DIR};
use inventory_common::defaults::{ENV_REGION, ENV_TABLE_NAME, ENV_TOPIC_ARN};

const S3_INVOKE_STATEMENT: &str = "AllowS3Invoke";
const API_INVOKE_STATEMENT: &str = "AllowApiGatewayInvoke";

/// Stand up (or converge on) the whole pipeline and record what exists.
pub async fn run_deploy(ctx: &AwsContext) -> Result<DeploymentRecord> {
    let previous = DeploymentRecord::load()?;
    let suffix = match &previous {
        Some(record) => {
            info!(suffix = %record.suffix, "Existing deployment found, redeploying into it");
            record.suffix.clone()
        }
        None => DEFAULT_SUFFIX.to_string(),
    };
    let names = ResourceNames::derive(&suffix);
    let region = ctx.region().to_string();

    // Also serves as the credential check before anything is created.
    let account = get_current_account_id(ctx).await?;
    info!(%region, %suffix, "Deploying the inventory pipeline");

    let s3 = S3Client::from_context(ctx);
    let dynamodb = DynamoDbClient::from_context(ctx);
    let iam = IamClient::from_context(ctx);
    let lambda = LambdaClient::from_context(ctx);
    let apigateway = ApiGatewayClient::from_context(ctx);
    let sns = SnsClient::from_context(ctx);

    info!("Provisioning storage");
    s3.ensure_bucket(&names.bucket_uploads).await?;
    s3.enable_versioning(&names.bucket_uploads).await?;
    s3.ensure_bucket(&names.bucket_web).await?;
    let table = dynamodb.ensure_table(&names.table).await?;

    info!("Resolving the execution role");
    let role = iam
        .ensure_execution_role(PREFERRED_ROLE, &names.role)
        .await?;

    info!("Provisioning the alert topic");
    let topic = sns.ensure_topic(&names.topic).await?;

    info!("Deploying functions");
    let [load_spec, api_spec, notify_spec] = function_specs(&names.table, &region, &topic.arn);
    let load_arn = deploy_function(&lambda, &load_spec, &role.arn).await?;
    let api_arn = deploy_function(&lambda, &api_spec, &role.arn).await?;
    deploy_function(&lambda, &notify_spec, &role.arn).await?;

    info!("Wiring the upload trigger");
    lambda
        .allow_invoke(
            FN_LOAD,
            S3_INVOKE_STATEMENT,
            "s3.amazonaws.com",
            &format!("arn:aws:s3:::{}", names.bucket_uploads),
        )
        .await?;
    s3.set_upload_notification(&names.bucket_uploads, &load_arn)
        .await?;

    info!("Wiring the low-stock trigger");
    match table.stream_arn.as_deref() {
        Some(stream_arn) => {
            lambda.replace_stream_mapping(FN_NOTIFY, stream_arn).await?;
        }
        None => warn!(table = %names.table, "Table has no stream, low-stock alerts stay off"),
    }

    info!("Provisioning the HTTP API");
    let api = apigateway.create_inventory_api(&names.api, &api_arn).await?;
    lambda
        .allow_invoke(
            FN_API,
            API_INVOKE_STATEMENT,
            "apigateway.amazonaws.com",
            &format!(
                "arn:aws:execute-api:{region}:{account}:{api_id}/*/*",
                api_id = api.api_id
            ),
        )
        .await?;

    info!("Publishing the dashboard");
    let published = publish_site(
        &s3,
        &names.bucket_web,
        Path::new(DEFAULT_SITE_DIR),
        &api.endpoint,
    )
    .await?;

    let record = DeploymentRecord {
        deployment_time: chrono::Utc::now().to_rfc3339(),
        region,
        suffix: names.suffix,
        bucket_uploads: names.bucket_uploads,
        bucket_web: names.bucket_web,
        table_name: names.table,
        lambda_load: FN_LOAD.to_string(),
        lambda_api: FN_API.to_string(),
        lambda_notify: FN_NOTIFY.to_string(),
        api_id: api.api_id,
        api_endpoint: api.endpoint,
        web_url: published.map(|site| site.url),
        sns_topic_arn: topic.arn,
        iam_role: role.name,
    };
    record.save()?;
    info!(path = RECORD_PATH, "Deployment recorded");

    Ok(record)
}

/// Package one function's built binary and create or refresh it.
async fn deploy_function(
    lambda: &LambdaClient,
    spec: &FunctionSpec,
    role_arn: &str,
) -> Result<String> {
    let zip = package_function(spec.name)?;
    let ensured = lambda.ensure_function(spec, role_arn, &zip).await?;
    Ok(ensured.arn)
}

/// Size, timeout, and environment for each of the three functions.
///
/// The loader gets the most room since it parses whole CSV files; the
/// notifier shares the loader's timeout because SNS publishes happen one
/// record at a time.
fn function_specs(table: &str, region: &str, topic_arn: &str) -> [FunctionSpec; 3] {
    let base: HashMap<String, String> = HashMap::from([
        (ENV_TABLE_NAME.to_string(), table.to_string()),
        (ENV_REGION.to_string(), region.to_string()),
    ]);
    let mut notify_env = base.clone();
    notify_env.insert(ENV_TOPIC_ARN.to_string(), topic_arn.to_string());

    [
        FunctionSpec {
            name: FN_LOAD,
            memory_mb: 512,
            timeout_secs: 60,
            env: base.clone(),
        },
        FunctionSpec {
            name: FN_API,
            memory_mb: 256,
            timeout_secs: 30,
            env: base,
        },
        FunctionSpec {
            name: FN_NOTIFY,
            memory_mb: 256,
            timeout_secs: 60,
            env: notify_env,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_function_knows_the_table_and_region() {
        let specs = function_specs("Inventory", "us-east-1", "arn:aws:sns:::t");
        for spec in &specs {
            assert_eq!(spec.env.get(ENV_TABLE_NAME).map(String::as_str), Some("Inventory"));
            assert_eq!(spec.env.get(ENV_REGION).map(String::as_str), Some("us-east-1"));
        }
    }

    #[test]
    fn only_the_notifier_gets_the_topic() {
        let [load, api, notify] = function_specs("Inventory", "us-east-1", "arn:aws:sns:::t");
        assert!(notify.env.contains_key(ENV_TOPIC_ARN));
        assert!(!load.env.contains_key(ENV_TOPIC_ARN));
        assert!(!api.env.contains_key(ENV_TOPIC_ARN));
    }

    #[test]
    fn loader_is_the_largest_function() {
        let [load, api, notify] = function_specs("Inventory", "us-east-1", "arn:aws:sns:::t");
        assert_eq!((load.memory_mb, load.timeout_secs), (512, 60));
        assert_eq!((api.memory_mb, api.timeout_secs), (256, 30));
        assert_eq!((notify.memory_mb, notify.timeout_secs), (256, 60));
    }
}
