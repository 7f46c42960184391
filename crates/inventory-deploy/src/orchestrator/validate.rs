//! Read-only health report over a recorded deployment.
//!
//! Every check degrades to a table row, including the ones that error;
//! validate never mutates anything and never aborts halfway through its
//! checklist. Missing resources are reported, not repaired.

use std::time::Duration;

use anyhow::Result;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, Table};

use crate::aws::apigateway::ApiGatewayClient;
use crate::aws::dynamodb::DynamoDbClient;
use crate::aws::iam::IamClient;
use crate::aws::lambda::LambdaClient;
use crate::aws::s3::S3Client;
use crate::aws::sns::SnsClient;
use crate::aws::AwsContext;
use crate::record::DeploymentRecord;

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

enum Check {
    Healthy(String),
    Degraded(String),
}

impl Check {
    fn healthy(detail: impl Into<String>) -> Self {
        Self::Healthy(detail.into())
    }

    fn degraded(detail: impl Into<String>) -> Self {
        Self::Degraded(detail.into())
    }

    fn from_presence(outcome: Result<bool>) -> Self {
        match outcome {
            Ok(true) => Self::healthy("present"),
            Ok(false) => Self::degraded("missing"),
            Err(err) => Self::degraded(format!("check failed: {err:#}")),
        }
    }

    fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy(_))
    }

    fn cell(&self) -> Cell {
        match self {
            Self::Healthy(detail) => Cell::new(detail).fg(Color::Green),
            Self::Degraded(detail) => Cell::new(detail).fg(Color::Red),
        }
    }
}

/// Check every recorded resource and print a status table.
///
/// Always returns `Ok` once the record is in hand; a degraded deployment is
/// something to report, not a tool failure.
pub async fn run_validate(ctx: &AwsContext, record: &DeploymentRecord) -> Result<()> {
    let s3 = S3Client::from_context(ctx);
    let dynamodb = DynamoDbClient::from_context(ctx);
    let iam = IamClient::from_context(ctx);
    let lambda = LambdaClient::from_context(ctx);
    let apigateway = ApiGatewayClient::from_context(ctx);
    let sns = SnsClient::from_context(ctx);

    let mut rows: Vec<(&str, String, Check)> = Vec::new();

    rows.push((
        "Uploads bucket",
        record.bucket_uploads.clone(),
        Check::from_presence(s3.bucket_exists(&record.bucket_uploads).await),
    ));
    rows.push((
        "Web bucket",
        record.bucket_web.clone(),
        Check::from_presence(s3.bucket_exists(&record.bucket_web).await),
    ));
    if record.web_url.is_some() {
        rows.push((
            "Website hosting",
            record.bucket_web.clone(),
            Check::from_presence(s3.website_enabled(&record.bucket_web).await),
        ));
    }

    let table_check = match dynamodb.table_summary(&record.table_name).await {
        Ok(Some(summary)) if summary.status == "ACTIVE" => {
            Check::healthy(format!("ACTIVE (~{} items)", summary.item_count))
        }
        Ok(Some(summary)) => Check::degraded(summary.status),
        Ok(None) => Check::degraded("missing"),
        Err(err) => Check::degraded(format!("check failed: {err:#}")),
    };
    rows.push(("Table", record.table_name.clone(), table_check));

    for function in [
        &record.lambda_load,
        &record.lambda_api,
        &record.lambda_notify,
    ] {
        let check = match lambda.function_summary(function).await {
            Ok(Some(summary)) if summary.state == "Active" => Check::healthy(format!(
                "Active ({}, {} MB, {} s)",
                summary.runtime, summary.memory_mb, summary.timeout_secs
            )),
            Ok(Some(summary)) => Check::degraded(summary.state),
            Ok(None) => Check::degraded("missing"),
            Err(err) => Check::degraded(format!("check failed: {err:#}")),
        };
        rows.push(("Function", function.clone(), check));
    }

    let api_check = match apigateway.api_summary(&record.api_id).await {
        Ok(Some(summary)) if summary.route_keys.is_empty() => {
            Check::degraded(format!("{} with no routes", summary.protocol))
        }
        Ok(Some(summary)) => Check::healthy(format!(
            "{}: {}",
            summary.protocol,
            summary.route_keys.join(", ")
        )),
        Ok(None) => Check::degraded("missing"),
        Err(err) => Check::degraded(format!("check failed: {err:#}")),
    };
    rows.push(("HTTP API", record.api_id.clone(), api_check));

    let topic_check = match sns.topic_exists(&record.sns_topic_arn).await {
        Ok(true) => match sns.subscription_summary(&record.sns_topic_arn).await {
            Ok(subs) => Check::healthy(format!(
                "{} confirmed, {} pending",
                subs.confirmed, subs.pending
            )),
            Err(err) => Check::degraded(format!("subscriptions unknown: {err:#}")),
        },
        Ok(false) => Check::degraded("missing"),
        Err(err) => Check::degraded(format!("check failed: {err:#}")),
    };
    rows.push(("Alert topic", record.sns_topic_arn.clone(), topic_check));

    rows.push((
        "Execution role",
        record.iam_role.clone(),
        Check::from_presence(iam.role_arn(&record.iam_role).await.map(|arn| arn.is_some())),
    ));

    let probe_url = format!("{}/items", record.api_endpoint);
    let probe_check = probe_api(&probe_url).await;
    rows.push(("Live query", probe_url, probe_check));

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Resource", "Identifier", "Status"]);
    let mut healthy = true;
    for (resource, identifier, check) in &rows {
        healthy &= check.is_healthy();
        table.add_row(vec![
            Cell::new(resource),
            Cell::new(identifier),
            check.cell(),
        ]);
    }
    println!("{table}");

    if healthy {
        println!("\nAll recorded resources look healthy.");
    } else {
        println!("\nSome resources are missing or degraded. Re-running deploy restores them.");
    }

    Ok(())
}

/// GET the items route through the public endpoint.
async fn probe_api(url: &str) -> Check {
    let client = match reqwest::Client::builder().timeout(PROBE_TIMEOUT).build() {
        Ok(client) => client,
        Err(err) => return Check::degraded(format!("probe setup failed: {err}")),
    };

    match client.get(url).send().await {
        Ok(response) => {
            let status = response.status();
            match response.json::<serde_json::Value>().await {
                Ok(body) => {
                    let count = body.get("count").and_then(serde_json::Value::as_i64);
                    match count {
                        Some(count) if status.is_success() => {
                            Check::healthy(format!("HTTP {status}, {count} items"))
                        }
                        _ => Check::degraded(format!("HTTP {status}")),
                    }
                }
                Err(_) => Check::degraded(format!("HTTP {status}, body was not JSON")),
            }
        }
        Err(err) => Check::degraded(format!("unreachable: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn presence_maps_to_health() {
        assert!(Check::from_presence(Ok(true)).is_healthy());
        assert!(!Check::from_presence(Ok(false)).is_healthy());
        assert!(!Check::from_presence(Err(anyhow!("denied"))).is_healthy());
    }

    #[test]
    fn failed_checks_carry_the_cause() {
        let check = Check::from_presence(Err(anyhow!("access denied")));
        match check {
            Check::Degraded(detail) => assert!(detail.contains("access denied")),
            Check::Healthy(_) => panic!("an errored check cannot be healthy"),
        }
    }
}
