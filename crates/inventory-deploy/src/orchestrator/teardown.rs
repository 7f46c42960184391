//! Teardown, in reverse dependency order.
//!
//! The record is deleted before the first cloud call: once teardown starts,
//! nothing in it can be trusted again, and validate must stop reporting a
//! deployment that is mid-demolition. Every removal after that is tolerant;
//! one stuck resource becomes a warning and a report entry, never an abort.

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::aws::apigateway::ApiGatewayClient;
use crate::aws::dynamodb::DynamoDbClient;
use crate::aws::iam::IamClient;
use crate::aws::lambda::LambdaClient;
use crate::aws::s3::S3Client;
use crate::aws::sns::SnsClient;
use crate::aws::error::classify_anyhow_error;
use crate::aws::AwsContext;
use crate::discovery::NameMatch;
use crate::naming::{PREFERRED_ROLE, TOPIC_FRAGMENT};
use crate::record::DeploymentRecord;

/// What happened to each resource during teardown.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TeardownReport {
    pub removed: usize,
    pub already_gone: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl TeardownReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }

    fn tally(&mut self, what: &str, outcome: Result<bool>) {
        match outcome {
            Ok(true) => {
                debug!(%what, "Removed");
                self.removed += 1;
            }
            Ok(false) => {
                debug!(%what, "Already gone");
                self.already_gone += 1;
            }
            // Multi-step removals can trip over a resource that vanished
            // between their steps; that is still "gone", not a failure.
            Err(err) if classify_anyhow_error(&err).is_not_found() => {
                debug!(%what, "Vanished mid-removal");
                self.already_gone += 1;
            }
            Err(err) => {
                warn!("Failed to remove {what}: {err:#}");
                self.failed += 1;
            }
        }
    }
}

/// Remove everything the record names, starting with the record itself.
pub async fn run_teardown(ctx: &AwsContext, record: DeploymentRecord) -> Result<TeardownReport> {
    if DeploymentRecord::delete()? {
        info!("Deployment record deleted");
    }

    let s3 = S3Client::from_context(ctx);
    let dynamodb = DynamoDbClient::from_context(ctx);
    let iam = IamClient::from_context(ctx);
    let lambda = LambdaClient::from_context(ctx);
    let apigateway = ApiGatewayClient::from_context(ctx);
    let sns = SnsClient::from_context(ctx);

    let mut report = TeardownReport::default();

    info!("Removing functions");
    for function in [
        &record.lambda_load,
        &record.lambda_api,
        &record.lambda_notify,
    ] {
        // Mappings go first so nothing re-invokes a half-deleted function.
        if let Err(err) = lambda.delete_mappings_for(function).await {
            warn!("Failed to clear event source mappings of {function}: {err:#}");
        }
        report.tally(
            &format!("function {function}"),
            lambda.delete_function(function).await,
        );
    }

    info!("Removing the HTTP API");
    report.tally(
        &format!("API {}", record.api_id),
        apigateway.delete_api(&record.api_id).await,
    );

    info!("Removing the table");
    let table_outcome = dynamodb.delete_table(&record.table_name).await;
    let table_deleted = matches!(table_outcome, Ok(true));
    report.tally(&format!("table {}", record.table_name), table_outcome);
    if table_deleted {
        // The next deploy recreates the table under the same name, which
        // fails while the old one is still draining.
        match dynamodb.await_table_gone(&record.table_name).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(table = %record.table_name, "Table still deleting after the wait budget")
            }
            Err(err) => warn!("Lost track of the deleting table: {err:#}"),
        }
    }

    info!("Removing buckets");
    for bucket in [&record.bucket_uploads, &record.bucket_web] {
        match s3.empty_bucket(bucket).await {
            Ok(0) => {}
            Ok(objects) => info!(%bucket, objects, "Bucket emptied"),
            Err(err) => warn!("Failed to empty bucket {bucket}: {err:#}"),
        }
        report.tally(&format!("bucket {bucket}"), s3.delete_bucket(bucket).await);
    }

    info!("Removing the execution role");
    if record.iam_role == PREFERRED_ROLE {
        info!(role = %record.iam_role, "Shared role is not ours to delete, skipping");
        report.skipped += 1;
    } else {
        report.tally(
            &format!("role {}", record.iam_role),
            iam.delete_role(&record.iam_role).await,
        );
    }

    info!("Removing alert topics");
    match sns.topics_matching(&NameMatch::contains(TOPIC_FRAGMENT)).await {
        Ok(arns) => {
            if arns.is_empty() {
                debug!("No matching topics left");
                report.already_gone += 1;
            }
            for arn in arns {
                report.tally(
                    &format!("topic {arn}"),
                    sns.delete_topic_with_subscriptions(&arn).await,
                );
            }
        }
        Err(err) => {
            warn!("Failed to list topics: {err:#}");
            report.failed += 1;
        }
    }

    info!(
        removed = report.removed,
        already_gone = report.already_gone,
        skipped = report.skipped,
        failed = report.failed,
        "Teardown finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn tally_sorts_outcomes_into_the_right_buckets() {
        let mut report = TeardownReport::default();
        report.tally("a", Ok(true));
        report.tally("b", Ok(true));
        report.tally("c", Ok(false));
        report.tally("d", Err(anyhow!("denied")));
        assert_eq!(report.removed, 2);
        assert_eq!(report.already_gone, 1);
        assert_eq!(report.failed, 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn wrapped_not_found_counts_as_already_gone() {
        let mut report = TeardownReport::default();
        let err = anyhow!("service error")
            .context("unhandled NoSuchBucket while deleting")
            .context("Failed to delete bucket inventory-web-inventory-main");
        report.tally("bucket", Err(err));
        assert_eq!(report.already_gone, 1);
        assert_eq!(report.failed, 0);
    }

    #[test]
    fn a_report_without_failures_is_clean() {
        let mut report = TeardownReport::default();
        report.tally("a", Ok(true));
        report.skipped += 1;
        assert!(report.is_clean());
    }
}
