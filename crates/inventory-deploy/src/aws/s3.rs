//! S3 bucket provisioning, publishing, and emptying.
//!
//! Buckets are probed before creation so re-deploys adopt instead of
//! failing. Teardown has the ugliest job here: a versioned bucket must be
//! drained of every object version and delete marker before the bucket
//! itself can go.

use anyhow::{Context, Result};
use aws_sdk_s3::operation::head_bucket::HeadBucketError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, BucketVersioningStatus, CreateBucketConfiguration, Delete,
    ErrorDocument, Event, IndexDocument, LambdaFunctionConfiguration, NotificationConfiguration,
    ObjectIdentifier, PublicAccessBlockConfiguration, VersioningConfiguration,
    WebsiteConfiguration,
};
use tracing::{debug, info, warn};

use super::context::AwsContext;
use super::error::{is_not_found, ProvideErrorMetadata};
use inventory_common::defaults::DEFAULT_REGION;

/// Maximum number of object identifiers one DeleteObjects call accepts.
pub const MAX_DELETE_BATCH: usize = 1000;

/// S3 operations scoped to this deployment.
pub struct S3Client {
    client: aws_sdk_s3::Client,
    region: String,
}

impl S3Client {
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.s3_client(),
            region: ctx.region().to_string(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Whether the bucket exists and is reachable with these credentials.
    pub async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(err) if err.as_service_error().is_some_and(HeadBucketError::is_not_found) => {
                Ok(false)
            }
            Err(err) => {
                Err(err).with_context(|| format!("Failed to probe bucket {bucket}"))
            }
        }
    }

    /// Create the bucket unless it already exists. Returns whether it was
    /// created by this call.
    pub async fn ensure_bucket(&self, bucket: &str) -> Result<bool> {
        if self.bucket_exists(bucket).await? {
            info!(%bucket, "Bucket already exists, reusing");
            return Ok(false);
        }

        let mut request = self.client.create_bucket().bucket(bucket);
        // us-east-1 rejects an explicit location constraint.
        if self.region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }

        match request.send().await {
            Ok(_) => {
                info!(%bucket, region = %self.region, "Bucket created");
                Ok(true)
            }
            Err(err) if super::error::is_already_exists(&err) => {
                info!(%bucket, "Bucket appeared concurrently, reusing");
                Ok(false)
            }
            Err(err) => Err(err).with_context(|| format!("Failed to create bucket {bucket}")),
        }
    }

    /// Turn on versioning. Enabling an already-versioned bucket is a no-op.
    pub async fn enable_versioning(&self, bucket: &str) -> Result<()> {
        self.client
            .put_bucket_versioning()
            .bucket(bucket)
            .versioning_configuration(
                VersioningConfiguration::builder()
                    .status(BucketVersioningStatus::Enabled)
                    .build(),
            )
            .send()
            .await
            .with_context(|| format!("Failed to enable versioning on {bucket}"))?;
        info!(%bucket, "Versioning enabled");
        Ok(())
    }

    pub async fn put_object_bytes(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .with_context(|| format!("Failed to upload s3://{bucket}/{key}"))?;
        Ok(())
    }

    /// Enable static website hosting with index.html for both index and
    /// error documents.
    pub async fn configure_website(&self, bucket: &str) -> Result<()> {
        let website = WebsiteConfiguration::builder()
            .index_document(
                IndexDocument::builder()
                    .suffix("index.html")
                    .build()
                    .context("Invalid index document")?,
            )
            .error_document(
                ErrorDocument::builder()
                    .key("index.html")
                    .build()
                    .context("Invalid error document")?,
            )
            .build();

        self.client
            .put_bucket_website()
            .bucket(bucket)
            .website_configuration(website)
            .send()
            .await
            .with_context(|| format!("Failed to enable website hosting on {bucket}"))?;
        info!(%bucket, "Website hosting enabled");
        Ok(())
    }

    /// Whether website hosting is configured on the bucket.
    pub async fn website_enabled(&self, bucket: &str) -> Result<bool> {
        match self.client.get_bucket_website().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(err) if is_not_found(&err) => Ok(false),
            Err(err) => {
                Err(err).with_context(|| format!("Failed to read website config of {bucket}"))
            }
        }
    }

    /// Lift public-access blocking and attach a public-read policy.
    ///
    /// Callers treat failure as a warning, not an abort: in restricted
    /// accounts this call is routinely denied and the site simply stays
    /// private.
    pub async fn allow_public_read(&self, bucket: &str) -> Result<()> {
        self.client
            .put_public_access_block()
            .bucket(bucket)
            .public_access_block_configuration(
                PublicAccessBlockConfiguration::builder()
                    .block_public_acls(false)
                    .ignore_public_acls(false)
                    .block_public_policy(false)
                    .restrict_public_buckets(false)
                    .build(),
            )
            .send()
            .await
            .with_context(|| format!("Failed to lift public access block on {bucket}"))?;

        let policy = serde_json::json!({
            "Version": "2012-10-17",
            "Statement": [{
                "Sid": "PublicReadGetObject",
                "Effect": "Allow",
                "Principal": "*",
                "Action": "s3:GetObject",
                "Resource": format!("arn:aws:s3:::{bucket}/*"),
            }]
        });

        self.client
            .put_bucket_policy()
            .bucket(bucket)
            .policy(policy.to_string())
            .send()
            .await
            .with_context(|| format!("Failed to attach public-read policy to {bucket}"))?;
        info!(%bucket, "Public read access granted");
        Ok(())
    }

    /// Point object-created events at the load function. Replaces any
    /// notification configuration already on the bucket.
    pub async fn set_upload_notification(&self, bucket: &str, function_arn: &str) -> Result<()> {
        let config = NotificationConfiguration::builder()
            .lambda_function_configurations(
                LambdaFunctionConfiguration::builder()
                    .lambda_function_arn(function_arn)
                    .events(Event::from("s3:ObjectCreated:*"))
                    .build()
                    .context("Invalid notification configuration")?,
            )
            .build();

        self.client
            .put_bucket_notification_configuration()
            .bucket(bucket)
            .notification_configuration(config)
            .send()
            .await
            .with_context(|| format!("Failed to wire upload notifications on {bucket}"))?;
        info!(%bucket, "Upload trigger configured");
        Ok(())
    }

    /// Delete every object version and delete marker in the bucket.
    ///
    /// Versioning is suspended first so the drain cannot race new versions
    /// of overwritten keys. Returns the number of identifiers deleted.
    pub async fn empty_bucket(&self, bucket: &str) -> Result<usize> {
        let suspend = self
            .client
            .put_bucket_versioning()
            .bucket(bucket)
            .versioning_configuration(
                VersioningConfiguration::builder()
                    .status(BucketVersioningStatus::Suspended)
                    .build(),
            )
            .send()
            .await;
        if let Err(err) = suspend {
            if is_not_found(&err) {
                debug!(%bucket, "Bucket already gone, nothing to empty");
                return Ok(0);
            }
            // Unversioned buckets still drain fine below.
            warn!(%bucket, error = %aws_error_summary(&err), "Could not suspend versioning");
        }

        let identifiers = self.collect_all_versions(bucket).await?;
        if identifiers.is_empty() {
            return Ok(0);
        }

        let total = identifiers.len();
        info!(
            %bucket,
            objects = total,
            batches = total.div_ceil(MAX_DELETE_BATCH),
            "Emptying bucket"
        );

        for chunk in identifiers.chunks(MAX_DELETE_BATCH) {
            let delete = Delete::builder()
                .set_objects(Some(chunk.to_vec()))
                .quiet(true)
                .build()
                .context("Invalid delete batch")?;
            self.client
                .delete_objects()
                .bucket(bucket)
                .delete(delete)
                .send()
                .await
                .with_context(|| format!("Failed to delete a batch of objects from {bucket}"))?;
        }

        Ok(total)
    }

    async fn collect_all_versions(&self, bucket: &str) -> Result<Vec<ObjectIdentifier>> {
        let mut identifiers = Vec::new();
        let mut key_marker: Option<String> = None;
        let mut version_marker: Option<String> = None;

        loop {
            let page = match self
                .client
                .list_object_versions()
                .bucket(bucket)
                .set_key_marker(key_marker.take())
                .set_version_id_marker(version_marker.take())
                .send()
                .await
            {
                Ok(page) => page,
                Err(err) if is_not_found(&err) => return Ok(identifiers),
                Err(err) => {
                    return Err(err)
                        .with_context(|| format!("Failed to list versions in {bucket}"))
                }
            };

            for version in page.versions() {
                if let (Some(key), Some(id)) = (version.key(), version.version_id()) {
                    identifiers.push(object_identifier(key, id)?);
                }
            }
            for marker in page.delete_markers() {
                if let (Some(key), Some(id)) = (marker.key(), marker.version_id()) {
                    identifiers.push(object_identifier(key, id)?);
                }
            }

            if page.is_truncated() == Some(true) {
                key_marker = page.next_key_marker().map(str::to_string);
                version_marker = page.next_version_id_marker().map(str::to_string);
            } else {
                return Ok(identifiers);
            }
        }
    }

    /// Delete the bucket itself. Returns false when it was already gone.
    pub async fn delete_bucket(&self, bucket: &str) -> Result<bool> {
        match self.client.delete_bucket().bucket(bucket).send().await {
            Ok(_) => {
                info!(%bucket, "Bucket deleted");
                Ok(true)
            }
            Err(err) if is_not_found(&err) => Ok(false),
            Err(err) => Err(err).with_context(|| format!("Failed to delete bucket {bucket}")),
        }
    }
}

fn object_identifier(key: &str, version_id: &str) -> Result<ObjectIdentifier> {
    ObjectIdentifier::builder()
        .key(key)
        .version_id(version_id)
        .build()
        .context("Invalid object identifier")
}

fn aws_error_summary<E: ProvideErrorMetadata>(err: &E) -> String {
    super::error::classify_sdk_error(err).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_count_matches_the_delete_limit() {
        assert_eq!(1500usize.div_ceil(MAX_DELETE_BATCH), 2);
        assert_eq!(1000usize.div_ceil(MAX_DELETE_BATCH), 1);
        assert_eq!(1001usize.div_ceil(MAX_DELETE_BATCH), 2);
    }
}
