//! S3-triggered CSV ingestion
//!
//! Fired on every object-created event in the uploads bucket. Fetches the
//! object, parses it as inventory CSV, and writes one table item per valid
//! row. Malformed rows are dropped row by row; a bad file never poisons the
//! batch.

use anyhow::{Context, Result};
use aws_lambda_events::event::s3::S3Event;
use inventory_common::parse_inventory_csv;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::dynamo::item_to_attrs;

/// Handler state built once at startup and reused across invocations.
pub struct CsvLoader {
    s3: aws_sdk_s3::Client,
    dynamodb: aws_sdk_dynamodb::Client,
    table: String,
}

impl CsvLoader {
    pub fn new(s3: aws_sdk_s3::Client, dynamodb: aws_sdk_dynamodb::Client, table: String) -> Self {
        Self { s3, dynamodb, table }
    }

    /// Process every uploaded object in the event.
    pub async fn handle(&self, event: S3Event) -> Result<Value> {
        let mut processed = 0usize;
        let mut skipped = 0usize;

        for record in event.records {
            let (Some(bucket), Some(key)) = (record.s3.bucket.name, record.s3.object.key) else {
                warn!("Event record without bucket or key, skipping");
                continue;
            };
            info!(%bucket, %key, "Processing uploaded file");

            let body = self
                .s3
                .get_object()
                .bucket(&bucket)
                .key(&key)
                .send()
                .await
                .with_context(|| format!("Failed to fetch s3://{bucket}/{key}"))?
                .body
                .collect()
                .await
                .context("Failed to read object body")?
                .into_bytes();

            let import = parse_inventory_csv(&body);
            if import.skipped > 0 {
                warn!(rows = import.skipped, %key, "Skipped malformed rows");
            }
            skipped += import.skipped;

            for item in &import.items {
                self.dynamodb
                    .put_item()
                    .table_name(&self.table)
                    .set_item(Some(item_to_attrs(item)))
                    .send()
                    .await
                    .with_context(|| format!("Failed to write {}/{}", item.store, item.item))?;
                processed += 1;
            }
            info!(rows = import.items.len(), %key, "File loaded");
        }

        Ok(json!({ "processed_rows": processed, "skipped_rows": skipped }))
    }
}
