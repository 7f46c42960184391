//! DynamoDB table lifecycle.
//!
//! The inventory table is keyed on store and item name, billed on demand,
//! and carries a stream so the notifier can watch count changes. Adopting
//! an existing table includes turning the stream on if a previous deploy
//! or an operator left it disabled.

use std::time::Duration;

use anyhow::{Context, Result};
use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ScalarAttributeType,
    StreamSpecification, StreamViewType, TableStatus,
};
use tracing::{info, warn};

use super::context::AwsContext;
use super::error::{is_already_exists, is_not_found};
use crate::wait::{wait_until, WaitConfig};
use inventory_common::item::{ATTR_ITEM, ATTR_STORE};

/// Result of [`DynamoDbClient::ensure_table`].
pub struct EnsuredTable {
    /// Whether this call created the table.
    pub created: bool,
    /// ARN of the table's stream, when one is enabled.
    pub stream_arn: Option<String>,
}

/// Point-in-time table state for the validation report.
pub struct TableSummary {
    pub status: String,
    pub item_count: i64,
}

pub struct DynamoDbClient {
    client: aws_sdk_dynamodb::Client,
}

impl DynamoDbClient {
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.dynamodb_client(),
        }
    }

    /// Create the table, or adopt it if it already exists. Either way the
    /// table has its stream enabled and is ACTIVE (or as close as the wait
    /// budget allows) on return.
    pub async fn ensure_table(&self, table: &str) -> Result<EnsuredTable> {
        let request = self
            .client
            .create_table()
            .table_name(table)
            .attribute_definitions(string_attribute(ATTR_STORE)?)
            .attribute_definitions(string_attribute(ATTR_ITEM)?)
            .key_schema(key_element(ATTR_STORE, KeyType::Hash)?)
            .key_schema(key_element(ATTR_ITEM, KeyType::Range)?)
            .billing_mode(BillingMode::PayPerRequest)
            .stream_specification(new_and_old_images_stream()?);

        let created = match request.send().await {
            Ok(_) => {
                info!(%table, "Table created");
                true
            }
            Err(err) if is_already_exists(&err) => {
                info!(%table, "Table already exists, adopting");
                self.enable_stream_if_disabled(table).await?;
                false
            }
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to create table {table}"))
            }
        };

        let became_active = wait_until(
            WaitConfig {
                interval: Duration::from_secs(5),
                max_attempts: 12,
            },
            || async move {
                Ok(self.table_status(table).await? == Some(TableStatus::Active))
            },
            table,
        )
        .await?;
        if !became_active {
            warn!(%table, "Table did not reach ACTIVE in time, continuing");
        }

        let stream_arn = self.stream_arn(table).await?;
        Ok(EnsuredTable {
            created,
            stream_arn,
        })
    }

    async fn enable_stream_if_disabled(&self, table: &str) -> Result<()> {
        let description = self
            .client
            .describe_table()
            .table_name(table)
            .send()
            .await
            .with_context(|| format!("Failed to describe table {table}"))?;

        let stream_enabled = description
            .table()
            .and_then(|t| t.stream_specification())
            .map(|s| s.stream_enabled())
            .unwrap_or(false);
        if stream_enabled {
            return Ok(());
        }

        info!(%table, "Enabling stream on adopted table");
        self.client
            .update_table()
            .table_name(table)
            .stream_specification(new_and_old_images_stream()?)
            .send()
            .await
            .with_context(|| format!("Failed to enable stream on table {table}"))?;
        Ok(())
    }

    async fn table_status(&self, table: &str) -> Result<Option<TableStatus>> {
        match self.client.describe_table().table_name(table).send().await {
            Ok(out) => Ok(out.table().and_then(|t| t.table_status().cloned())),
            Err(err) if is_not_found(&err) => Ok(None),
            Err(err) => Err(err).with_context(|| format!("Failed to describe table {table}")),
        }
    }

    /// ARN of the table's change stream, if the table exists and streams
    /// are on.
    pub async fn stream_arn(&self, table: &str) -> Result<Option<String>> {
        match self.client.describe_table().table_name(table).send().await {
            Ok(out) => Ok(out
                .table()
                .and_then(|t| t.latest_stream_arn())
                .map(str::to_string)),
            Err(err) if is_not_found(&err) => Ok(None),
            Err(err) => Err(err).with_context(|| format!("Failed to describe table {table}")),
        }
    }

    /// Status and approximate item count, or None when the table is gone.
    pub async fn table_summary(&self, table: &str) -> Result<Option<TableSummary>> {
        match self.client.describe_table().table_name(table).send().await {
            Ok(out) => Ok(out.table().map(|t| TableSummary {
                status: t
                    .table_status()
                    .map(|s| s.as_str().to_string())
                    .unwrap_or_else(|| "UNKNOWN".to_string()),
                // The count DynamoDB reports lags writes by design of the
                // service; callers present it as approximate.
                item_count: t.item_count().unwrap_or(0),
            })),
            Err(err) if is_not_found(&err) => Ok(None),
            Err(err) => Err(err).with_context(|| format!("Failed to describe table {table}")),
        }
    }

    /// Delete the table. Returns false when it was already gone.
    pub async fn delete_table(&self, table: &str) -> Result<bool> {
        match self.client.delete_table().table_name(table).send().await {
            Ok(_) => {
                info!(%table, "Table deletion started");
                Ok(true)
            }
            Err(err) if is_not_found(&err) => Ok(false),
            Err(err) => Err(err).with_context(|| format!("Failed to delete table {table}")),
        }
    }

    /// Block until the table has fully disappeared, so a follow-up deploy
    /// can recreate it under the same name.
    pub async fn await_table_gone(&self, table: &str) -> Result<bool> {
        wait_until(
            WaitConfig {
                interval: Duration::from_secs(5),
                max_attempts: 24,
            },
            || async move { Ok(self.table_status(table).await?.is_none()) },
            table,
        )
        .await
    }
}

fn string_attribute(name: &str) -> Result<AttributeDefinition> {
    AttributeDefinition::builder()
        .attribute_name(name)
        .attribute_type(ScalarAttributeType::S)
        .build()
        .context("Invalid attribute definition")
}

fn key_element(name: &str, key_type: KeyType) -> Result<KeySchemaElement> {
    KeySchemaElement::builder()
        .attribute_name(name)
        .key_type(key_type)
        .build()
        .context("Invalid key schema element")
}

fn new_and_old_images_stream() -> Result<StreamSpecification> {
    StreamSpecification::builder()
        .stream_enabled(true)
        .stream_view_type(StreamViewType::NewAndOldImages)
        .build()
        .context("Invalid stream specification")
}
