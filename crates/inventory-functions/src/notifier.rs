//! Change-stream handler that publishes low-stock alerts
//!
//! Consumes table stream batches. Each insert or modification whose new
//! count sits under the threshold publishes exactly one topic message;
//! removals and unreadable images are ignored.

use anyhow::{Context, Result};
use aws_lambda_events::event::dynamodb::Event;
use inventory_common::stock::{alert_message, alert_subject, should_alert, StreamEventKind};
use inventory_common::InventoryItem;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

/// Handler state built once at startup and reused across invocations.
pub struct LowStockNotifier {
    sns: aws_sdk_sns::Client,
    topic_arn: String,
}

impl LowStockNotifier {
    pub fn new(sns: aws_sdk_sns::Client, topic_arn: String) -> Self {
        Self { sns, topic_arn }
    }

    pub async fn handle(&self, event: Event) -> Result<Value> {
        let mut alerts = 0usize;

        for record in event.records {
            let Some(kind) = StreamEventKind::parse(&record.event_name) else {
                debug!(event_name = %record.event_name, "Ignoring unknown stream event");
                continue;
            };
            if kind == StreamEventKind::Remove {
                continue;
            }
            let item: InventoryItem = match serde_dynamo::from_item(record.change.new_image) {
                Ok(item) => item,
                Err(e) => {
                    warn!(error = %e, "Stream record without a readable new image");
                    continue;
                }
            };
            if !should_alert(kind, item.count) {
                continue;
            }

            info!(store = %item.store, item = %item.item, count = item.count, "Publishing low stock alert");
            self.sns
                .publish()
                .topic_arn(&self.topic_arn)
                .subject(alert_subject(&item.store))
                .message(alert_message(&item))
                .send()
                .await
                .context("Failed to publish notification")?;
            alerts += 1;
        }

        Ok(json!({ "alerts_published": alerts }))
    }
}
