//! HTTP query handler for the inventory API
//!
//! Serves `GET /items` (full table) and `GET /items/{store}` (one store).
//! Provider failures surface as a 500 with an error body; the route itself
//! never panics the runtime.

use aws_lambda_events::encodings::Body;
use aws_lambda_events::event::apigw::{ApiGatewayV2httpRequest, ApiGatewayV2httpResponse};
use aws_sdk_dynamodb::types::AttributeValue;

use anyhow::{Context, Result};
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue};
use inventory_common::item::ATTR_STORE;
use inventory_common::routes::{resolve_target, QueryTarget};
use inventory_common::InventoryItem;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::{error, info};

use crate::dynamo::attrs_to_item;

/// Handler state built once at startup and reused across invocations.
pub struct QueryApi {
    dynamodb: aws_sdk_dynamodb::Client,
    table: String,
}

impl QueryApi {
    pub fn new(dynamodb: aws_sdk_dynamodb::Client, table: String) -> Self {
        Self { dynamodb, table }
    }

    pub async fn handle(&self, request: ApiGatewayV2httpRequest) -> ApiGatewayV2httpResponse {
        let store = request.path_parameters.get("store").map(String::as_str);
        let raw_path = request.raw_path.as_deref().unwrap_or("");

        match resolve_target(store, raw_path) {
            QueryTarget::AllItems => match self.scan_all().await {
                Ok(items) => {
                    info!(count = items.len(), "Returning full inventory");
                    json_response(200, &json!({ "items": items, "count": items.len() }))
                }
                Err(e) => server_error(&e),
            },
            QueryTarget::Store(store) => match self.query_store(&store).await {
                Ok(items) => {
                    info!(%store, count = items.len(), "Returning store inventory");
                    json_response(
                        200,
                        &json!({ "store": store, "items": items, "count": items.len() }),
                    )
                }
                Err(e) => server_error(&e),
            },
            QueryTarget::NotFound => json_response(
                404,
                &json!({ "error": "Route not found. Use /items or /items/{store}" }),
            ),
        }
    }

    async fn scan_all(&self) -> Result<Vec<InventoryItem>> {
        let mut items = Vec::new();
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;
        loop {
            let resp = self
                .dynamodb
                .scan()
                .table_name(&self.table)
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .context("Table scan failed")?;
            items.extend(resp.items().iter().filter_map(attrs_to_item));
            match resp.last_evaluated_key() {
                Some(key) => start_key = Some(key.clone()),
                None => break,
            }
        }
        Ok(items)
    }

    async fn query_store(&self, store: &str) -> Result<Vec<InventoryItem>> {
        let mut items = Vec::new();
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;
        loop {
            let resp = self
                .dynamodb
                .query()
                .table_name(&self.table)
                .key_condition_expression("#store = :store")
                .expression_attribute_names("#store", ATTR_STORE)
                .expression_attribute_values(":store", AttributeValue::S(store.to_string()))
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .with_context(|| format!("Query for store {store} failed"))?;
            items.extend(resp.items().iter().filter_map(attrs_to_item));
            match resp.last_evaluated_key() {
                Some(key) => start_key = Some(key.clone()),
                None => break,
            }
        }
        Ok(items)
    }
}

fn server_error(e: &anyhow::Error) -> ApiGatewayV2httpResponse {
    error!(error = ?e, "Request failed");
    json_response(500, &json!({ "error": e.to_string() }))
}

fn json_response(status: i64, body: &Value) -> ApiGatewayV2httpResponse {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    ApiGatewayV2httpResponse {
        status_code: status,
        headers,
        body: Some(Body::Text(body.to_string())),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_responses_carry_content_type_and_body() {
        let resp = json_response(404, &json!({ "error": "nope" }));
        assert_eq!(resp.status_code, 404);
        assert_eq!(resp.headers.get(CONTENT_TYPE).unwrap(), "application/json");
        match resp.body {
            Some(Body::Text(text)) => assert!(text.contains("nope")),
            other => panic!("unexpected body: {other:?}"),
        }
    }
}
