//! HTTP API provisioning in front of the query function.
//!
//! Unlike the other resources, the API is not adopted on redeploy: same-name
//! APIs are deleted and the API is built fresh. Two APIs can share a name,
//! so adopting would have to guess which routes and integrations are
//! current; recreating is unambiguous and takes seconds.

use anyhow::{Context, Result};
use aws_sdk_apigatewayv2::types::{Cors, IntegrationType, ProtocolType};
use tracing::{info, warn};

use super::context::AwsContext;
use super::error::is_not_found;
use crate::discovery::NameMatch;

const ROUTE_ALL_ITEMS: &str = "GET /items";
const ROUTE_STORE_ITEMS: &str = "GET /items/{store}";
const STAGE_NAME: &str = "prod";
const CORS_MAX_AGE_SECS: i32 = 300;

/// Result of [`ApiGatewayClient::create_inventory_api`].
pub struct CreatedApi {
    pub api_id: String,
    /// Public invoke URL including the stage.
    pub endpoint: String,
}

/// Details reported for an existing API.
pub struct ApiSummary {
    pub name: String,
    pub protocol: String,
    pub route_keys: Vec<String>,
}

pub struct ApiGatewayClient {
    client: aws_sdk_apigatewayv2::Client,
    region: String,
}

impl ApiGatewayClient {
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.apigateway_client(),
            region: ctx.region().to_string(),
        }
    }

    /// IDs of every API whose name the matcher accepts.
    pub async fn find_api_ids(&self, matcher: &NameMatch) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let page = self
                .client
                .get_apis()
                .set_next_token(next_token.take())
                .send()
                .await
                .context("Failed to list APIs")?;
            for api in page.items() {
                if api.name().is_some_and(|name| matcher.matches(name)) {
                    if let Some(id) = api.api_id() {
                        ids.push(id.to_string());
                    }
                }
            }
            match page.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => return Ok(ids),
            }
        }
    }

    /// Delete an API by id. Returns false when it was already gone.
    pub async fn delete_api(&self, api_id: &str) -> Result<bool> {
        match self.client.delete_api().api_id(api_id).send().await {
            Ok(_) => {
                info!(%api_id, "API deleted");
                Ok(true)
            }
            Err(err) if is_not_found(&err) => Ok(false),
            Err(err) => Err(err).with_context(|| format!("Failed to delete API {api_id}")),
        }
    }

    /// Build the HTTP API fresh: CORS, a proxy integration to the query
    /// function, both item routes, and an auto-deploying prod stage. Any
    /// existing API with the same name is deleted first.
    pub async fn create_inventory_api(
        &self,
        name: &str,
        function_arn: &str,
    ) -> Result<CreatedApi> {
        for stale_id in self.find_api_ids(&NameMatch::exact(name)).await? {
            warn!(api_id = %stale_id, %name, "Replacing existing API");
            self.delete_api(&stale_id).await?;
        }

        let cors = Cors::builder()
            .allow_origins("*")
            .allow_methods("GET")
            .allow_methods("POST")
            .allow_methods("PUT")
            .allow_methods("DELETE")
            .allow_headers("Content-Type")
            .max_age(CORS_MAX_AGE_SECS)
            .build();

        let api = self
            .client
            .create_api()
            .name(name)
            .protocol_type(ProtocolType::Http)
            .cors_configuration(cors)
            .send()
            .await
            .with_context(|| format!("Failed to create API {name}"))?;
        let api_id = api
            .api_id()
            .map(str::to_string)
            .with_context(|| format!("CreateApi returned no id for {name}"))?;
        info!(%api_id, %name, "API created");

        let integration = self
            .client
            .create_integration()
            .api_id(&api_id)
            .integration_type(IntegrationType::AwsProxy)
            .integration_uri(function_arn)
            .payload_format_version("2.0")
            .send()
            .await
            .context("Failed to create the function integration")?;
        let integration_id = integration
            .integration_id()
            .map(str::to_string)
            .context("CreateIntegration returned no id")?;
        let target = format!("integrations/{integration_id}");

        for route_key in [ROUTE_ALL_ITEMS, ROUTE_STORE_ITEMS] {
            self.client
                .create_route()
                .api_id(&api_id)
                .route_key(route_key)
                .target(&target)
                .send()
                .await
                .with_context(|| format!("Failed to create route {route_key}"))?;
        }

        self.client
            .create_stage()
            .api_id(&api_id)
            .stage_name(STAGE_NAME)
            .auto_deploy(true)
            .send()
            .await
            .with_context(|| format!("Failed to create the {STAGE_NAME} stage"))?;

        let endpoint = format!(
            "https://{api_id}.execute-api.{region}.amazonaws.com/{STAGE_NAME}",
            region = self.region
        );
        info!(%endpoint, "API ready");
        Ok(CreatedApi { api_id, endpoint })
    }

    /// Name, protocol, and routes of the API, or None when it is gone.
    pub async fn api_summary(&self, api_id: &str) -> Result<Option<ApiSummary>> {
        let api = match self.client.get_api().api_id(api_id).send().await {
            Ok(out) => out,
            Err(err) if is_not_found(&err) => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to describe API {api_id}"))
            }
        };

        let mut route_keys = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let page = self
                .client
                .get_routes()
                .api_id(api_id)
                .set_next_token(next_token.take())
                .send()
                .await
                .with_context(|| format!("Failed to list routes of API {api_id}"))?;
            route_keys.extend(
                page.items()
                    .iter()
                    .filter_map(|route| route.route_key().map(str::to_string)),
            );
            match page.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }
        route_keys.sort();

        Ok(Some(ApiSummary {
            name: api.name().unwrap_or("unnamed").to_string(),
            protocol: api
                .protocol_type()
                .map(|p| p.as_str().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            route_keys,
        }))
    }
}
