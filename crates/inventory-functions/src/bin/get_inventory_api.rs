//! Entry point for the HTTP query function.

use aws_config::{BehaviorVersion, Region};
use aws_lambda_events::event::apigw::ApiGatewayV2httpRequest;
use inventory_common::defaults::{ENV_REGION, ENV_TABLE_NAME};
use inventory_functions::QueryApi;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_ansi(false)
        .init();

    let mut config = aws_config::defaults(BehaviorVersion::latest());
    if let Ok(region) = std::env::var(ENV_REGION) {
        config = config.region(Region::new(region));
    }
    let config = config.load().await;

    let table = std::env::var(ENV_TABLE_NAME)
        .map_err(|_| Error::from(format!("{ENV_TABLE_NAME} is not set")))?;
    let api = QueryApi::new(aws_sdk_dynamodb::Client::new(&config), table);
    let api = &api;

    run(service_fn(
        move |event: LambdaEvent<ApiGatewayV2httpRequest>| async move {
            Ok::<_, Error>(api.handle(event.payload).await)
        },
    ))
    .await
}
