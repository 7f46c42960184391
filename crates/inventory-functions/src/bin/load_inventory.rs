//! Entry point for the CSV ingestion function.

use aws_config::{BehaviorVersion, Region};
use aws_lambda_events::event::s3::S3Event;
use inventory_common::defaults::{ENV_REGION, ENV_TABLE_NAME};
use inventory_functions::CsvLoader;
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
    let loader = CsvLoader::new(
        aws_sdk_s3::Client::new(&config),
        aws_sdk_dynamodb::Client::new(&config),
        table,
    );
    let loader = &loader;

    run(service_fn(move |event: LambdaEvent<S3Event>| async move {
        loader.handle(event.payload).await.map_err(Error::from)
    }))
    .await
}
