//! Entry point for the low-stock notification function.

use aws_config::{BehaviorVersion, Region};
use aws_lambda_events::event::dynamodb::Event;
use inventory_common::defaults::{ENV_REGION, ENV_TOPIC_ARN};
use inventory_functions::LowStockNotifier;
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

    let topic_arn = std::env::var(ENV_TOPIC_ARN)
        .map_err(|_| Error::from(format!("{ENV_TOPIC_ARN} is not set")))?;
    let notifier = LowStockNotifier::new(aws_sdk_sns::Client::new(&config), topic_arn);
    let notifier = &notifier;

    run(service_fn(move |event: LambdaEvent<Event>| async move {
        notifier.handle(event.payload).await.map_err(Error::from)
    }))
    .await
}
