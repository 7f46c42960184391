//! Provision the full inventory pipeline.

use clap::Parser;

use inventory_deploy::aws::AwsContext;
use inventory_deploy::orchestrator::run_deploy;
use inventory_deploy::{init_tracing, print_error};

/// Deploy the serverless inventory pipeline.
///
/// Creates or adopts every resource, wires the triggers, publishes the
/// dashboard, and writes deployment.json. Safe to re-run; it converges on
/// the recorded deployment.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {}

#[tokio::main]
async fn main() {
    init_tracing();
    let _args = Args::parse();

    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let ctx = AwsContext::from_env().await;
    let record = run_deploy(&ctx).await?;

    println!();
    println!("Deployment complete.");
    println!("  API endpoint:  {}", record.api_endpoint);
    if let Some(url) = &record.web_url {
        println!("  Dashboard:     {url}");
    }
    println!("  Upload bucket: s3://{}", record.bucket_uploads);
    println!();
    println!("Next steps:");
    println!(
        "  1. Load data:     aws s3 cp sample_inventory.csv s3://{}/",
        record.bucket_uploads
    );
    println!(
        "  2. Query the API: curl {}/items",
        record.api_endpoint
    );
    println!("  3. Email alerts:  cargo run --bin subscribe");
    Ok(())
}
