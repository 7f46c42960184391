//! Report the health of the recorded deployment.

use anyhow::{bail, Result};
use clap::Parser;

use inventory_deploy::aws::AwsContext;
use inventory_deploy::orchestrator::run_validate;
use inventory_deploy::record::DeploymentRecord;
use inventory_deploy::{init_tracing, print_error};

/// Check every recorded resource and print a status table.
///
/// Read-only; a degraded deployment is reported, not repaired. Fails only
/// when there is no deployment record to check against.
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

async fn run() -> Result<()> {
    let Some(record) = DeploymentRecord::load()? else {
        bail!("No deployment record found. Run deploy first.");
    };

    let ctx = AwsContext::from_env().await;
    run_validate(&ctx, &record).await
}
