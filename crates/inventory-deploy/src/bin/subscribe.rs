//! Subscribe an email address to low-stock alerts.

use anyhow::{bail, Result};
use clap::Parser;
use dialoguer::Input;

use inventory_deploy::aws::AwsContext;
use inventory_deploy::orchestrator::run_subscribe;
use inventory_deploy::record::DeploymentRecord;
use inventory_deploy::{init_tracing, print_error};

/// Subscribe an email address to the recorded alert topic.
///
/// AWS mails a confirmation link; alerts start once it is clicked.
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

    let email: String = Input::new()
        .with_prompt("Email address for low-stock alerts")
        .allow_empty(true)
        .interact_text()?;

    let ctx = AwsContext::from_env().await;
    run_subscribe(&ctx, &record, &email).await
}
