//! Tear the recorded deployment down.

use anyhow::{bail, Result};
use clap::Parser;
use dialoguer::Input;

use inventory_deploy::aws::AwsContext;
use inventory_deploy::orchestrator::run_teardown;
use inventory_deploy::record::DeploymentRecord;
use inventory_deploy::{init_tracing, print_error};

/// Delete every resource the last deploy recorded.
///
/// Prompts for confirmation, then removes resources in reverse dependency
/// order. Buckets are emptied (all versions) before deletion; inventory
/// data is not recoverable afterwards.
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

/// Whether the typed answer confirms the teardown. Case-insensitive, so
/// "SÍ" and "Sí" count; anything else cancels.
fn confirms_teardown(answer: &str) -> bool {
    answer.trim().to_lowercase() == "sí"
}

async fn run() -> Result<()> {
    let Some(record) = DeploymentRecord::load()? else {
        bail!("No deployment record found. Nothing to destroy.");
    };

    println!("About to delete this deployment:");
    println!("  Region:    {}", record.region);
    println!(
        "  Buckets:   {}, {}",
        record.bucket_uploads, record.bucket_web
    );
    println!("  Table:     {}", record.table_name);
    println!(
        "  Functions: {}, {}, {}",
        record.lambda_load, record.lambda_api, record.lambda_notify
    );
    println!("  API:       {}", record.api_id);
    println!("  Topic:     {}", record.sns_topic_arn);
    println!("  Role:      {}", record.iam_role);
    println!();
    println!("This permanently deletes all inventory data.");

    let answer: String = Input::new()
        .with_prompt("Type 'sí' to confirm")
        .allow_empty(true)
        .interact_text()?;
    if !confirms_teardown(&answer) {
        println!("Cancelled. Nothing was deleted.");
        return Ok(());
    }

    let ctx = AwsContext::from_env().await;
    let report = run_teardown(&ctx, record).await?;

    println!();
    println!("Teardown report:");
    println!("  Removed:      {}", report.removed);
    println!("  Already gone: {}", report.already_gone);
    println!("  Skipped:      {}", report.skipped);
    println!("  Failed:       {}", report.failed);
    if !report.is_clean() {
        println!();
        println!(
            "Some resources could not be removed. Check the warnings above \
             and delete them manually."
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_casing_of_the_word_confirms() {
        assert!(confirms_teardown("sí"));
        assert!(confirms_teardown("SÍ"));
        assert!(confirms_teardown("Sí"));
        assert!(confirms_teardown("  sí  "));
    }

    #[test]
    fn everything_else_cancels() {
        assert!(!confirms_teardown(""));
        assert!(!confirms_teardown("si"));
        assert!(!confirms_teardown("yes"));
        assert!(!confirms_teardown("no"));
    }
}
