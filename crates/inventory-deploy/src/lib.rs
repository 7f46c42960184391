//! inventory-deploy: provisioning and teardown for the inventory pipeline
//!
//! Stands up the full serverless topology (buckets, table, role, topic,
//! functions, triggers, HTTP API, static site) in dependency order, records
//! what it built in a deployment record, and tears it all down again. Every
//! creator is create-or-adopt, so re-running `deploy` converges on the same
//! resources instead of duplicating them.
//!
//! Four binaries share this library: `deploy`, `destroy`, `validate`, and
//! `subscribe`. Each is an independent entry point with its own (empty) flag
//! surface.

pub mod aws;
pub mod discovery;
pub mod naming;
pub mod orchestrator;
pub mod package;
pub mod record;
pub mod site;
pub mod wait;

/// Initialize tracing for a CLI binary.
///
/// Honors `RUST_LOG`, defaulting to `INFO` so every provisioning step is
/// visible as it happens.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();
}

/// Print an error and its cause chain to stderr.
pub fn print_error(e: &anyhow::Error) {
    eprintln!("\x1b[1;31mError:\x1b[0m {e}");

    let causes: Vec<_> = e.chain().skip(1).collect();
    if !causes.is_empty() {
        eprintln!("\nCaused by:");
        for (i, cause) in causes.iter().enumerate() {
            eprintln!("  {i}: {cause}");
        }
    }

    eprintln!("\nRun with RUST_BACKTRACE=1 for a backtrace.");
}
