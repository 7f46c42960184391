//! inventory-functions: the three Lambda handlers behind the pipeline
//!
//! Each binary under `src/bin/` is one deployed function; the handler logic
//! lives here so it can be tested without a Lambda runtime. Decision logic
//! (CSV tolerance, the low-stock gate, route resolution) comes from
//! `inventory-common`; this crate only adds the AWS glue around it.
//!
//! Build deployable archives with `cargo lambda build --release`; the
//! deployer picks them up from `target/lambda/<function>/`.

pub mod api;
pub mod dynamo;
pub mod loader;
pub mod notifier;

pub use api::QueryApi;
pub use loader::CsvLoader;
pub use notifier::LowStockNotifier;
