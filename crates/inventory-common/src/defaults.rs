//! Default configuration values shared between the functions and the deployer
//!
//! These constants keep the orchestrator and the Lambda handlers agreeing on
//! names without either side reading the other's code.

/// Region used when `AWS_REGION` is not set
pub const DEFAULT_REGION: &str = "us-east-1";

/// Inventory counts strictly below this value trigger a notification
pub const LOW_STOCK_THRESHOLD: i64 = 50;

// Environment variable names the deployer sets on each function and the
// handlers read at startup.

/// Table the functions read and write
pub const ENV_TABLE_NAME: &str = "TABLE_NAME";

/// Region the function clients are pinned to
pub const ENV_REGION: &str = "REGION";

/// Topic the notifier publishes to
pub const ENV_TOPIC_ARN: &str = "TOPIC_ARN";
