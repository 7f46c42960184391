//! inventory-common - Shared types and pipeline logic
//!
//! This crate provides the pieces shared by the Lambda functions and the
//! deployment tooling, without any AWS SDK dependencies to keep it
//! lightweight.
//!
//! ## Modules
//!
//! - [`defaults`]: Default configuration values and environment variable names
//! - [`item`]: The inventory record stored in the table
//! - [`ingest`]: CSV parsing with per-row error tolerance
//! - [`stock`]: Low-stock alert decision and message formatting
//! - [`routes`]: HTTP route resolution for the query API

pub mod defaults;
pub mod ingest;
pub mod item;
pub mod routes;
pub mod stock;

// Re-export commonly used types
pub use ingest::{parse_inventory_csv, CsvImport};
pub use item::InventoryItem;
pub use routes::QueryTarget;
pub use stock::StreamEventKind;
