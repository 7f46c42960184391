//! The four workflows behind the binaries.
//!
//! Sequencing lives here; every individual cloud call lives in the service
//! wrappers under [`crate::aws`]. Deploy walks the dependency order
//! forwards, teardown walks it backwards, validate only reads, and
//! subscribe touches nothing but the topic.

mod deploy;
mod subscribe;
mod teardown;
mod validate;

pub use deploy::run_deploy;
pub use subscribe::run_subscribe;
pub use teardown::{run_teardown, TeardownReport};
pub use validate::run_validate;
