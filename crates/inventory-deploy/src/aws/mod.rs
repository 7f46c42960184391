//! AWS service wrappers for the deployment workflow.
//!
//! One wrapper per service, each owning a single SDK client created from the
//! shared [`AwsContext`]. Wrappers implement the create-or-adopt and
//! tolerant-delete behavior; sequencing lives in the orchestrator.

pub mod account;
pub mod apigateway;
pub mod context;
pub mod dynamodb;
pub mod error;
pub mod iam;
pub mod lambda;
pub mod s3;
pub mod sns;

pub use account::{get_current_account_id, AccountId};
pub use apigateway::ApiGatewayClient;
pub use context::AwsContext;
pub use dynamodb::DynamoDbClient;
pub use error::AwsError;
pub use iam::IamClient;
pub use lambda::LambdaClient;
pub use s3::S3Client;
pub use sns::SnsClient;
