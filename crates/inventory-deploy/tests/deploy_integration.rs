//! Live AWS integration tests.
//!
//! Everything here talks to real AWS and is ignored by default. Run with
//! credentials configured:
//!
//! ```text
//! cargo test -p inventory-deploy -- --ignored
//! ```
//!
//! Names are timestamped so parallel runs in the same account do not
//! collide; each test deletes what it created.

use inventory_deploy::aws::{
    get_current_account_id, ApiGatewayClient, AwsContext, DynamoDbClient, S3Client,
};
use inventory_deploy::discovery::NameMatch;

fn unique_name(prefix: &str) -> String {
    format!("{prefix}-{}", chrono::Utc::now().timestamp_millis())
}

#[tokio::test]
#[ignore = "requires AWS credentials"]
async fn caller_identity_resolves() {
    let ctx = AwsContext::from_env().await;
    let account = get_current_account_id(&ctx).await.unwrap();
    assert_eq!(account.len(), 12, "account ids are 12 digits");
    assert!(account.chars().all(|c| c.is_ascii_digit()));
}

#[tokio::test]
#[ignore = "requires AWS credentials"]
async fn bucket_create_adopt_delete() {
    let ctx = AwsContext::from_env().await;
    let s3 = S3Client::from_context(&ctx);
    let bucket = unique_name("inventory-it");

    assert!(
        s3.ensure_bucket(&bucket).await.unwrap(),
        "a fresh name must be created"
    );
    assert!(s3.bucket_exists(&bucket).await.unwrap());
    assert!(
        !s3.ensure_bucket(&bucket).await.unwrap(),
        "a second ensure must adopt, not create"
    );

    assert!(s3.delete_bucket(&bucket).await.unwrap());
    assert!(!s3.bucket_exists(&bucket).await.unwrap());
    assert!(
        !s3.delete_bucket(&bucket).await.unwrap(),
        "deleting again must report already-gone"
    );
}

#[tokio::test]
#[ignore = "requires AWS credentials"]
async fn api_discovery_skips_unrelated_names() {
    let ctx = AwsContext::from_env().await;
    let apigateway = ApiGatewayClient::from_context(&ctx);

    let matcher = NameMatch::exact(unique_name("inventory-it-no-such-api"));
    let ids = apigateway.find_api_ids(&matcher).await.unwrap();
    assert!(ids.is_empty(), "a never-deployed name must match nothing");
}

#[tokio::test]
#[ignore = "requires AWS credentials"]
async fn table_reaches_active_with_a_stream() {
    let ctx = AwsContext::from_env().await;
    let dynamodb = DynamoDbClient::from_context(&ctx);
    let table = unique_name("inventory-it");

    let ensured = dynamodb.ensure_table(&table).await.unwrap();
    assert!(ensured.created);
    assert!(ensured.stream_arn.is_some(), "the stream must be on");

    let adopted = dynamodb.ensure_table(&table).await.unwrap();
    assert!(!adopted.created, "a second ensure must adopt, not create");

    assert!(dynamodb.delete_table(&table).await.unwrap());
    assert!(
        dynamodb.await_table_gone(&table).await.unwrap(),
        "the name must be reusable after teardown"
    );
}
