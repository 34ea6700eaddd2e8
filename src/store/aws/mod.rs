//! # AWS Stores
//!
//! DynamoDB-backed [`MetadataStore`](crate::store::MetadataStore) and
//! S3-backed [`BlobStore`](crate::store::BlobStore).
//!
//! Credentials come from the SDK's default credential chain. Locally, set
//! `AWS_PROFILE`; in-cluster, IRSA is picked up automatically.

use aws_config::SdkConfig;
use tracing::info;

pub mod dynamodb;
pub mod s3;

pub use dynamodb::DynamoDbStore;
pub use s3::S3Store;

/// Create AWS SDK config using the default credential chain
pub async fn load_sdk_config(region: &str) -> SdkConfig {
    info!("Loading AWS configuration for region {}", region);
    aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(region.to_string()))
        .load()
        .await
}
