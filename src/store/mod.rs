//! # Store Modules
//!
//! Narrow interfaces over the two backing stores.
//!
//! - `MetadataStore`: full-table snapshots and point lookups (DynamoDB)
//! - `BlobStore`: object reads and key enumeration (S3)
//!
//! Both must return complete results. Paged responses are drained through
//! [`pagination::drain_pages`]; a store that signals more data without a
//! cursor fails with [`StoreError::Truncated`] instead of returning a
//! partial set.

use crate::error::StoreError;
use crate::model::Item;
use async_trait::async_trait;

/// Store of metadata tables (bakes, recipes, base images)
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Every item of `table`, across all pages
    async fn list_all(&self, table: &str) -> Result<Vec<Item>, StoreError>;

    /// Item of `table` whose `id` attribute equals `id`, if any
    async fn get(&self, table: &str, id: &str) -> Result<Option<Item>, StoreError>;
}

/// Store of package-list objects
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Object content. A missing object is [`StoreError::NotFound`].
    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Every full key starting with `prefix`, across all pages
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

pub mod aws;
pub mod memory;
pub mod pagination;

pub use aws::{DynamoDbStore, S3Store};
pub use memory::{MemoryBlobStore, MemoryMetadataStore};
