//! # S3 Blob Store
//!
//! Reads package lists from the AMIgo bucket.
//!
//! `get` maps `NoSuchKey` (and bare 404 responses) to
//! [`StoreError::NotFound`]; everything else is a transport error.
//! `list_keys` follows `NextContinuationToken` until S3 reports the
//! listing is complete.

use crate::error::StoreError;
use crate::store::pagination::{drain_pages, Page};
use crate::store::BlobStore;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::Client as S3Client;
use tracing::{debug, debug_span, Instrument};

/// S3 blob store implementation
pub struct S3Store {
    client: S3Client,
    bucket: String,
}

impl std::fmt::Debug for S3Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Store")
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}

impl S3Store {
    #[must_use]
    pub fn new(sdk_config: &SdkConfig, bucket: impl Into<String>) -> Self {
        Self::from_client(S3Client::new(sdk_config), bucket)
    }

    #[must_use]
    pub fn from_client(client: S3Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    async fn list_page(
        &self,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> Result<Page<String, String>, StoreError> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .set_continuation_token(continuation_token)
            .send()
            .await
            .map_err(|e| StoreError::transport("s3.list_objects_v2", e))?;

        let items: Vec<String> = output
            .contents()
            .iter()
            .filter_map(|object| object.key().map(str::to_string))
            .collect();
        let truncated = output.is_truncated().unwrap_or(false);
        debug!(prefix, keys = items.len(), truncated, "Listed page");

        Ok(Page {
            items,
            next: output.next_continuation_token().map(str::to_string),
            truncated,
        })
    }
}

#[async_trait]
impl BlobStore for S3Store {
    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let span = debug_span!("s3.get_object", bucket = %self.bucket, key = key);
        async move {
            let output = match self
                .client
                .get_object()
                .bucket(&self.bucket)
                .key(key)
                .send()
                .await
            {
                Ok(output) => output,
                Err(e) => {
                    let no_such_key = e
                        .as_service_error()
                        .is_some_and(GetObjectError::is_no_such_key);
                    let status_404 = e
                        .raw_response()
                        .is_some_and(|response| response.status().as_u16() == 404);
                    if no_such_key || status_404 {
                        return Err(StoreError::NotFound {
                            key: key.to_string(),
                        });
                    }
                    return Err(StoreError::transport("s3.get_object", e));
                }
            };

            let data = output
                .body
                .collect()
                .await
                .map_err(|e| StoreError::transport("s3.get_object body", e))?
                .into_bytes();
            debug!(bytes = data.len(), "Fetched object");
            Ok(data.to_vec())
        }
        .instrument(span)
        .await
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let span = debug_span!("s3.list_objects", bucket = %self.bucket, prefix = prefix);
        drain_pages("s3.list_objects_v2", |token| self.list_page(prefix, token))
            .instrument(span)
            .await
    }
}
