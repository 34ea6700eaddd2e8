//! # Bake Packages
//!
//! Builds the `amigo_bake_packages` table from the bucket alone: every
//! package list under the prefix is fetched and parsed, and the image
//! and bake ids are taken from the object key.
//!
//! Keys are processed in sorted order, so a package repeated across
//! lists for the same `(image, bake)` resolves the same way every run.

use crate::error::{PipelineError, StoreError};
use crate::model::BakePackage;
use crate::observability::metrics;
use crate::parser::{parse_package_list, ParsedPackageList};
use crate::pipeline::keys::PackageListLayout;
use crate::pipeline::results::ResultBuilder;
use crate::pipeline::CancelFlag;
use crate::store::BlobStore;
use futures::stream::{self, StreamExt};
use tracing::{debug, info};

/// Enumerate, fetch and parse every package list under the layout's prefix
pub async fn collect_bake_packages(
    blobs: &dyn BlobStore,
    layout: &PackageListLayout,
    concurrency: usize,
    cancel: &CancelFlag,
) -> Result<Vec<BakePackage>, PipelineError> {
    let mut keys = blobs.list_keys(&layout.list_prefix()).await?;
    keys.sort();
    info!(keys = keys.len(), "Listed package lists");

    let lists: Vec<(String, String, String)> = keys
        .into_iter()
        .filter_map(|key| match layout.parse_key(&key) {
            Some((image_id, bake_id)) => Some((key, image_id, bake_id)),
            None => {
                debug!(key = %key, "Skipping key that is not a package list");
                None
            }
        })
        .collect();

    let mut fetched = stream::iter(lists)
        .map(|(key, image_id, bake_id)| async move {
            let parsed = fetch_list(blobs, &key).await?;
            Ok::<_, StoreError>((image_id, bake_id, parsed))
        })
        .buffered(concurrency.max(1));

    let mut builder = ResultBuilder::new();
    while let Some(result) = fetched.next().await {
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        let (image_id, bake_id, parsed) = result?;
        for entry in parsed.entries {
            builder.insert(
                (image_id.clone(), bake_id.clone(), entry.name.clone()),
                BakePackage {
                    image_id: image_id.clone(),
                    bake_id: bake_id.clone(),
                    package_name: entry.name,
                    package_version: entry.version,
                },
            );
        }
    }
    if cancel.is_cancelled() {
        return Err(PipelineError::Cancelled);
    }

    metrics::increment_records_overwritten(builder.overwritten());
    Ok(builder.finish())
}

/// A list that vanished between listing and fetching contributes nothing
async fn fetch_list(blobs: &dyn BlobStore, key: &str) -> Result<ParsedPackageList, StoreError> {
    match blobs.get(key).await {
        Ok(data) => {
            let parsed = parse_package_list(&data, key);
            metrics::increment_package_lines_skipped(parsed.skipped_lines);
            Ok(parsed)
        }
        Err(StoreError::NotFound { .. }) => {
            debug!(key, "Package list disappeared after listing");
            Ok(ParsedPackageList::default())
        }
        Err(e) => Err(e),
    }
}
