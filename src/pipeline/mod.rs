//! # Pipeline
//!
//! Joins AMIgo bakes with their recipes, base images and package lists.
//!
//! ## Flow
//!
//! 1. Read full snapshots of the bakes, recipes and base-images tables
//! 2. Index recipes by id and base images by name
//! 3. For every bake that produced an AMI, fetch and parse
//!    `<prefix>/<recipeId>--<bakeId>.txt`
//! 4. Merge one row per package into the result set, keyed by
//!    `(recipeId, bakeId, amiId, packageName)`
//!
//! Package lists are fetched `concurrency` at a time, but results are
//! merged strictly in bake order (recipe id, then build number), so
//! last-write-wins on duplicate keys is deterministic.
//!
//! ## Failure handling
//!
//! Malformed items, lines and timestamps are skipped or defaulted with a
//! warning. A missing package list means zero packages. Any other store
//! error, or cancellation, ends the run with no rows at all.

pub mod bake_packages;
pub mod join;
pub mod keys;
pub mod results;

pub use bake_packages::collect_bake_packages;
pub use keys::{PackageListLayout, RecordKey};
pub use results::ResultBuilder;

use crate::config::{SourceSpec, TableNames};
use crate::constants::{BAKE_PACKAGES_TABLE, IMAGE_PACKAGES_TABLE};
use crate::error::{PipelineError, StoreError};
use crate::model::{BakePackage, BakeRecord, Item, OutputRecord};
use crate::observability::metrics;
use crate::parser::{parse_package_list, ParsedPackageList};
use crate::store::{BlobStore, MetadataStore};
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, info_span, warn, Instrument};

/// External cancellation signal, checked between bakes
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Raw items of the three metadata tables, read once per run
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub bakes: Vec<Item>,
    pub recipes: Vec<Item>,
    pub base_images: Vec<Item>,
}

pub struct ImagePackagesPipeline {
    metadata: Arc<dyn MetadataStore>,
    blobs: Arc<dyn BlobStore>,
    tables: TableNames,
    layout: PackageListLayout,
    concurrency: usize,
    cancel: CancelFlag,
}

impl std::fmt::Debug for ImagePackagesPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePackagesPipeline")
            .field("tables", &self.tables)
            .field("layout", &self.layout)
            .field("concurrency", &self.concurrency)
            .finish_non_exhaustive()
    }
}

impl ImagePackagesPipeline {
    #[must_use]
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        blobs: Arc<dyn BlobStore>,
        spec: &SourceSpec,
    ) -> Self {
        Self {
            metadata,
            blobs,
            tables: spec.table_names(),
            layout: PackageListLayout::new(&spec.prefix),
            concurrency: spec.concurrency.max(1),
            cancel: CancelFlag::new(),
        }
    }

    #[must_use]
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Produce every `image_packages` row from current store state
    pub async fn run(&self) -> Result<Vec<OutputRecord>, PipelineError> {
        let span = info_span!("pipeline.run", table = IMAGE_PACKAGES_TABLE);
        async move {
            let start = Instant::now();
            let snapshot = self.snapshot().await?;
            let records = self.join(snapshot).await?;

            metrics::observe_run_duration(start.elapsed().as_secs_f64());
            metrics::increment_records_emitted(IMAGE_PACKAGES_TABLE, records.len());
            info!(
                records = records.len(),
                elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                "Run complete"
            );
            Ok(records)
        }
        .instrument(span)
        .await
    }

    /// Produce every `amigo_bake_packages` row from the bucket alone
    pub async fn run_bake_packages(&self) -> Result<Vec<BakePackage>, PipelineError> {
        let span = info_span!("pipeline.run", table = BAKE_PACKAGES_TABLE);
        async move {
            let start = Instant::now();
            let records = collect_bake_packages(
                self.blobs.as_ref(),
                &self.layout,
                self.concurrency,
                &self.cancel,
            )
            .await?;

            metrics::observe_run_duration(start.elapsed().as_secs_f64());
            metrics::increment_records_emitted(BAKE_PACKAGES_TABLE, records.len());
            info!(records = records.len(), "Run complete");
            Ok(records)
        }
        .instrument(span)
        .await
    }

    /// Read all three tables in full
    pub async fn snapshot(&self) -> Result<Snapshot, StoreError> {
        let (bakes, recipes, base_images) = futures::try_join!(
            self.metadata.list_all(&self.tables.bakes),
            self.metadata.list_all(&self.tables.recipes),
            self.metadata.list_all(&self.tables.base_images),
        )?;
        info!(
            bakes = bakes.len(),
            recipes = recipes.len(),
            base_images = base_images.len(),
            "Read metadata snapshot"
        );
        Ok(Snapshot {
            bakes,
            recipes,
            base_images,
        })
    }

    /// Join a snapshot with the package lists of its bakes
    pub async fn join(&self, snapshot: Snapshot) -> Result<Vec<OutputRecord>, PipelineError> {
        let recipes = join::index_recipes(&snapshot.recipes);
        let base_images = join::index_base_images(&snapshot.base_images);
        let bakes = join::completed_bakes(&snapshot.bakes);
        info!(bakes = bakes.len(), "Joining bakes with package lists");

        let mut lists = stream::iter(bakes)
            .map(|bake| self.fetch_package_list(bake))
            .buffered(self.concurrency);

        let mut builder = ResultBuilder::new();
        while let Some(fetched) = lists.next().await {
            if self.cancel.is_cancelled() {
                warn!("Run cancelled, discarding {} accumulated rows", builder.len());
                return Err(PipelineError::Cancelled);
            }
            let (bake, parsed) = fetched?;
            join::merge_bake(&mut builder, &bake, &parsed.entries, &recipes, &base_images);
        }
        if self.cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        metrics::increment_records_overwritten(builder.overwritten());
        Ok(builder.finish())
    }

    async fn fetch_package_list(
        &self,
        bake: BakeRecord,
    ) -> Result<(BakeRecord, ParsedPackageList), StoreError> {
        let key = self.layout.key_for(&bake.recipe_id, &bake.bake_id());
        let parsed = match self.blobs.get(&key).await {
            Ok(data) => parse_package_list(&data, &key),
            Err(StoreError::NotFound { .. }) => {
                info!(
                    recipe_id = %bake.recipe_id,
                    bake_id = bake.build_number,
                    key = %key,
                    "No package list for bake"
                );
                metrics::increment_package_lists_missing();
                ParsedPackageList::default()
            }
            Err(e) => return Err(e),
        };
        metrics::increment_package_lines_skipped(parsed.skipped_lines);
        Ok((bake, parsed))
    }
}
