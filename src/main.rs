//! # Image Packages
//!
//! Command-line entry point for the image packages source.
//!
//! ## Overview
//!
//! 1. **Reads AMIgo metadata** - full scans of the bakes, recipes and base-images tables
//! 2. **Reads package lists** - `<prefix>/<recipeId>--<bakeId>.txt` objects from S3
//! 3. **Joins** - one row per package installed in each bake, with recipe and base image details
//! 4. **Emits** - newline-delimited JSON on stdout, only once the whole run succeeded
//!
//! ## Usage
//!
//! ```bash
//! # Joined rows, settings from IMAGE_PACKAGES_* environment variables
//! image-packages sync
//!
//! # Rows derived from the bucket alone, settings from a spec file
//! image-packages --config spec.yaml sync --table amigo-bake-packages
//!
//! # Look up a single recipe
//! image-packages get recipes ubuntu-focal-java
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use image_packages::model::attribute::item_to_json;
use image_packages::observability::logging::{init_tracing, LogFormat};
use image_packages::observability::metrics;
use image_packages::store::aws::load_sdk_config;
use image_packages::store::{DynamoDbStore, MetadataStore, S3Store};
use image_packages::config::MetadataTable;
use image_packages::{CancelFlag, ImagePackagesPipeline, SourceSpec};
use serde::Serialize;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Joins AMIgo bakes with their package lists
#[derive(Parser)]
#[command(name = "image-packages", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// YAML or JSON source spec; `IMAGE_PACKAGES_*` environment variables are used when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Bucket holding the package lists
    #[arg(long, global = true)]
    bucket: Option<String>,

    #[arg(long, global = true)]
    bakes_table: Option<String>,

    #[arg(long, global = true)]
    recipes_table: Option<String>,

    #[arg(long, global = true)]
    base_images_table: Option<String>,

    #[arg(long, global = true)]
    region: Option<String>,

    /// Package lists fetched in parallel
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    #[arg(long, global = true, value_enum, env = "LOG_FORMAT", default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline and print every row as JSON, one per line
    Sync {
        #[arg(long, value_enum, default_value_t = Table::ImagePackages)]
        table: Table,

        /// Write Prometheus metrics here after the run
        #[arg(long)]
        metrics_file: Option<PathBuf>,
    },
    /// Print a single recipe or base image
    Get {
        #[arg(value_enum)]
        table: LookupTable,
        id: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Table {
    ImagePackages,
    AmigoBakePackages,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LookupTable {
    Recipes,
    BaseImages,
}

impl From<LookupTable> for MetadataTable {
    fn from(table: LookupTable) -> Self {
        match table {
            LookupTable::Recipes => Self::Recipes,
            LookupTable::BaseImages => Self::BaseImages,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format)?;

    info!("Starting image-packages v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Build info: timestamp={}, datetime={}, git_hash={}",
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );

    let spec = load_spec(&cli)?;

    match cli.command {
        Commands::Sync {
            table,
            metrics_file,
        } => {
            spec.validate().context("Invalid source configuration")?;
            let sdk_config = load_sdk_config(&spec.region).await;
            let metadata = Arc::new(DynamoDbStore::new(&sdk_config));
            let blobs = Arc::new(S3Store::new(&sdk_config, spec.bucket.clone()));
            metrics::register_metrics()?;

            let cancel = CancelFlag::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupt received, cancelling run");
                    on_signal.cancel();
                }
            });

            let pipeline =
                ImagePackagesPipeline::new(metadata, blobs, &spec).with_cancel_flag(cancel);
            let outcome = sync(&pipeline, table).await;

            if let Some(path) = metrics_file {
                write_metrics(&path)?;
            }
            let rows = outcome?;
            info!("Wrote {} rows", rows);
        }
        Commands::Get { table, id } => {
            let table = MetadataTable::from(table);
            spec.validate_lookup(table).context("Invalid source configuration")?;
            let sdk_config = load_sdk_config(&spec.region).await;
            let metadata = DynamoDbStore::new(&sdk_config);

            let table_name = spec.table(table);
            let Some(item) = metadata
                .get(table_name, &id)
                .await
                .with_context(|| format!("Failed to read {id} from {table_name}"))?
            else {
                bail!("{id} not found in {table_name}");
            };
            println!("{}", serde_json::to_string_pretty(&item_to_json(&item))?);
        }
    }

    Ok(())
}

/// Spec file or environment, then command-line overrides. Validation is left
/// to each subcommand.
fn load_spec(cli: &Cli) -> Result<SourceSpec> {
    let mut spec = match &cli.config {
        Some(path) => SourceSpec::from_file(path)?,
        None => SourceSpec::from_env()?,
    };

    if let Some(bucket) = &cli.bucket {
        spec.bucket.clone_from(bucket);
    }
    if let Some(table) = &cli.bakes_table {
        spec.bakes_table.clone_from(table);
    }
    if let Some(table) = &cli.recipes_table {
        spec.recipes_table.clone_from(table);
    }
    if let Some(table) = &cli.base_images_table {
        spec.base_images_table.clone_from(table);
    }
    if let Some(region) = &cli.region {
        spec.region.clone_from(region);
    }
    if let Some(concurrency) = cli.concurrency {
        spec.concurrency = concurrency;
    }

    Ok(spec)
}

/// Run the pipeline for `table`; nothing is printed unless the whole run succeeds
async fn sync(pipeline: &ImagePackagesPipeline, table: Table) -> Result<usize> {
    match table {
        Table::ImagePackages => {
            let rows = pipeline.run().await.context("Sync of image_packages failed")?;
            write_rows(&rows)
        }
        Table::AmigoBakePackages => {
            let rows = pipeline
                .run_bake_packages()
                .await
                .context("Sync of amigo_bake_packages failed")?;
            write_rows(&rows)
        }
    }
}

/// Newline-delimited JSON on stdout
fn write_rows<T: Serialize>(rows: &[T]) -> Result<usize> {
    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for row in rows {
        serde_json::to_writer(&mut out, row)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(rows.len())
}

fn write_metrics(path: &Path) -> Result<()> {
    let text = metrics::render()?;
    std::fs::write(path, text)
        .with_context(|| format!("Failed to write metrics: {}", path.display()))
}
