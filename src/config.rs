//! # Configuration
//!
//! Source settings: the bucket holding package lists and the three AMIgo
//! tables. Loaded from a YAML/JSON spec file or from environment
//! variables, then overridden by command-line flags.
//!
//! ```yaml
//! bucket: amigo-data-prod
//! bakes_table: amigo-prod-bakes
//! recipes_table: amigo-prod-recipes
//! base_images_table: amigo-prod-base-images
//! ```

use crate::constants::{
    DEFAULT_CONCURRENCY, DEFAULT_PACKAGE_LIST_PREFIX, DEFAULT_REGION, ENV_PREFIX, MAX_CONCURRENCY,
};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Source configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceSpec {
    /// Bucket holding `<prefix>/<recipeId>--<bakeId>.txt` package lists
    pub bucket: String,
    pub bakes_table: String,
    pub recipes_table: String,
    pub base_images_table: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Package lists fetched in parallel; 1 fetches strictly one at a time
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

/// Names of the three metadata tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub bakes: String,
    pub recipes: String,
    pub base_images: String,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_prefix() -> String {
    DEFAULT_PACKAGE_LIST_PREFIX.to_string()
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn require(fields: &[(&str, &str)]) -> Result<()> {
    for (name, value) in fields {
        if value.trim().is_empty() {
            bail!("`{name}` must be set");
        }
    }
    Ok(())
}

/// One of the three metadata tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataTable {
    Bakes,
    Recipes,
    BaseImages,
}

impl MetadataTable {
    /// Settings key naming this table
    #[must_use]
    pub fn field(self) -> &'static str {
        match self {
            Self::Bakes => "bakes_table",
            Self::Recipes => "recipes_table",
            Self::BaseImages => "base_images_table",
        }
    }
}

impl SourceSpec {
    /// Load from `IMAGE_PACKAGES_*` environment variables.
    /// Missing names are left empty and caught by [`SourceSpec::validate`].
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup (keys include the prefix)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));
        let concurrency = match var("CONCURRENCY") {
            Some(value) => value.trim().parse().with_context(|| {
                format!("{ENV_PREFIX}CONCURRENCY must be a positive integer, got {value:?}")
            })?,
            None => DEFAULT_CONCURRENCY,
        };
        Ok(Self {
            bucket: var("BUCKET").unwrap_or_default(),
            bakes_table: var("BAKES_TABLE").unwrap_or_default(),
            recipes_table: var("RECIPES_TABLE").unwrap_or_default(),
            base_images_table: var("BASE_IMAGES_TABLE").unwrap_or_default(),
            region: var("REGION").unwrap_or_else(default_region),
            prefix: var("PREFIX").unwrap_or_else(default_prefix),
            concurrency,
        })
    }

    /// Load from a YAML or JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read: {}", path.display()))?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON spec: {}", path.display()))
        } else {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML spec: {}", path.display()))
        }
    }

    /// Reject settings no pipeline run could succeed with
    pub fn validate(&self) -> Result<()> {
        require(&[
            ("bucket", self.bucket.as_str()),
            ("bakes_table", self.bakes_table.as_str()),
            ("recipes_table", self.recipes_table.as_str()),
            ("base_images_table", self.base_images_table.as_str()),
            ("region", self.region.as_str()),
        ])?;
        if self.concurrency == 0 || self.concurrency > MAX_CONCURRENCY {
            bail!(
                "`concurrency` must be between 1 and {MAX_CONCURRENCY}, got {}",
                self.concurrency
            );
        }
        Ok(())
    }

    /// Reject settings a single-item lookup in `table` could not succeed with.
    /// The bucket and the other tables are not consulted.
    pub fn validate_lookup(&self, table: MetadataTable) -> Result<()> {
        require(&[(table.field(), self.table(table)), ("region", self.region.as_str())])
    }

    #[must_use]
    pub fn table(&self, table: MetadataTable) -> &str {
        match table {
            MetadataTable::Bakes => &self.bakes_table,
            MetadataTable::Recipes => &self.recipes_table,
            MetadataTable::BaseImages => &self.base_images_table,
        }
    }

    #[must_use]
    pub fn table_names(&self) -> TableNames {
        TableNames {
            bakes: self.bakes_table.clone(),
            recipes: self.recipes_table.clone(),
            base_images: self.base_images_table.clone(),
        }
    }
}
