//! # Model
//!
//! Records read from the metadata store and the rows this crate produces.
//!
//! ## Metadata layout
//!
//! - **bakes**: `recipeId` (S), `buildNumber` (N), `status` (S), `startedAt` (S),
//!   `startedBy` (S), `amiId` (S, absent until the bake produced an AMI)
//! - **recipes**: `id` (S), `baseImageId` (S), `encryptFor` (SS or L, optional)
//! - **base images**: `id` (S), `amiId` (S), `eolDate` (S, optional)

pub mod attribute;

pub use attribute::{AttributeValue, Item};

use crate::error::FieldError;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One execution of an AMI build for a recipe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BakeRecord {
    pub recipe_id: String,
    pub build_number: u64,
    pub status: String,
    /// Raw `startedAt` text; normalized when rows are built
    pub started_at: Option<String>,
    pub started_by: String,
    pub ami_id: Option<String>,
}

impl BakeRecord {
    pub fn from_item(item: &Item) -> Result<Self, FieldError> {
        Ok(Self {
            recipe_id: attribute::string(item, "recipeId")?.to_string(),
            build_number: attribute::unsigned(item, "buildNumber")?,
            status: attribute::optional_string(item, "status")?
                .unwrap_or_default()
                .to_string(),
            started_at: attribute::optional_string(item, "startedAt")?.map(str::to_string),
            started_by: attribute::optional_string(item, "startedBy")?
                .unwrap_or_default()
                .to_string(),
            ami_id: attribute::optional_string(item, "amiId")?
                .filter(|id| !id.is_empty())
                .map(str::to_string),
        })
    }

    /// Bake identifier as it appears in keys and rows
    #[must_use]
    pub fn bake_id(&self) -> String {
        self.build_number.to_string()
    }
}

/// A named build configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recipe {
    pub id: String,
    pub base_name: String,
    /// Accounts the resulting AMI is encrypted for; empty on older recipes
    pub encrypt_for: Vec<String>,
}

impl Recipe {
    pub fn from_item(item: &Item) -> Result<Self, FieldError> {
        Ok(Self {
            id: attribute::string(item, "id")?.to_string(),
            base_name: attribute::string(item, "baseImageId")?.to_string(),
            encrypt_for: attribute::string_list(item, "encryptFor")?,
        })
    }
}

/// The source image a recipe builds from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseImage {
    pub name: String,
    pub ami_id: String,
    /// Epoch when unknown or unparseable
    pub eol_date: DateTime<Utc>,
}

/// One `name version` line of a package list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageEntry {
    pub name: String,
    pub version: String,
}

/// One package installed in one bake, joined with its recipe and base image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputRecord {
    pub base_name: String,
    pub base_ami_id: String,
    pub base_eol_date: DateTime<Utc>,
    pub recipe_id: String,
    pub bake_id: String,
    pub source_ami_id: String,
    pub aws_account_ids: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub started_by: String,
    pub package_name: String,
    pub package_version: String,
}

/// One package of one bake, derived from the package-list bucket alone
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BakePackage {
    pub image_id: String,
    pub bake_id: String,
    pub package_name: String,
    pub package_version: String,
}
