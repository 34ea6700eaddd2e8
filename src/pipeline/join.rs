//! # Join
//!
//! Pure steps of the join: indexing recipes and base images, selecting
//! the bakes that produced an AMI, and merging one bake's packages into
//! the result set.
//!
//! Joins are left-outer. A bake whose recipe or base image is missing
//! from the snapshot still yields rows, with the missing side left empty.

use crate::model::{attribute, BakeRecord, BaseImage, Item, OutputRecord, PackageEntry, Recipe};
use crate::observability::metrics;
use crate::pipeline::keys::RecordKey;
use crate::pipeline::results::ResultBuilder;
use crate::time::{epoch, parse_timestamp};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Recipes by id. Malformed recipes are skipped with a warning.
#[must_use]
pub fn index_recipes(items: &[Item]) -> HashMap<String, Recipe> {
    let mut index = HashMap::with_capacity(items.len());
    for item in items {
        match Recipe::from_item(item) {
            Ok(recipe) => {
                index.insert(recipe.id.clone(), recipe);
            }
            Err(e) => warn!(
                recipe_id = item_id(item),
                error = %e,
                "Skipping malformed recipe"
            ),
        }
    }
    index
}

/// Base images by name. Malformed base images are skipped with a warning;
/// a missing or unreadable `eolDate` only falls back to the epoch.
#[must_use]
pub fn index_base_images(items: &[Item]) -> HashMap<String, BaseImage> {
    let mut index = HashMap::with_capacity(items.len());
    for item in items {
        match base_image_from_item(item) {
            Ok(image) => {
                index.insert(image.name.clone(), image);
            }
            Err(e) => warn!(
                base_image = item_id(item),
                error = %e,
                "Skipping malformed base image"
            ),
        }
    }
    index
}

fn base_image_from_item(item: &Item) -> Result<BaseImage, crate::error::FieldError> {
    let name = attribute::string(item, "id")?;
    let ami_id = attribute::string(item, "amiId")?;

    let eol_date = match attribute::optional_string(item, "eolDate") {
        Ok(None) => epoch(),
        Ok(Some(text)) => {
            let (eol, ok) = parse_timestamp(text);
            if !ok {
                warn!(base_image = name, value = text, "Unparseable eolDate, using epoch");
            }
            eol
        }
        Err(e) => {
            warn!(base_image = name, error = %e, "Unreadable eolDate, using epoch");
            epoch()
        }
    };

    Ok(BaseImage {
        name: name.to_string(),
        ami_id: ami_id.to_string(),
        eol_date,
    })
}

/// Bakes that produced an AMI, ordered by recipe id then build number.
///
/// This order is the merge order of the run, which makes last-write-wins
/// independent of scan order.
#[must_use]
pub fn completed_bakes(items: &[Item]) -> Vec<BakeRecord> {
    let mut bakes = Vec::with_capacity(items.len());
    for item in items {
        metrics::increment_bakes();
        let bake = match BakeRecord::from_item(item) {
            Ok(bake) => bake,
            Err(e) => {
                warn!(
                    recipe_id = attribute::optional_string(item, "recipeId").ok().flatten(),
                    error = %e,
                    "Skipping malformed bake"
                );
                metrics::increment_bakes_skipped("malformed");
                continue;
            }
        };
        if bake.ami_id.is_none() {
            info!(
                recipe_id = %bake.recipe_id,
                bake_id = bake.build_number,
                status = %bake.status,
                "Skipping bake without an AMI"
            );
            metrics::increment_bakes_skipped("no_ami");
            continue;
        }
        bakes.push(bake);
    }
    bakes.sort_by(|a, b| {
        (a.recipe_id.as_str(), a.build_number).cmp(&(b.recipe_id.as_str(), b.build_number))
    });
    bakes
}

/// Merge one bake's packages into `builder`, in file order
pub fn merge_bake(
    builder: &mut ResultBuilder<RecordKey, OutputRecord>,
    bake: &BakeRecord,
    packages: &[PackageEntry],
    recipes: &HashMap<String, Recipe>,
    base_images: &HashMap<String, BaseImage>,
) {
    let Some(ami_id) = bake.ami_id.as_deref() else {
        return;
    };
    let bake_id = bake.bake_id();

    let missing_recipe;
    let recipe = if let Some(recipe) = recipes.get(&bake.recipe_id) {
        recipe
    } else {
        warn!(recipe_id = %bake.recipe_id, bake_id = %bake_id, "Recipe not found, joining with empty recipe");
        missing_recipe = Recipe::default();
        &missing_recipe
    };

    let missing_base;
    let base = if let Some(base) = base_images.get(&recipe.base_name) {
        base
    } else {
        if !recipe.base_name.is_empty() {
            warn!(
                recipe_id = %bake.recipe_id,
                base_image = %recipe.base_name,
                "Base image not found, joining with empty base image"
            );
        }
        missing_base = BaseImage::default();
        &missing_base
    };

    let started_at = started_at(bake, &bake_id);

    for package in packages {
        builder.insert(
            RecordKey {
                recipe_id: bake.recipe_id.clone(),
                bake_id: bake_id.clone(),
                ami_id: ami_id.to_string(),
                package_name: package.name.clone(),
            },
            OutputRecord {
                base_name: base.name.clone(),
                base_ami_id: base.ami_id.clone(),
                base_eol_date: base.eol_date,
                recipe_id: bake.recipe_id.clone(),
                bake_id: bake_id.clone(),
                source_ami_id: ami_id.to_string(),
                aws_account_ids: recipe.encrypt_for.clone(),
                started_at,
                started_by: bake.started_by.clone(),
                package_name: package.name.clone(),
                package_version: package.version.clone(),
            },
        );
    }
    debug!(recipe_id = %bake.recipe_id, bake_id = %bake_id, packages = packages.len(), "Merged bake");
}

fn started_at(bake: &BakeRecord, bake_id: &str) -> DateTime<Utc> {
    let Some(text) = bake.started_at.as_deref() else {
        debug!(recipe_id = %bake.recipe_id, bake_id, "Bake has no startedAt, using epoch");
        return epoch();
    };
    let (started, ok) = parse_timestamp(text);
    if !ok {
        warn!(recipe_id = %bake.recipe_id, bake_id, value = text, "Unparseable startedAt, using epoch");
    }
    started
}

fn item_id(item: &Item) -> Option<&str> {
    attribute::optional_string(item, "id").ok().flatten()
}
