//! Common test utilities for pipeline integration tests
//!
//! Builders for metadata items and a source spec pointing at fixed table
//! names, so every test wires the in-memory stores the same way.

#![allow(dead_code, reason = "Not every test binary uses every helper")]

use image_packages::model::{AttributeValue, Item};
use image_packages::store::{MemoryBlobStore, MemoryMetadataStore};
use image_packages::{ImagePackagesPipeline, SourceSpec};
use std::sync::Arc;

pub const BAKES: &str = "amigo-test-bakes";
pub const RECIPES: &str = "amigo-test-recipes";
pub const BASE_IMAGES: &str = "amigo-test-base-images";
pub const BUCKET: &str = "amigo-test-data";

pub fn spec(concurrency: usize) -> SourceSpec {
    SourceSpec {
        bucket: BUCKET.to_string(),
        bakes_table: BAKES.to_string(),
        recipes_table: RECIPES.to_string(),
        base_images_table: BASE_IMAGES.to_string(),
        region: "eu-west-1".to_string(),
        prefix: "packagelists".to_string(),
        concurrency,
    }
}

fn s(value: &str) -> AttributeValue {
    AttributeValue::S(value.to_string())
}

pub fn bake(recipe_id: &str, build_number: u64, ami_id: Option<&str>) -> Item {
    let mut item: Item = [
        ("recipeId".to_string(), s(recipe_id)),
        (
            "buildNumber".to_string(),
            AttributeValue::N(build_number.to_string()),
        ),
        ("status".to_string(), s("Complete")),
        ("startedAt".to_string(), s("2024-03-01T10:00:00Z")),
        ("startedBy".to_string(), s("alice")),
    ]
    .into_iter()
    .collect();
    if let Some(ami_id) = ami_id {
        item.insert("amiId".to_string(), s(ami_id));
    }
    item
}

pub fn recipe(id: &str, base_name: &str, encrypt_for: Option<&[&str]>) -> Item {
    let mut item: Item = [
        ("id".to_string(), s(id)),
        ("baseImageId".to_string(), s(base_name)),
    ]
    .into_iter()
    .collect();
    if let Some(accounts) = encrypt_for {
        item.insert(
            "encryptFor".to_string(),
            AttributeValue::Ss(accounts.iter().map(|a| (*a).to_string()).collect()),
        );
    }
    item
}

pub fn base_image(name: &str, ami_id: &str, eol_date: Option<&str>) -> Item {
    let mut item: Item = [("id".to_string(), s(name)), ("amiId".to_string(), s(ami_id))]
        .into_iter()
        .collect();
    if let Some(eol) = eol_date {
        item.insert("eolDate".to_string(), s(eol));
    }
    item
}

/// The reference fixture: bake r1/3 on base-a with a three-line list, one line bad
pub fn reference_stores() -> (MemoryMetadataStore, MemoryBlobStore) {
    let metadata = MemoryMetadataStore::new()
        .with_item(BAKES, bake("r1", 3, Some("ami-xyz")))
        .with_item(RECIPES, recipe("r1", "base-a", None))
        .with_item(
            BASE_IMAGES,
            base_image("base-a", "ami-base", Some("2025-01-01T00:00:00Z")),
        );
    let blobs = MemoryBlobStore::new().with_object(
        "packagelists/r1--3.txt",
        "curl 7.68.0-1\nopenssl 1.1.1f-1ubuntu2\nbadline\n",
    );
    (metadata, blobs)
}

pub fn pipeline(
    metadata: MemoryMetadataStore,
    blobs: MemoryBlobStore,
    concurrency: usize,
) -> ImagePackagesPipeline {
    ImagePackagesPipeline::new(Arc::new(metadata), Arc::new(blobs), &spec(concurrency))
}
