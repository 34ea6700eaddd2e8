//! # Pipeline Scenario Tests
//!
//! End-to-end runs of the join over in-memory stores.
//!
//! These tests verify:
//! - The reference bake/recipe/base-image fixture produces exactly its packages
//! - Missing package lists, missing AMIs and missing recipes never fail a run
//! - Duplicate package lines collapse to the later line
//! - Output does not depend on fetch concurrency or scan order

mod common;

use chrono::{TimeZone, Utc};
use common::{base_image, bake, pipeline, recipe, reference_stores, BAKES, BASE_IMAGES, RECIPES};
use image_packages::store::{MemoryBlobStore, MemoryMetadataStore};
use image_packages::{ImagePackagesPipeline, OutputRecord};
use std::sync::Arc;

fn packages(rows: &[OutputRecord]) -> Vec<(&str, &str)> {
    rows.iter()
        .map(|r| (r.package_name.as_str(), r.package_version.as_str()))
        .collect()
}

#[tokio::test]
async fn test_reference_scenario() {
    let (metadata, blobs) = reference_stores();
    let rows = pipeline(metadata, blobs, 4).run().await.unwrap();

    assert_eq!(
        packages(&rows),
        vec![("curl", "7.68.0-1"), ("openssl", "1.1.1f-1ubuntu2")]
    );
    for row in &rows {
        assert_eq!(row.recipe_id, "r1");
        assert_eq!(row.bake_id, "3");
        assert_eq!(row.base_name, "base-a");
        assert_eq!(row.base_ami_id, "ami-base");
        assert_eq!(
            row.base_eol_date,
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(row.source_ami_id, "ami-xyz");
        assert!(row.aws_account_ids.is_empty());
        assert_eq!(row.started_by, "alice");
        assert_eq!(
            row.started_at,
            Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
        );
    }
}

#[tokio::test]
async fn test_missing_package_list_yields_no_rows() {
    let metadata = MemoryMetadataStore::new()
        .with_item(BAKES, bake("r1", 4, Some("ami-abc")))
        .with_item(RECIPES, recipe("r1", "base-a", None));

    let rows = pipeline(metadata, MemoryBlobStore::new(), 1)
        .run()
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_bake_without_ami_is_not_fetched() {
    let blobs = MemoryBlobStore::new().with_object("packagelists/r1--5.txt", "curl 1\n");
    let metadata = MemoryMetadataStore::new()
        .with_item(BAKES, bake("r1", 5, None))
        .with_item(RECIPES, recipe("r1", "base-a", None));
    let blobs = Arc::new(blobs);
    let shared = Arc::clone(&blobs);

    let rows = ImagePackagesPipeline::new(Arc::new(metadata), shared, &common::spec(2))
        .run()
        .await
        .unwrap();

    assert!(rows.is_empty());
    assert_eq!(blobs.get_count(), 0);
}

#[tokio::test]
async fn test_duplicate_lines_keep_the_later_version() {
    let metadata = MemoryMetadataStore::new()
        .with_item(BAKES, bake("r1", 1, Some("ami-1")))
        .with_item(RECIPES, recipe("r1", "base-a", None));
    let blobs = MemoryBlobStore::new()
        .with_object("packagelists/r1--1.txt", "curl 7.0\nzlib 1.2\ncurl 7.1\n");

    let rows = pipeline(metadata, blobs, 1).run().await.unwrap();
    assert_eq!(packages(&rows), vec![("curl", "7.1"), ("zlib", "1.2")]);
}

#[tokio::test]
async fn test_encrypt_for_accounts_are_carried_and_default_empty() {
    let metadata = MemoryMetadataStore::new()
        .with_item(BAKES, bake("old", 1, Some("ami-1")))
        .with_item(BAKES, bake("new", 1, Some("ami-2")))
        .with_item(RECIPES, recipe("old", "base-a", None))
        .with_item(
            RECIPES,
            recipe("new", "base-a", Some(&["111111111111", "222222222222"])),
        );
    let blobs = MemoryBlobStore::new()
        .with_object("packagelists/old--1.txt", "curl 1\n")
        .with_object("packagelists/new--1.txt", "curl 2\n");

    let rows = pipeline(metadata, blobs, 2).run().await.unwrap();
    let by_recipe = |id: &str| rows.iter().find(|r| r.recipe_id == id).unwrap();

    assert!(by_recipe("old").aws_account_ids.is_empty());
    assert_eq!(
        by_recipe("new").aws_account_ids,
        vec!["111111111111", "222222222222"]
    );
}

#[tokio::test]
async fn test_missing_recipe_and_base_image_are_left_empty() {
    let metadata = MemoryMetadataStore::new()
        .with_item(BAKES, bake("orphan", 2, Some("ami-o")))
        .with_item(BAKES, bake("r1", 1, Some("ami-1")))
        .with_item(RECIPES, recipe("r1", "retired-base", None));
    let blobs = MemoryBlobStore::new()
        .with_object("packagelists/orphan--2.txt", "bash 5\n")
        .with_object("packagelists/r1--1.txt", "bash 4\n");

    let rows = pipeline(metadata, blobs, 2).run().await.unwrap();
    assert_eq!(rows.len(), 2);

    let orphan = rows.iter().find(|r| r.recipe_id == "orphan").unwrap();
    assert!(orphan.base_name.is_empty());
    assert_eq!(orphan.source_ami_id, "ami-o");

    let r1 = rows.iter().find(|r| r.recipe_id == "r1").unwrap();
    assert!(r1.base_name.is_empty());
    assert!(r1.base_ami_id.is_empty());
    assert_eq!(r1.base_eol_date, image_packages::time::epoch());
}

#[tokio::test]
async fn test_output_independent_of_concurrency_and_paging() {
    let build = || {
        let mut metadata = MemoryMetadataStore::new()
            .with_item(BASE_IMAGES, base_image("base-a", "ami-base", None))
            .with_item(RECIPES, recipe("r1", "base-a", None))
            .with_item(RECIPES, recipe("r2", "base-a", None));
        let mut blobs = MemoryBlobStore::new();
        for build in (1..=12).rev() {
            let recipe_id = if build % 2 == 0 { "r1" } else { "r2" };
            let ami_id = format!("ami-{build}");
            metadata = metadata.with_item(BAKES, bake(recipe_id, build, Some(&ami_id)));
            blobs = blobs.with_object(
                &format!("packagelists/{recipe_id}--{build}.txt"),
                format!("curl 7.{build}\nbash 5.{build}\nbad\n"),
            );
        }
        (metadata, blobs)
    };

    let (metadata, blobs) = build();
    let sequential = pipeline(metadata, blobs, 1).run().await.unwrap();

    let (metadata, blobs) = build();
    let parallel = pipeline(metadata.with_page_size(2), blobs, 8)
        .run()
        .await
        .unwrap();

    assert_eq!(sequential.len(), 24);
    assert_eq!(sequential, parallel);
}

#[tokio::test]
async fn test_repeated_runs_are_identical() {
    let (metadata, blobs) = reference_stores();
    let pipeline = pipeline(metadata, blobs, 3);

    let first = pipeline.run().await.unwrap();
    let second = pipeline.run().await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_malformed_bake_is_skipped_not_fatal() {
    let (metadata, blobs) = reference_stores();
    let mut broken = bake("r1", 9, Some("ami-9"));
    broken.insert(
        "buildNumber".to_string(),
        image_packages::model::AttributeValue::S("nine".to_string()),
    );
    let metadata = metadata.with_item(BAKES, broken);

    let rows = pipeline(metadata, blobs, 2).run().await.unwrap();
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn test_package_lists_at_bucket_root() {
    let (metadata, _) = reference_stores();
    let blobs = MemoryBlobStore::new().with_object(
        "r1--3.txt",
        "curl 7.68.0-1\nopenssl 1.1.1f-1ubuntu2\nbadline\n",
    );
    let mut root = common::spec(2);
    root.prefix = String::new();

    let rows = ImagePackagesPipeline::new(Arc::new(metadata), Arc::new(blobs), &root)
        .run()
        .await
        .unwrap();
    assert_eq!(
        packages(&rows),
        vec![("curl", "7.68.0-1"), ("openssl", "1.1.1f-1ubuntu2")]
    );
}
