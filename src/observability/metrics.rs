//! # Metrics
//!
//! Prometheus metrics for a pipeline run.
//!
//! ## Metrics Exposed
//!
//! - `image_packages_bakes_total` - Bakes read from the metadata store
//! - `image_packages_bakes_skipped_total` - Bakes skipped, by reason
//! - `image_packages_package_lists_missing_total` - Bakes with an AMI but no package list
//! - `image_packages_package_lines_skipped_total` - Malformed package lines skipped
//! - `image_packages_records_emitted_total` - Rows emitted
//! - `image_packages_records_overwritten_total` - Rows replaced by a later duplicate
//! - `image_packages_run_duration_seconds` - Duration of a complete run
//!
//! The binary writes these in text format at the end of a run when
//! `--metrics-file` is given (node-exporter textfile collector style).

use anyhow::Result;
use prometheus::{Encoder, Histogram, IntCounter, IntCounterVec, Registry, TextEncoder};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static BAKES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "image_packages_bakes_total",
        "Total number of bakes read from the metadata store",
    )
    .expect("Failed to create BAKES_TOTAL metric - this should never happen")
});

static BAKES_SKIPPED_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "image_packages_bakes_skipped_total",
            "Total number of bakes that produced no rows, by reason",
        ),
        &["reason"],
    )
    .expect("Failed to create BAKES_SKIPPED_TOTAL metric - this should never happen")
});

static PACKAGE_LISTS_MISSING_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "image_packages_package_lists_missing_total",
        "Total number of bakes with an AMI but no package list",
    )
    .expect("Failed to create PACKAGE_LISTS_MISSING_TOTAL metric - this should never happen")
});

static PACKAGE_LINES_SKIPPED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "image_packages_package_lines_skipped_total",
        "Total number of malformed package lines skipped",
    )
    .expect("Failed to create PACKAGE_LINES_SKIPPED_TOTAL metric - this should never happen")
});

static RECORDS_EMITTED_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "image_packages_records_emitted_total",
            "Total number of rows emitted, by table",
        ),
        &["table"],
    )
    .expect("Failed to create RECORDS_EMITTED_TOTAL metric - this should never happen")
});

static RECORDS_OVERWRITTEN_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "image_packages_records_overwritten_total",
        "Total number of rows replaced by a later row with the same key",
    )
    .expect("Failed to create RECORDS_OVERWRITTEN_TOTAL metric - this should never happen")
});

static RUN_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "image_packages_run_duration_seconds",
            "Duration of a complete pipeline run in seconds",
        )
        .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0]),
    )
    .expect("Failed to create RUN_DURATION metric - this should never happen")
});

#[allow(
    clippy::missing_errors_doc,
    reason = "Error documentation is provided in doc comments"
)]
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(BAKES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(BAKES_SKIPPED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(PACKAGE_LISTS_MISSING_TOTAL.clone()))?;
    REGISTRY.register(Box::new(PACKAGE_LINES_SKIPPED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECORDS_EMITTED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECORDS_OVERWRITTEN_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RUN_DURATION.clone()))?;
    Ok(())
}

/// Render every registered metric in Prometheus text format
pub fn render() -> Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

pub fn increment_bakes() {
    BAKES_TOTAL.inc();
}

pub fn increment_bakes_skipped(reason: &str) {
    BAKES_SKIPPED_TOTAL.with_label_values(&[reason]).inc();
}

pub fn increment_package_lists_missing() {
    PACKAGE_LISTS_MISSING_TOTAL.inc();
}

pub fn increment_package_lines_skipped(count: usize) {
    PACKAGE_LINES_SKIPPED_TOTAL.inc_by(count as u64);
}

pub fn increment_records_emitted(table: &str, count: usize) {
    RECORDS_EMITTED_TOTAL
        .with_label_values(&[table])
        .inc_by(count as u64);
}

pub fn increment_records_overwritten(count: usize) {
    RECORDS_OVERWRITTEN_TOTAL.inc_by(count as u64);
}

pub fn observe_run_duration(duration: f64) {
    RUN_DURATION.observe(duration);
}
