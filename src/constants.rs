//! # Constants
//!
//! Shared constants used throughout the pipeline.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Default AWS region for the AMIgo tables and bucket
pub const DEFAULT_REGION: &str = "eu-west-1";

/// Default key prefix under which package lists are stored in the bucket
pub const DEFAULT_PACKAGE_LIST_PREFIX: &str = "packagelists";

/// Default number of package-list fetches in flight at once
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Upper bound on configured fetch concurrency
/// Higher values mostly trade S3 throttling for nothing
pub const MAX_CONCURRENCY: usize = 128;

/// Suffix of every package-list object key
pub const PACKAGE_LIST_SUFFIX: &str = ".txt";

/// Separator between recipe id and bake id in package-list keys
pub const BAKE_KEY_SEPARATOR: &str = "--";

/// Output table: one row per (recipe, bake, AMI, package)
pub const IMAGE_PACKAGES_TABLE: &str = "image_packages";

/// Output table: one row per (image, bake, package), built from the bucket alone
pub const BAKE_PACKAGES_TABLE: &str = "amigo_bake_packages";

/// Prefix for environment variables read by `SourceSpec::from_env`
pub const ENV_PREFIX: &str = "IMAGE_PACKAGES_";
