//! Image Packages Library
//!
//! Extracts AMIgo bake records from DynamoDB and the per-bake package
//! lists from S3, and joins them into one row per package installed in
//! each bake.
//!
//! - [`store`]: DynamoDB/S3 readers plus in-memory stand-ins
//! - [`parser`]: package list parsing
//! - [`time`]: timestamp normalization
//! - [`pipeline`]: the join itself
//!
//! Tests are included in the module files and under `tests/`.

pub mod config;
pub mod constants;
pub mod error;
pub mod model;
pub mod observability;
pub mod parser;
pub mod pipeline;
pub mod store;
pub mod time;

pub use config::SourceSpec;
pub use error::{FieldError, PipelineError, StoreError};
pub use model::{BakePackage, OutputRecord, PackageEntry};
pub use pipeline::{CancelFlag, ImagePackagesPipeline};
