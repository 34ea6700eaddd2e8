//! # Observability
//!
//! - `logging`: tracing subscriber setup for the binary
//! - `metrics`: Prometheus metrics collection

pub mod logging;
pub mod metrics;
