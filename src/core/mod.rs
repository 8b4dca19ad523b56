//! Core utilities shared across the pipeline
//!
//! - `chunk`: order-preserving partitioning for batched downstream calls
//! - `http`: shared HTTP client construction
//! - `telemetry`: tracing subscriber setup

pub mod chunk;
pub mod http;
pub mod telemetry;

pub use chunk::chunkify;
pub use http::build_http_client;
