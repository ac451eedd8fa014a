//! Storage gateway for S3-compatible object storage
//!
//! This crate wraps an object-storage client behind a small facade that checks
//! bucket existence before every bucket or object operation and normalises the
//! results into booleans, optional values and lists.

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

/// Storage client abstraction and its S3 implementation
pub mod client;

/// Environment configuration
pub mod environment;

/// Bucket-existence-gated storage facade
pub mod gateway;

/// Tracing subscriber setup
pub mod logging;

pub use client::{S3StorageClient, StorageClient};
pub use environment::Environment;
pub use gateway::{
    GatewayConfig, GatewayError, GatewayResult, RemoveObjectsOutcome, StorageGateway,
};
