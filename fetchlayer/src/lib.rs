//! Fetchlayer - tiered client-side caching and fetch orchestration.
//!
//! This library is the data layer for applications that sit on a remote
//! managed backend: it caches query results in three tiers (memory,
//! session, persistent), wraps asynchronous fetch operations with
//! cancellation, retry and lifecycle callbacks, and layers pagination
//! with speculative prefetch on top.
//!
//! # High-Level API
//!
//! ```ignore
//! use fetchlayer::cache::{CacheConfig, TieredCache};
//! use fetchlayer::fetch::{FetchOperation, FetchOptions};
//! use std::sync::Arc;
//!
//! let cache = Arc::new(TieredCache::new(CacheConfig::default()));
//! cache.load_persistent().await;
//!
//! let patients = FetchOperation::new(
//!     "patients.list",
//!     Arc::clone(&cache),
//!     move |filters, cancel| Box::pin(backend.query("patients", filters)),
//!     FetchOptions::default(),
//! );
//! let rows = patients.execute(filters).await?;
//! ```

pub mod backend;
pub mod cache;
pub mod fetch;
pub mod logging;
pub mod page;
pub mod time;

/// Version of the fetchlayer library and CLI.
///
/// Synchronized across all components in the workspace; injected from
/// `Cargo.toml` at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
