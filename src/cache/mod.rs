//! Manifest cache.
//!
//! An opaque key-value store of serialized descriptors keyed by manifest id.
//! Entries are replaced wholesale on every build; staleness is decided on
//! read from the descriptor's embedded `updated` stamp.

mod fs;
mod memory;

pub use fs::FsManifestCache;
pub use memory::MemoryManifestCache;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use presenter_core::{ManifestDescriptor, Result};
use std::sync::Arc;

use crate::config::{CacheBackend, CacheConfig};

/// Key-value store for serialized descriptors.
#[async_trait]
pub trait ManifestCache: Send + Sync {
    /// Stored bytes for `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Replace the entry for `key`.
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()>;
}

/// Outcome of reading a cache entry.
#[derive(Debug)]
pub enum Freshness {
    Fresh(Box<ManifestDescriptor>),
    /// Present but too old, or without a usable `updated` stamp.
    Stale,
    /// Present but not a descriptor.
    Corrupt,
}

/// Judge stored bytes against `now` and `max_age`.
pub fn evaluate(bytes: &[u8], now: DateTime<Utc>, max_age: Duration) -> Freshness {
    let descriptor = match ManifestDescriptor::from_slice(bytes) {
        Ok(d) => d,
        Err(_) => return Freshness::Corrupt,
    };
    match descriptor.updated() {
        Some(updated) if now - updated <= max_age => Freshness::Fresh(Box::new(descriptor)),
        _ => Freshness::Stale,
    }
}

/// Build the backend selected by `config`.
pub fn from_config(config: &CacheConfig) -> Arc<dyn ManifestCache> {
    match config.backend {
        CacheBackend::Fs => Arc::new(FsManifestCache::new(config.dir.clone())),
        CacheBackend::Memory => Arc::new(MemoryManifestCache::new()),
    }
}
