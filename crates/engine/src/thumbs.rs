//! Precomputed thumbnail cache
//!
//! Stores ready-to-serve cover payloads keyed by collection id. Entries
//! carry the configured TTL and expire rather than being invalidated:
//! a bounded staleness window in exchange for never coordinating
//! invalidation with the image pipeline. Rebuild pushes payloads through
//! [`ThumbnailCache::put_many`], one round-trip for a whole batch.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use mosaic_index_core::{CollectionId, IndexStore, RawThumbnail, Result, ThumbnailPayload};
use std::sync::Arc;
use std::time::Duration;

/// Typed access to the store's thumbnail blob operations.
#[derive(Clone)]
pub struct ThumbnailCache {
    store: Arc<dyn IndexStore>,
    ttl: Option<Duration>,
}

impl ThumbnailCache {
    /// Cache over the given store with the given TTL (`None` = no
    /// expiration).
    pub fn new(store: Arc<dyn IndexStore>, ttl: Option<Duration>) -> Self {
        Self { store, ttl }
    }

    /// Build a servable payload from raw pipeline bytes.
    pub fn encode(raw: &RawThumbnail) -> ThumbnailPayload {
        ThumbnailPayload {
            mime: raw.mime.clone(),
            data_uri: format!("data:{};base64,{}", raw.mime, BASE64.encode(&raw.bytes)),
        }
    }

    /// Read a cached payload. Expired entries read as absent.
    ///
    /// # Errors
    /// Returns an error if the store operation fails.
    pub fn get(&self, id: &CollectionId) -> Result<Option<ThumbnailPayload>> {
        self.store.thumbnail_get(id)
    }

    /// Cache one payload under the configured TTL.
    ///
    /// # Errors
    /// Returns an error if the store operation fails.
    pub fn put(&self, id: &CollectionId, payload: &ThumbnailPayload) -> Result<()> {
        self.store.thumbnail_put(id, payload, self.ttl)
    }

    /// Cache a batch of payloads in one store round-trip.
    ///
    /// # Errors
    /// Returns an error if the store operation fails.
    pub fn put_many(&self, entries: &[(CollectionId, ThumbnailPayload)]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        self.store.thumbnail_put_many(entries, self.ttl)
    }

    /// Drop one cached payload.
    ///
    /// # Errors
    /// Returns an error if the store operation fails.
    pub fn remove(&self, id: &CollectionId) -> Result<bool> {
        self.store.thumbnail_remove(id)
    }

    /// Reclaim expired entries; returns how many were dropped.
    ///
    /// # Errors
    /// Returns an error if the store operation fails.
    pub fn purge_expired(&self) -> Result<u64> {
        self.store.thumbnail_purge_expired()
    }
}
