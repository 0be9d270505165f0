//! Test doubles for the store and source contracts
//!
//! Used by engine unit tests and the integration suites:
//! - [`FailingStore`]: every operation reports the store as unreachable
//! - [`MemoryCollectionSource`]: mutable fixture source with controllable
//!   `updated_at`
//! - [`StaticThumbnailSource`]: canned raw thumbnail bytes per collection

use chrono::{DateTime, Utc};
use mosaic_index_core::{
    Collection, CollectionId, CollectionIndexState, CollectionSource, CollectionSummary,
    DashboardStatistics, Direction, Error, IndexStore, RankedSetId, RawThumbnail, Result,
    ScoreKey, ThumbnailPayload, ThumbnailSource,
};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::time::Duration;

/// A store whose every operation fails with
/// [`Error::StoreUnavailable`]. For exercising error propagation and
/// rebuild abort paths.
#[derive(Debug, Default)]
pub struct FailingStore;

impl FailingStore {
    fn unavailable<T>() -> Result<T> {
        Err(Error::StoreUnavailable("connection refused".into()))
    }
}

impl IndexStore for FailingStore {
    fn ranked_insert(&self, _: &RankedSetId, _: &CollectionId, _: ScoreKey) -> Result<()> {
        Self::unavailable()
    }
    fn ranked_remove(&self, _: &RankedSetId, _: &CollectionId) -> Result<bool> {
        Self::unavailable()
    }
    fn ranked_rank(&self, _: &RankedSetId, _: &CollectionId, _: Direction) -> Result<Option<u64>> {
        Self::unavailable()
    }
    fn ranked_range(
        &self,
        _: &RankedSetId,
        _: u64,
        _: u64,
        _: Direction,
    ) -> Result<Vec<CollectionId>> {
        Self::unavailable()
    }
    fn ranked_len(&self, _: &RankedSetId) -> Result<u64> {
        Self::unavailable()
    }
    fn ranked_members(&self, _: &RankedSetId) -> Result<Vec<CollectionId>> {
        Self::unavailable()
    }
    fn ranked_clear(&self, _: &RankedSetId) -> Result<()> {
        Self::unavailable()
    }
    fn ranked_sets(&self) -> Result<Vec<RankedSetId>> {
        Self::unavailable()
    }
    fn summary_put(&self, _: &CollectionSummary) -> Result<()> {
        Self::unavailable()
    }
    fn summary_get(&self, _: &CollectionId) -> Result<Option<CollectionSummary>> {
        Self::unavailable()
    }
    fn summary_get_many(&self, _: &[CollectionId]) -> Result<Vec<Option<CollectionSummary>>> {
        Self::unavailable()
    }
    fn summary_remove(&self, _: &CollectionId) -> Result<bool> {
        Self::unavailable()
    }
    fn summary_ids(&self) -> Result<Vec<CollectionId>> {
        Self::unavailable()
    }
    fn summary_count(&self) -> Result<u64> {
        Self::unavailable()
    }
    fn summary_scan(&self) -> Result<Vec<CollectionSummary>> {
        Self::unavailable()
    }
    fn state_put(&self, _: &CollectionIndexState) -> Result<()> {
        Self::unavailable()
    }
    fn state_get(&self, _: &CollectionId) -> Result<Option<CollectionIndexState>> {
        Self::unavailable()
    }
    fn state_remove(&self, _: &CollectionId) -> Result<bool> {
        Self::unavailable()
    }
    fn state_scan(&self) -> Result<Vec<CollectionIndexState>> {
        Self::unavailable()
    }
    fn thumbnail_put(&self, _: &CollectionId, _: &ThumbnailPayload, _: Option<Duration>) -> Result<()> {
        Self::unavailable()
    }
    fn thumbnail_put_many(
        &self,
        _: &[(CollectionId, ThumbnailPayload)],
        _: Option<Duration>,
    ) -> Result<()> {
        Self::unavailable()
    }
    fn thumbnail_get(&self, _: &CollectionId) -> Result<Option<ThumbnailPayload>> {
        Self::unavailable()
    }
    fn thumbnail_remove(&self, _: &CollectionId) -> Result<bool> {
        Self::unavailable()
    }
    fn thumbnail_purge_expired(&self) -> Result<u64> {
        Self::unavailable()
    }
    fn aggregate_put(&self, _: &DashboardStatistics) -> Result<()> {
        Self::unavailable()
    }
    fn aggregate_get(&self) -> Result<Option<DashboardStatistics>> {
        Self::unavailable()
    }
    fn purge_index(&self) -> Result<()> {
        Self::unavailable()
    }
}

/// In-memory fixture source. Tests insert and touch collections, then
/// point the rebuild orchestrator or verifier at it.
#[derive(Debug, Default)]
pub struct MemoryCollectionSource {
    records: Mutex<BTreeMap<CollectionId, Collection>>,
}

impl MemoryCollectionSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a collection.
    pub fn put(&self, collection: Collection) {
        self.records
            .lock()
            .insert(collection.id.clone(), collection);
    }

    /// Remove a collection, simulating a source-side delete.
    pub fn remove(&self, id: &CollectionId) -> Option<Collection> {
        self.records.lock().remove(id)
    }

    /// Advance a collection's `updated_at`, simulating a source-side
    /// mutation the write path failed to deliver.
    pub fn touch(&self, id: &CollectionId, updated_at: DateTime<Utc>) {
        if let Some(record) = self.records.lock().get_mut(id) {
            record.updated_at = updated_at;
        }
    }
}

impl CollectionSource for MemoryCollectionSource {
    fn get(&self, id: &CollectionId) -> Result<Option<Collection>> {
        Ok(self.records.lock().get(id).cloned())
    }

    fn fetch_all(&self) -> Result<Vec<Collection>> {
        Ok(self.records.lock().values().cloned().collect())
    }

    fn count(&self) -> Result<u64> {
        Ok(self.records.lock().len() as u64)
    }
}

/// Thumbnail source returning canned bytes for registered media ids and
/// `None` otherwise.
#[derive(Debug, Default)]
pub struct StaticThumbnailSource {
    thumbs: Mutex<BTreeMap<String, RawThumbnail>>,
}

impl StaticThumbnailSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register bytes for a media id.
    pub fn put(&self, media_id: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) {
        self.thumbs.lock().insert(
            media_id.into(),
            RawThumbnail {
                mime: mime.into(),
                bytes,
            },
        );
    }
}

impl ThumbnailSource for StaticThumbnailSource {
    fn fetch(&self, _collection_id: &CollectionId, media_id: &str) -> Result<Option<RawThumbnail>> {
        Ok(self.thumbs.lock().get(media_id).cloned())
    }
}
