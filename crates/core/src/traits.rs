//! Store and source abstractions
//!
//! The index never talks to a concrete backend. It is handed:
//! - an [`IndexStore`]: the ordered-set/keyed store the projection lives in
//! - a [`CollectionSource`]: the authoritative document store, read-only
//! - a [`ThumbnailSource`]: raw cover bytes for batch caching
//!
//! All three are injected as `Arc<dyn ...>` so tests substitute in-memory
//! fakes implementing the same contract.
//!
//! Contract notes for `IndexStore` implementors: every method is atomic
//! per key/set (a reader never observes a half-applied single call), but
//! there are no transactions across calls; multi-key writes are the
//! writer's problem. Ranks are 0-based. `ranked_rank` must be O(log N)
//! and `ranked_len` O(1); `ranked_range` O(log N + count).

use crate::error::Result;
use crate::reports::DashboardStatistics;
use crate::sort::{Direction, RankedSetId, ScoreKey};
use crate::summary::{CollectionIndexState, CollectionSummary, ThumbnailPayload};
use crate::types::{Collection, CollectionId};
use std::time::Duration;

/// The ordered-set/keyed store holding the derived projection.
///
/// Thread safety: all methods must be safe to call concurrently from
/// multiple threads. Readers must never be blocked indefinitely by
/// writers.
pub trait IndexStore: Send + Sync {
    // ---- ranked sets: one per (sort field × scope) ----

    /// Insert or reposition `id` in `set` under `key`.
    ///
    /// # Errors
    /// Returns [`StoreUnavailable`](crate::Error::StoreUnavailable) if the
    /// store cannot be reached.
    fn ranked_insert(&self, set: &RankedSetId, id: &CollectionId, key: ScoreKey) -> Result<()>;

    /// Remove `id` from `set`. Returns whether it was present.
    ///
    /// # Errors
    /// Returns an error if the store operation fails.
    fn ranked_remove(&self, set: &RankedSetId, id: &CollectionId) -> Result<bool>;

    /// 0-based rank of `id` in `set` for the given traversal direction,
    /// or `None` if the member is absent. Must be O(log N).
    ///
    /// # Errors
    /// Returns an error if the store operation fails.
    fn ranked_rank(
        &self,
        set: &RankedSetId,
        id: &CollectionId,
        direction: Direction,
    ) -> Result<Option<u64>>;

    /// Up to `count` members starting at rank `start` in the given
    /// direction. A `start` past the end yields an empty vector.
    ///
    /// # Errors
    /// Returns an error if the store operation fails.
    fn ranked_range(
        &self,
        set: &RankedSetId,
        start: u64,
        count: u64,
        direction: Direction,
    ) -> Result<Vec<CollectionId>>;

    /// Cardinality of `set`. Must be O(1). Unknown sets are empty.
    ///
    /// # Errors
    /// Returns an error if the store operation fails.
    fn ranked_len(&self, set: &RankedSetId) -> Result<u64>;

    /// Every member of `set`, in ascending key order.
    ///
    /// # Errors
    /// Returns an error if the store operation fails.
    fn ranked_members(&self, set: &RankedSetId) -> Result<Vec<CollectionId>>;

    /// Drop `set` entirely.
    ///
    /// # Errors
    /// Returns an error if the store operation fails.
    fn ranked_clear(&self, set: &RankedSetId) -> Result<()>;

    /// Every ranked set currently materialized, including dynamically
    /// created per-library and per-type sets. Used by the verifier's
    /// membership check and by maintenance.
    ///
    /// # Errors
    /// Returns an error if the store operation fails.
    fn ranked_sets(&self) -> Result<Vec<RankedSetId>>;

    // ---- summary records ----

    /// Write or wholesale-replace a summary.
    ///
    /// # Errors
    /// Returns an error if the store operation fails.
    fn summary_put(&self, summary: &CollectionSummary) -> Result<()>;

    /// Read a summary.
    ///
    /// # Errors
    /// Returns an error if the store operation fails.
    fn summary_get(&self, id: &CollectionId) -> Result<Option<CollectionSummary>>;

    /// Read several summaries, preserving order; absent ids yield `None`
    /// in place.
    ///
    /// # Errors
    /// Returns an error if the store operation fails.
    fn summary_get_many(&self, ids: &[CollectionId]) -> Result<Vec<Option<CollectionSummary>>>;

    /// Remove a summary. Returns whether it existed.
    ///
    /// # Errors
    /// Returns an error if the store operation fails.
    fn summary_remove(&self, id: &CollectionId) -> Result<bool>;

    /// Ids of every stored summary.
    ///
    /// # Errors
    /// Returns an error if the store operation fails.
    fn summary_ids(&self) -> Result<Vec<CollectionId>>;

    /// Number of stored summaries. O(1).
    ///
    /// # Errors
    /// Returns an error if the store operation fails.
    fn summary_count(&self) -> Result<u64>;

    /// Every stored summary. Search filters over this full set.
    ///
    /// # Errors
    /// Returns an error if the store operation fails.
    fn summary_scan(&self) -> Result<Vec<CollectionSummary>>;

    // ---- per-collection index state ----

    /// Write or replace index state.
    ///
    /// # Errors
    /// Returns an error if the store operation fails.
    fn state_put(&self, state: &CollectionIndexState) -> Result<()>;

    /// Read index state.
    ///
    /// # Errors
    /// Returns an error if the store operation fails.
    fn state_get(&self, id: &CollectionId) -> Result<Option<CollectionIndexState>>;

    /// Remove index state. Returns whether it existed.
    ///
    /// # Errors
    /// Returns an error if the store operation fails.
    fn state_remove(&self, id: &CollectionId) -> Result<bool>;

    /// Every stored index state record.
    ///
    /// # Errors
    /// Returns an error if the store operation fails.
    fn state_scan(&self) -> Result<Vec<CollectionIndexState>>;

    // ---- thumbnail payloads (TTL-bounded) ----

    /// Cache a thumbnail payload. `ttl = None` means no expiration.
    ///
    /// # Errors
    /// Returns an error if the store operation fails.
    fn thumbnail_put(
        &self,
        id: &CollectionId,
        payload: &ThumbnailPayload,
        ttl: Option<Duration>,
    ) -> Result<()>;

    /// Cache many payloads in one round-trip. Rebuild-scale batches go
    /// through here; per-item writes are a measured bottleneck.
    ///
    /// # Errors
    /// Returns an error if the store operation fails.
    fn thumbnail_put_many(
        &self,
        entries: &[(CollectionId, ThumbnailPayload)],
        ttl: Option<Duration>,
    ) -> Result<()>;

    /// Read a cached payload. Expired entries read as absent.
    ///
    /// # Errors
    /// Returns an error if the store operation fails.
    fn thumbnail_get(&self, id: &CollectionId) -> Result<Option<ThumbnailPayload>>;

    /// Drop a cached payload. Returns whether a live entry existed.
    ///
    /// # Errors
    /// Returns an error if the store operation fails.
    fn thumbnail_remove(&self, id: &CollectionId) -> Result<bool>;

    /// Reclaim expired payloads. Returns how many were dropped.
    ///
    /// # Errors
    /// Returns an error if the store operation fails.
    fn thumbnail_purge_expired(&self) -> Result<u64>;

    // ---- dashboard aggregate ----

    /// Store the aggregate snapshot.
    ///
    /// # Errors
    /// Returns an error if the store operation fails.
    fn aggregate_put(&self, stats: &DashboardStatistics) -> Result<()>;

    /// Read the aggregate snapshot.
    ///
    /// # Errors
    /// Returns an error if the store operation fails.
    fn aggregate_get(&self) -> Result<Option<DashboardStatistics>>;

    // ---- maintenance ----

    /// Clear every ranked set, summary, and state record. Thumbnail
    /// payloads (TTL-bounded) and the dashboard aggregate are left alone.
    /// Used by the Full rebuild before repopulating.
    ///
    /// # Errors
    /// Returns an error if the store operation fails.
    fn purge_index(&self) -> Result<()>;
}

/// Read-only view of the authoritative collection store.
pub trait CollectionSource: Send + Sync {
    /// Fetch one collection by id.
    ///
    /// # Errors
    /// Returns [`SourceUnavailable`](crate::Error::SourceUnavailable) if
    /// the source cannot be reached, never conflated with absence.
    fn get(&self, id: &CollectionId) -> Result<Option<Collection>>;

    /// Fetch a snapshot of every collection, for rebuild and verify.
    ///
    /// # Errors
    /// Returns an error if the source operation fails.
    fn fetch_all(&self) -> Result<Vec<Collection>>;

    /// Number of collections in the source.
    ///
    /// # Errors
    /// Returns an error if the source operation fails.
    fn count(&self) -> Result<u64>;
}

/// Raw thumbnail bytes as produced by the image pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawThumbnail {
    /// MIME type of `bytes`.
    pub mime: String,
    /// Encoded image bytes.
    pub bytes: Vec<u8>,
}

/// Supplier of raw thumbnail bytes for batch caching during rebuild.
pub trait ThumbnailSource: Send + Sync {
    /// Fetch the rendered thumbnail for a collection's first media item.
    /// `None` when no thumbnail has been rendered yet.
    ///
    /// # Errors
    /// Returns an error if the thumbnail backend fails.
    fn fetch(&self, collection_id: &CollectionId, media_id: &str) -> Result<Option<RawThumbnail>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn index_store_is_object_safe_and_send_sync() {
        fn accepts(_: &dyn IndexStore) {}
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        let _ = accepts as fn(&dyn IndexStore);
        assert_send::<Box<dyn IndexStore>>();
        assert_sync::<Box<dyn IndexStore>>();
    }

    #[test]
    fn collection_source_is_object_safe() {
        fn accepts(_: &dyn CollectionSource) {}
        let _ = accepts as fn(&dyn CollectionSource);
    }

    #[test]
    fn thumbnail_source_is_object_safe() {
        fn accepts(_: &dyn ThumbnailSource) {}
        let _ = accepts as fn(&dyn ThumbnailSource);
    }

    /// A source that always fails, for checking that connectivity errors
    /// surface as their own category instead of reading as "no data".
    struct UnreachableSource;

    impl CollectionSource for UnreachableSource {
        fn get(&self, _: &CollectionId) -> Result<Option<Collection>> {
            Err(Error::SourceUnavailable("connection reset".into()))
        }
        fn fetch_all(&self) -> Result<Vec<Collection>> {
            Err(Error::SourceUnavailable("connection reset".into()))
        }
        fn count(&self) -> Result<u64> {
            Err(Error::SourceUnavailable("connection reset".into()))
        }
    }

    #[test]
    fn source_errors_propagate_through_trait_object() {
        let source: Box<dyn CollectionSource> = Box::new(UnreachableSource);
        let err = source.fetch_all().unwrap_err();
        assert!(err.is_retryable());
        assert!(matches!(err, Error::SourceUnavailable(_)));
    }
}
