//! Index writer: the single mutation path into the projection
//!
//! `upsert` and `remove` touch several keys per call (summary, one ranked
//! entry per sort field and scope, index state, cached thumbnail). The
//! store only guarantees per-key atomicity, so the write order here is
//! chosen to fail safe: the index state, the freshness marker ChangedOnly
//! rebuild keys off, is written last. A failure partway leaves the entry
//! stale, and the next ChangedOnly run rewrites it wholesale.
//!
//! Concurrency contract: calls for different ids run fully in parallel.
//! The writer does NOT serialize concurrent mutations of the same id;
//! the write-path caller owns that (upstream per-entity lock or a
//! single-writer queue).

use crate::codec::score_key;
use crate::projector::project;
use mosaic_index_core::{
    Collection, CollectionId, CollectionIndexState, CollectionSummary, IndexStore, RankedSetId,
    Result, ThumbnailPayload,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

/// Writes summaries, ranked entries, and index state as one logical unit.
#[derive(Clone)]
pub struct IndexWriter {
    store: Arc<dyn IndexStore>,
}

impl IndexWriter {
    /// Writer over the given store.
    pub fn new(store: Arc<dyn IndexStore>) -> Self {
        Self { store }
    }

    /// Project `collection` and write it into the index.
    ///
    /// Returns the summary that was previously stored for the id, if any
    /// (callers use it to derive aggregate patches).
    ///
    /// # Errors
    /// Any sub-step failure is surfaced; the entry is then stale, never
    /// torn beyond one in-flight upsert.
    pub fn upsert(&self, collection: &Collection) -> Result<Option<CollectionSummary>> {
        self.upsert_with_thumbnail(collection, None)
    }

    /// Like [`upsert`](Self::upsert), with a precomputed thumbnail payload
    /// to embed in the summary (rebuild attaches these after batch-caching
    /// the bytes).
    pub fn upsert_with_thumbnail(
        &self,
        collection: &Collection,
        thumbnail: Option<ThumbnailPayload>,
    ) -> Result<Option<CollectionSummary>> {
        let mut summary = project(collection);

        // Preserve an already-cached payload when this write has none:
        // write-path upserts never touch the image pipeline.
        let has_cached_thumbnail = match &thumbnail {
            Some(_) => true,
            None => self.store.thumbnail_get(&collection.id)?.is_some(),
        };
        summary.thumbnail = thumbnail;

        let previous = self.store.summary_get(&collection.id)?;
        self.store.summary_put(&summary)?;

        // A moved collection leaves its old library/type sets.
        if let Some(prev) = &previous {
            self.remove_stale_scoped_entries(prev, &summary)?;
        }

        for set in RankedSetId::sets_for(&summary.library_id, &summary.kind) {
            let key = score_key(&summary, set.field);
            self.store.ranked_insert(&set, &summary.id, key)?;
        }

        let state = CollectionIndexState {
            collection_id: collection.id.clone(),
            indexed_at: Utc::now(),
            source_updated_at: collection.updated_at,
            image_count: collection.image_count,
            thumbnail_count: collection.thumbnail_count,
            cache_entry_count: collection.cache_entry_count,
            has_cached_thumbnail,
        };
        self.store.state_put(&state)?;

        debug!(id = %collection.id, library = %collection.library_id, "indexed collection");
        Ok(previous)
    }

    /// Remove a collection from the index: summary, every ranked entry,
    /// index state, and cached thumbnail. Idempotent; removing an absent
    /// id is a no-op returning `None`.
    ///
    /// Returns the summary that was removed, if one existed.
    ///
    /// # Errors
    /// Returns an error if a store operation fails.
    pub fn remove(&self, id: &CollectionId) -> Result<Option<CollectionSummary>> {
        let previous = self.store.summary_get(id)?;

        match &previous {
            Some(summary) => {
                for set in RankedSetId::sets_for(&summary.library_id, &summary.kind) {
                    self.store.ranked_remove(&set, id)?;
                }
            }
            None => {
                // No summary to learn scopes from; sweep every
                // materialized set so stray entries cannot survive.
                for set in self.store.ranked_sets()? {
                    self.store.ranked_remove(&set, id)?;
                }
            }
        }

        self.store.summary_remove(id)?;
        self.store.state_remove(id)?;
        self.store.thumbnail_remove(id)?;

        if previous.is_some() {
            debug!(id = %id, "removed collection from index");
        }
        Ok(previous)
    }

    /// Remove ranked entries from scopes the collection no longer
    /// belongs to after a library or type change.
    fn remove_stale_scoped_entries(
        &self,
        previous: &CollectionSummary,
        current: &CollectionSummary,
    ) -> Result<()> {
        use mosaic_index_core::{Scope, SortField};

        let mut stale_scopes = Vec::new();
        if previous.library_id != current.library_id {
            stale_scopes.push(Scope::Library(previous.library_id.clone()));
        }
        if previous.kind != current.kind {
            stale_scopes.push(Scope::Kind(previous.kind.clone()));
        }
        for scope in stale_scopes {
            for field in SortField::ALL {
                self.store
                    .ranked_remove(&RankedSetId::new(field, scope.clone()), &current.id)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use mosaic_index_core::{
        CollectionKind, Direction, Error, LibraryId, MediaRef, Scope, SortField,
    };
    use mosaic_index_store::testing::FailingStore;
    use mosaic_index_store::MemoryIndexStore;

    fn collection(id: &str, name: &str, lib: &str, kind: &str) -> Collection {
        Collection {
            id: CollectionId::new(id),
            name: name.into(),
            description: None,
            library_id: LibraryId::new(lib),
            kind: CollectionKind::new(kind),
            path: format!("/{}", id),
            tags: vec![],
            first_media: Some(MediaRef {
                media_id: format!("{}-m1", id),
                thumbnail: Some(format!("thumbs/{}.jpg", id)),
            }),
            image_count: 1,
            thumbnail_count: 1,
            cache_entry_count: 0,
            total_size_bytes: 100,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
        }
    }

    fn writer_over_memory() -> (IndexWriter, Arc<MemoryIndexStore>) {
        let store = Arc::new(MemoryIndexStore::new());
        (IndexWriter::new(store.clone()), store)
    }

    #[test]
    fn test_upsert_writes_summary_sets_and_state() {
        let (writer, store) = writer_over_memory();
        let c = collection("a", "Alpha", "lib-1", "album");

        assert!(writer.upsert(&c).unwrap().is_none());

        let summary = store.summary_get(&c.id).unwrap().unwrap();
        assert_eq!(summary.name, "Alpha");

        // 5 fields × (global + library + kind) scopes
        assert_eq!(store.ranked_sets().unwrap().len(), 15);

        let state = store.state_get(&c.id).unwrap().unwrap();
        assert_eq!(state.source_updated_at, c.updated_at);
        assert!(state.is_fresh(c.updated_at));
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let (writer, store) = writer_over_memory();
        let c = collection("a", "Alpha", "lib-1", "album");

        writer.upsert(&c).unwrap();
        let first_summary = store.summary_get(&c.id).unwrap();
        let previous = writer.upsert(&c).unwrap();

        assert_eq!(previous, first_summary);
        assert_eq!(store.summary_count().unwrap(), 1);
        let global = RankedSetId::new(SortField::UpdatedAt, Scope::Global);
        assert_eq!(store.ranked_len(&global).unwrap(), 1);
    }

    #[test]
    fn test_upsert_returns_previous_summary() {
        let (writer, _) = writer_over_memory();
        let mut c = collection("a", "Alpha", "lib-1", "album");
        writer.upsert(&c).unwrap();

        c.name = "Alpha II".into();
        let previous = writer.upsert(&c).unwrap().unwrap();
        assert_eq!(previous.name, "Alpha");
    }

    #[test]
    fn test_library_move_leaves_old_scope() {
        let (writer, store) = writer_over_memory();
        let mut c = collection("a", "Alpha", "lib-1", "album");
        writer.upsert(&c).unwrap();

        c.library_id = LibraryId::new("lib-2");
        writer.upsert(&c).unwrap();

        let old_scope = RankedSetId::new(
            SortField::UpdatedAt,
            Scope::Library(LibraryId::new("lib-1")),
        );
        let new_scope = RankedSetId::new(
            SortField::UpdatedAt,
            Scope::Library(LibraryId::new("lib-2")),
        );
        assert_eq!(store.ranked_len(&old_scope).unwrap(), 0);
        assert_eq!(store.ranked_len(&new_scope).unwrap(), 1);
    }

    #[test]
    fn test_kind_change_leaves_old_scope() {
        let (writer, store) = writer_over_memory();
        let mut c = collection("a", "Alpha", "lib-1", "album");
        writer.upsert(&c).unwrap();

        c.kind = CollectionKind::new("series");
        writer.upsert(&c).unwrap();

        let old_scope = RankedSetId::new(
            SortField::Name,
            Scope::Kind(CollectionKind::new("album")),
        );
        assert_eq!(store.ranked_len(&old_scope).unwrap(), 0);
    }

    #[test]
    fn test_remove_clears_every_trace() {
        let (writer, store) = writer_over_memory();
        let c = collection("a", "Alpha", "lib-1", "album");
        writer.upsert(&c).unwrap();

        let removed = writer.remove(&c.id).unwrap();
        assert!(removed.is_some());

        assert!(store.summary_get(&c.id).unwrap().is_none());
        assert!(store.state_get(&c.id).unwrap().is_none());
        assert!(store.ranked_sets().unwrap().is_empty());
    }

    #[test]
    fn test_remove_absent_id_is_noop() {
        let (writer, _) = writer_over_memory();
        assert!(writer.remove(&CollectionId::new("ghost")).unwrap().is_none());
    }

    #[test]
    fn test_remove_sweeps_orphaned_set_entries() {
        let (writer, store) = writer_over_memory();
        // A stray ranked entry with no summary, as left by a torn write
        let set = RankedSetId::new(SortField::UpdatedAt, Scope::Global);
        store
            .ranked_insert(&set, &CollectionId::new("stray"), mosaic_index_core::ScoreKey::from_bytes([1]))
            .unwrap();

        writer.remove(&CollectionId::new("stray")).unwrap();
        assert_eq!(store.ranked_len(&set).unwrap(), 0);
    }

    #[test]
    fn test_upsert_surfaces_store_failure() {
        let writer = IndexWriter::new(Arc::new(FailingStore));
        let c = collection("a", "Alpha", "lib-1", "album");
        let err = writer.upsert(&c).unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable(_)));
    }

    #[test]
    fn test_embedded_thumbnail_marks_state() {
        let (writer, store) = writer_over_memory();
        let c = collection("a", "Alpha", "lib-1", "album");
        let payload = ThumbnailPayload {
            mime: "image/jpeg".into(),
            data_uri: "data:image/jpeg;base64,AA==".into(),
        };

        writer.upsert_with_thumbnail(&c, Some(payload.clone())).unwrap();

        let state = store.state_get(&c.id).unwrap().unwrap();
        assert!(state.has_cached_thumbnail);
        let summary = store.summary_get(&c.id).unwrap().unwrap();
        assert_eq!(summary.thumbnail, Some(payload));
    }

    #[test]
    fn test_plain_upsert_preserves_cached_thumbnail_flag() {
        let (writer, store) = writer_over_memory();
        let c = collection("a", "Alpha", "lib-1", "album");
        let payload = ThumbnailPayload {
            mime: "image/jpeg".into(),
            data_uri: "data:image/jpeg;base64,AA==".into(),
        };
        store.thumbnail_put(&c.id, &payload, None).unwrap();

        writer.upsert(&c).unwrap();
        let state = store.state_get(&c.id).unwrap().unwrap();
        assert!(state.has_cached_thumbnail);
    }

    #[test]
    fn test_ranked_entries_follow_direction_queries() {
        let (writer, store) = writer_over_memory();
        let mut older = collection("old", "Older", "lib-1", "album");
        older.updated_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut newer = collection("new", "Newer", "lib-1", "album");
        newer.updated_at = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();

        writer.upsert(&older).unwrap();
        writer.upsert(&newer).unwrap();

        let set = RankedSetId::new(SortField::UpdatedAt, Scope::Global);
        let asc = store.ranked_range(&set, 0, 10, Direction::Ascending).unwrap();
        assert_eq!(asc, vec![CollectionId::new("old"), CollectionId::new("new")]);
        let desc = store.ranked_range(&set, 0, 10, Direction::Descending).unwrap();
        assert_eq!(desc, vec![CollectionId::new("new"), CollectionId::new("old")]);
    }
}
