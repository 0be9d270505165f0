//! Consistency verifier: the subsystem's self-healing mechanism
//!
//! Diffs the source id set against the index and classifies divergence:
//! missing (in source, not indexed), stale (indexed before the source's
//! last change), orphaned (indexed, gone from source), missing-thumbnail
//! (indexed with a first media item but no cached payload), and,
//! optionally, ranked-set entries whose id has no summary record.
//!
//! Findings are data, never errors. A dry run only analyzes; an apply
//! run issues the corresponding writer calls and reports what was done.
//! This is the recovery path for lost write-path calls and integration
//! bugs, so divergence is logged loudly.

use crate::writer::IndexWriter;
use chrono::Utc;
use mosaic_index_core::{
    Collection, CollectionId, CollectionSource, IndexStore, RankedSetId, Result, VerifyReport,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};

/// Options for one verification pass.
#[derive(Debug, Clone, Copy)]
pub struct VerifyOptions {
    /// Analyze only; mutate nothing.
    pub dry_run: bool,
    /// Also check every ranked set's membership against the summary
    /// table. Costs one member scan per set.
    pub check_sets: bool,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            dry_run: true,
            check_sets: false,
        }
    }
}

/// Source-vs-index diff runner.
#[derive(Clone)]
pub struct ConsistencyVerifier {
    store: Arc<dyn IndexStore>,
    source: Arc<dyn CollectionSource>,
    writer: IndexWriter,
}

impl ConsistencyVerifier {
    /// Verifier over the given store and source.
    pub fn new(store: Arc<dyn IndexStore>, source: Arc<dyn CollectionSource>) -> Self {
        let writer = IndexWriter::new(store.clone());
        Self {
            store,
            source,
            writer,
        }
    }

    /// Run one pass.
    ///
    /// # Errors
    /// Propagates store/source connectivity failures; divergence itself
    /// is reported in the returned [`VerifyReport`].
    pub fn run(&self, options: VerifyOptions) -> Result<VerifyReport> {
        let started_at = Utc::now();

        let collections = self.source.fetch_all()?;
        let source_by_id: HashMap<CollectionId, &Collection> =
            collections.iter().map(|c| (c.id.clone(), c)).collect();

        let summary_ids: HashSet<CollectionId> =
            self.store.summary_ids()?.into_iter().collect();
        let states: HashMap<CollectionId, _> = self
            .store
            .state_scan()?
            .into_iter()
            .map(|s| (s.collection_id.clone(), s))
            .collect();

        let mut missing = Vec::new();
        let mut stale = Vec::new();
        let mut missing_thumbnail = Vec::new();

        for collection in &collections {
            if !summary_ids.contains(&collection.id) {
                missing.push(collection.id.clone());
                continue;
            }
            match states.get(&collection.id) {
                // A summary with no state record is a torn write; treat
                // it as stale so it gets rewritten wholesale.
                None => stale.push(collection.id.clone()),
                Some(state) => {
                    if !state.is_fresh(collection.updated_at) {
                        stale.push(collection.id.clone());
                    } else if collection.first_media.is_some() && !state.has_cached_thumbnail {
                        missing_thumbnail.push(collection.id.clone());
                    }
                }
            }
        }

        let mut orphaned: Vec<CollectionId> = summary_ids
            .iter()
            .filter(|id| !source_by_id.contains_key(*id))
            .cloned()
            .collect();

        let mut set_orphans: Vec<(RankedSetId, CollectionId)> = Vec::new();
        if options.check_sets {
            for set in self.store.ranked_sets()? {
                for id in self.store.ranked_members(&set)? {
                    if !summary_ids.contains(&id) {
                        set_orphans.push((set.clone(), id));
                    }
                }
            }
        }

        missing.sort();
        stale.sort();
        orphaned.sort();
        missing_thumbnail.sort();
        set_orphans.sort_by(|a, b| (a.0.storage_key(), &a.1).cmp(&(b.0.storage_key(), &b.1)));

        if !options.dry_run {
            self.apply(&missing, &stale, &orphaned, &set_orphans, &source_by_id)?;
        }

        let report = VerifyReport {
            source_examined: collections.len() as u64,
            index_examined: summary_ids.len() as u64,
            missing,
            stale,
            orphaned,
            missing_thumbnail,
            set_orphans: set_orphans
                .into_iter()
                .map(|(set, id)| (set.storage_key(), id))
                .collect(),
            applied: !options.dry_run,
            started_at,
            finished_at: Utc::now(),
        };

        if report.is_clean() {
            info!(
                source = report.source_examined,
                index = report.index_examined,
                "verify: index consistent with source"
            );
        } else {
            warn!(
                missing = report.missing.len(),
                stale = report.stale.len(),
                orphaned = report.orphaned.len(),
                missing_thumbnail = report.missing_thumbnail.len(),
                set_orphans = report.set_orphans.len(),
                applied = report.applied,
                "verify: drift detected"
            );
        }

        Ok(report)
    }

    fn apply(
        &self,
        missing: &[CollectionId],
        stale: &[CollectionId],
        orphaned: &[CollectionId],
        set_orphans: &[(RankedSetId, CollectionId)],
        source_by_id: &HashMap<CollectionId, &Collection>,
    ) -> Result<()> {
        for id in missing.iter().chain(stale) {
            if let Some(collection) = source_by_id.get(id) {
                self.writer.upsert(collection)?;
            }
        }
        for id in orphaned {
            self.writer.remove(id)?;
        }
        for (set, id) in set_orphans {
            self.store.ranked_remove(set, id)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use mosaic_index_core::{
        CollectionKind, LibraryId, MediaRef, Scope, ScoreKey, SortField,
    };
    use mosaic_index_store::testing::MemoryCollectionSource;
    use mosaic_index_store::MemoryIndexStore;

    fn collection(id: &str, minute: u32) -> Collection {
        Collection {
            id: CollectionId::new(id),
            name: format!("Collection {}", id),
            description: None,
            library_id: LibraryId::new("lib"),
            kind: CollectionKind::new("album"),
            path: format!("/{}", id),
            tags: vec![],
            first_media: Some(MediaRef {
                media_id: format!("{}-m", id),
                thumbnail: Some(format!("thumbs/{}.jpg", id)),
            }),
            image_count: 1,
            thumbnail_count: 1,
            cache_entry_count: 0,
            total_size_bytes: 10,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                + Duration::minutes(minute as i64),
        }
    }

    fn fixture() -> (
        ConsistencyVerifier,
        Arc<MemoryIndexStore>,
        Arc<MemoryCollectionSource>,
        IndexWriter,
    ) {
        let store = Arc::new(MemoryIndexStore::new());
        let source = Arc::new(MemoryCollectionSource::new());
        let verifier = ConsistencyVerifier::new(store.clone(), source.clone());
        let writer = IndexWriter::new(store.clone());
        (verifier, store, source, writer)
    }

    #[test]
    fn test_clean_index_reports_clean() {
        let (verifier, _, source, writer) = fixture();
        for i in 0..3 {
            let c = collection(&format!("c{}", i), i);
            source.put(c.clone());
            writer.upsert(&c).unwrap();
        }

        let report = verifier.run(VerifyOptions { dry_run: true, check_sets: true }).unwrap();
        assert!(report.is_clean());
        assert_eq!(report.source_examined, 3);
        assert_eq!(report.index_examined, 3);
    }

    #[test]
    fn test_missing_classified_and_not_applied_on_dry_run() {
        let (verifier, store, source, _) = fixture();
        source.put(collection("only-in-source", 1));

        let report = verifier.run(VerifyOptions::default()).unwrap();
        assert_eq!(report.missing, vec![CollectionId::new("only-in-source")]);
        assert!(!report.applied);
        // dry run performed zero mutation
        assert_eq!(store.summary_count().unwrap(), 0);
    }

    #[test]
    fn test_stale_detected_via_updated_at() {
        let (verifier, _, source, writer) = fixture();
        let c = collection("a", 1);
        source.put(c.clone());
        writer.upsert(&c).unwrap();

        // Source moves on; index does not hear about it
        source.touch(&c.id, c.updated_at + Duration::minutes(5));

        let report = verifier.run(VerifyOptions::default()).unwrap();
        assert_eq!(report.stale, vec![c.id.clone()]);
        assert!(report.missing.is_empty());
    }

    #[test]
    fn test_orphan_appears_in_removal_candidates() {
        let (verifier, _, source, writer) = fixture();
        let kept = collection("kept", 1);
        let dropped = collection("dropped", 2);
        source.put(kept.clone());
        source.put(dropped.clone());
        writer.upsert(&kept).unwrap();
        writer.upsert(&dropped).unwrap();

        source.remove(&dropped.id);

        let report = verifier.run(VerifyOptions::default()).unwrap();
        assert_eq!(report.orphaned, vec![dropped.id.clone()]);
    }

    #[test]
    fn test_apply_converges_to_clean() {
        let (verifier, _, source, writer) = fixture();
        // missing
        source.put(collection("m", 1));
        // stale
        let s = collection("s", 2);
        source.put(s.clone());
        writer.upsert(&s).unwrap();
        source.touch(&s.id, s.updated_at + Duration::minutes(9));
        // orphaned
        let o = collection("o", 3);
        writer.upsert(&o).unwrap();

        let applied = verifier
            .run(VerifyOptions { dry_run: false, check_sets: true })
            .unwrap();
        assert!(applied.applied);
        assert_eq!(applied.missing, vec![CollectionId::new("m")]);
        assert_eq!(applied.stale, vec![CollectionId::new("s")]);
        assert_eq!(applied.orphaned, vec![CollectionId::new("o")]);

        let after = verifier
            .run(VerifyOptions { dry_run: true, check_sets: true })
            .unwrap();
        assert!(after.is_clean());
    }

    #[test]
    fn test_set_orphans_found_and_cleared() {
        let (verifier, store, source, writer) = fixture();
        let c = collection("real", 1);
        source.put(c.clone());
        writer.upsert(&c).unwrap();

        let set = RankedSetId::new(SortField::UpdatedAt, Scope::Global);
        store
            .ranked_insert(&set, &CollectionId::new("stray"), ScoreKey::from_bytes([9]))
            .unwrap();

        let dry = verifier
            .run(VerifyOptions { dry_run: true, check_sets: true })
            .unwrap();
        assert_eq!(
            dry.set_orphans,
            vec![(set.storage_key(), CollectionId::new("stray"))]
        );

        verifier
            .run(VerifyOptions { dry_run: false, check_sets: true })
            .unwrap();
        assert_eq!(store.ranked_len(&set).unwrap(), 1);
        let after = verifier
            .run(VerifyOptions { dry_run: true, check_sets: true })
            .unwrap();
        assert!(after.is_clean());
    }

    #[test]
    fn test_missing_thumbnail_reported_for_unconfigured_pipeline() {
        let (verifier, _, source, writer) = fixture();
        let c = collection("a", 1);
        source.put(c.clone());
        // Plain upsert: no payload cached, collection has first media
        writer.upsert(&c).unwrap();

        let report = verifier.run(VerifyOptions::default()).unwrap();
        assert_eq!(report.missing_thumbnail, vec![c.id.clone()]);
    }

    #[test]
    fn test_source_failure_is_an_error_not_empty_drift() {
        use mosaic_index_core::Error;

        struct DownSource;
        impl CollectionSource for DownSource {
            fn get(&self, _: &CollectionId) -> Result<Option<Collection>> {
                Err(Error::SourceUnavailable("down".into()))
            }
            fn fetch_all(&self) -> Result<Vec<Collection>> {
                Err(Error::SourceUnavailable("down".into()))
            }
            fn count(&self) -> Result<u64> {
                Err(Error::SourceUnavailable("down".into()))
            }
        }

        let store = Arc::new(MemoryIndexStore::new());
        let verifier = ConsistencyVerifier::new(store, Arc::new(DownSource));
        let err = verifier.run(VerifyOptions::default()).unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable(_)));
    }
}
