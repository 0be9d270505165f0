//! Rebuild orchestrator: populate, repair, and refresh the projection
//!
//! Drives the index writer across the whole source store in one of four
//! modes:
//! - `ChangedOnly` (default): reproject only entries whose source
//!   `updated_at` is newer than the recorded index state
//! - `Verify`: delegate to the consistency verifier, applying its
//!   findings unless dry-run
//! - `Full`: clear every owned set/summary/state, then rebuild from zero
//! - `ForceRebuildAll`: reproject everything without clearing first
//!
//! A run is not atomic as a whole. Each entry is written through the
//! writer's fail-safe ordering, so an interrupted run leaves entries
//! individually consistent and a follow-up ChangedOnly run picks up
//! exactly the unfinished ones. Cancellation is cooperative and checked
//! only between entries, never inside one.

use crate::config::IndexConfig;
use crate::thumbs::ThumbnailCache;
use crate::verify::{ConsistencyVerifier, VerifyOptions};
use crate::writer::IndexWriter;
use mosaic_index_core::{
    Collection, CollectionId, CollectionSource, Error, IndexStore, RebuildMode,
    RebuildStatistics, Result, RunStatus, ThumbnailPayload, ThumbnailSource,
};
use crate::dashboard::DashboardCache;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Cooperative cancellation flag shared between an operator surface and
/// a running rebuild. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// A token that has not been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. The run stops at its next checkpoint.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Drives index maintenance runs and tracks per-run statistics.
pub struct RebuildOrchestrator {
    store: Arc<dyn IndexStore>,
    source: Arc<dyn CollectionSource>,
    thumbs: Option<Arc<dyn ThumbnailSource>>,
    writer: IndexWriter,
    verifier: ConsistencyVerifier,
    thumbnail_cache: ThumbnailCache,
    dashboard: DashboardCache,
    config: IndexConfig,
}

impl RebuildOrchestrator {
    /// Orchestrator over the given store and source.
    pub fn new(
        store: Arc<dyn IndexStore>,
        source: Arc<dyn CollectionSource>,
        thumbs: Option<Arc<dyn ThumbnailSource>>,
        config: IndexConfig,
    ) -> Self {
        let writer = IndexWriter::new(store.clone());
        let verifier = ConsistencyVerifier::new(store.clone(), source.clone());
        let thumbnail_cache = ThumbnailCache::new(store.clone(), config.thumbnail_ttl());
        let dashboard = DashboardCache::new(store.clone(), config.dashboard_freshness());
        Self {
            store,
            source,
            thumbs,
            writer,
            verifier,
            thumbnail_cache,
            dashboard,
            config,
        }
    }

    /// Run a maintenance pass to completion.
    ///
    /// # Errors
    /// Store/source connectivity failures abort the run with
    /// [`Error::RebuildAborted`] carrying the partial statistics.
    pub fn run(&self, mode: RebuildMode) -> Result<RebuildStatistics> {
        self.run_with_cancel(mode, &CancellationToken::new())
    }

    /// Run a maintenance pass under a cancellation token. Cancellation
    /// yields `Ok` with [`RunStatus::Cancelled`] partial statistics, not
    /// an error.
    ///
    /// # Errors
    /// Store/source connectivity failures abort the run with
    /// [`Error::RebuildAborted`] carrying the partial statistics.
    pub fn run_with_cancel(
        &self,
        mode: RebuildMode,
        cancel: &CancellationToken,
    ) -> Result<RebuildStatistics> {
        let mut stats = RebuildStatistics::start(mode);
        info!(run = %stats.run_id, mode = %mode, "rebuild starting");

        match mode {
            RebuildMode::Verify { dry_run } => {
                let report = match self.verifier.run(VerifyOptions {
                    dry_run,
                    check_sets: true,
                }) {
                    Ok(report) => report,
                    Err(e) => return Err(self.aborted(stats, e)),
                };
                stats.examined = report.source_examined;
                if report.applied {
                    stats.rebuilt = (report.missing.len() + report.stale.len()) as u64;
                    stats.removed = (report.orphaned.len() + report.set_orphans.len()) as u64;
                }
                stats.finish(RunStatus::Completed);
            }
            RebuildMode::Full => {
                let cleared = self
                    .store
                    .summary_count()
                    .and_then(|count| self.store.purge_index().map(|_| count));
                let cleared = match cleared {
                    Ok(count) => count,
                    Err(e) => return Err(self.aborted(stats, e)),
                };
                stats.removed = cleared;
                self.reproject_all(true, &mut stats, cancel)?;
            }
            RebuildMode::ForceRebuildAll => {
                self.reproject_all(true, &mut stats, cancel)?;
            }
            RebuildMode::ChangedOnly => {
                self.reproject_all(false, &mut stats, cancel)?;
            }
        }

        // A dry-run verify must leave the store untouched, aggregate
        // included; everything else refreshes it on completion.
        let refresh_dashboard = stats.status == RunStatus::Completed
            && !matches!(mode, RebuildMode::Verify { dry_run: true });
        if refresh_dashboard {
            if let Err(e) = self.dashboard.recompute() {
                return Err(self.aborted(stats, e));
            }
        }

        info!(
            run = %stats.run_id,
            mode = %mode,
            examined = stats.examined,
            skipped = stats.skipped,
            rebuilt = stats.rebuilt,
            removed = stats.removed,
            status = ?stats.status,
            "rebuild finished"
        );
        Ok(stats)
    }

    /// Walk every source collection, reprojecting the stale (or all,
    /// when `force`). Thumbnail payloads accumulate into batches and go
    /// to the store one batch per round-trip.
    fn reproject_all(
        &self,
        force: bool,
        stats: &mut RebuildStatistics,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let collections = match self.source.fetch_all() {
            Ok(collections) => collections,
            Err(e) => return Err(self.aborted(stats.clone(), e)),
        };

        let mut batch: Vec<(CollectionId, ThumbnailPayload)> = Vec::new();
        for collection in &collections {
            // Checkpoint between entries only; one entry's writes are
            // never left half-done by cancellation.
            if cancel.is_cancelled() {
                self.flush_batch(&mut batch, stats)?;
                stats.finish(RunStatus::Cancelled);
                info!(run = %stats.run_id, examined = stats.examined, "rebuild cancelled");
                return Ok(());
            }

            stats.examined += 1;

            if !force {
                match self.store.state_get(&collection.id) {
                    Ok(Some(state)) if state.is_fresh(collection.updated_at) => {
                        stats.skipped += 1;
                        continue;
                    }
                    Ok(_) => {}
                    Err(e) => return Err(self.aborted(stats.clone(), e)),
                }
            }

            let payload = self.fetch_payload(collection);
            if let Err(e) = self
                .writer
                .upsert_with_thumbnail(collection, payload.clone())
            {
                return Err(self.aborted(stats.clone(), e));
            }
            stats.rebuilt += 1;

            if let Some(payload) = payload {
                batch.push((collection.id.clone(), payload));
                if batch.len() >= self.config.thumbnail_batch_size {
                    self.flush_batch(&mut batch, stats)?;
                }
            }
        }

        self.flush_batch(&mut batch, stats)?;
        stats.finish(RunStatus::Completed);
        Ok(())
    }

    fn flush_batch(
        &self,
        batch: &mut Vec<(CollectionId, ThumbnailPayload)>,
        stats: &mut RebuildStatistics,
    ) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let count = batch.len() as u64;
        if let Err(e) = self.thumbnail_cache.put_many(batch) {
            return Err(self.aborted(stats.clone(), e));
        }
        stats.thumbnails_cached += count;
        batch.clear();
        Ok(())
    }

    /// Fetch and encode the cover payload for one collection. Pipeline
    /// failures are per-entity: logged, and the entry is indexed without
    /// a payload.
    fn fetch_payload(&self, collection: &Collection) -> Option<ThumbnailPayload> {
        let thumbs = self.thumbs.as_ref()?;
        let media = collection.first_media.as_ref()?;
        match thumbs.fetch(&collection.id, &media.media_id) {
            Ok(Some(raw)) => Some(ThumbnailCache::encode(&raw)),
            Ok(None) => None,
            Err(e) => {
                warn!(id = %collection.id, error = %e, "thumbnail fetch failed; indexing without payload");
                None
            }
        }
    }

    fn aborted(&self, mut partial: RebuildStatistics, source: Error) -> Error {
        partial.finish(RunStatus::Failed);
        warn!(
            run = %partial.run_id,
            examined = partial.examined,
            error = %source,
            "rebuild aborted"
        );
        Error::RebuildAborted {
            partial: Box::new(partial),
            source: Box::new(source),
        }
    }
}
