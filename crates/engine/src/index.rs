//! `CollectionIndex`: the subsystem facade
//!
//! Wires writer, reader, maintenance, and the two caches over one
//! injected store/source pair. The platform's write path calls
//! [`CollectionIndex::upsert`]/[`CollectionIndex::remove`] on every
//! collection mutation (directly or via at-least-once delivery); those
//! calls also keep the dashboard aggregate patched. Operator surfaces
//! call [`CollectionIndex::rebuild`]/[`CollectionIndex::verify`].

use crate::config::IndexConfig;
use crate::dashboard::{DashboardCache, DashboardPatch};
use crate::projector::project;
use crate::reader::IndexReader;
use crate::rebuild::{CancellationToken, RebuildOrchestrator};
use crate::thumbs::ThumbnailCache;
use crate::verify::{ConsistencyVerifier, VerifyOptions};
use crate::writer::IndexWriter;
use mosaic_index_core::{
    Collection, CollectionId, CollectionSource, IndexStore, RebuildMode, RebuildStatistics,
    Result, ThumbnailSource, VerifyReport,
};
use mosaic_index_store::MemoryIndexStore;
use std::sync::Arc;

/// The collection index subsystem.
pub struct CollectionIndex {
    writer: IndexWriter,
    reader: IndexReader,
    rebuild: RebuildOrchestrator,
    verifier: ConsistencyVerifier,
    thumbnails: ThumbnailCache,
    dashboard: DashboardCache,
}

impl CollectionIndex {
    /// Build the subsystem over an injected store and source.
    pub fn new(
        store: Arc<dyn IndexStore>,
        source: Arc<dyn CollectionSource>,
        config: IndexConfig,
    ) -> Self {
        Self::with_thumbnails(store, source, None, config)
    }

    /// Like [`new`](Self::new), with a thumbnail pipeline for rebuild to
    /// batch payloads from.
    pub fn with_thumbnails(
        store: Arc<dyn IndexStore>,
        source: Arc<dyn CollectionSource>,
        thumbs: Option<Arc<dyn ThumbnailSource>>,
        config: IndexConfig,
    ) -> Self {
        let writer = IndexWriter::new(store.clone());
        let reader = IndexReader::new(store.clone(), config.clone());
        let rebuild =
            RebuildOrchestrator::new(store.clone(), source.clone(), thumbs, config.clone());
        let verifier = ConsistencyVerifier::new(store.clone(), source);
        let thumbnails = ThumbnailCache::new(store.clone(), config.thumbnail_ttl());
        let dashboard = DashboardCache::new(store, config.dashboard_freshness());
        Self {
            writer,
            reader,
            rebuild,
            verifier,
            thumbnails,
            dashboard,
        }
    }

    /// Convenience constructor over a fresh in-memory store, the setup
    /// used by tests and single-process deployments.
    pub fn in_memory(source: Arc<dyn CollectionSource>, config: IndexConfig) -> Self {
        Self::new(Arc::new(MemoryIndexStore::new()), source, config)
    }

    /// Write-path entry point: project and index one collection, and
    /// patch the dashboard aggregate with the delta.
    ///
    /// # Errors
    /// Returns an error if a store operation fails; the caller should
    /// retry or surface it; dropping the call leaves drift until the
    /// next verify/rebuild.
    pub fn upsert(&self, collection: &Collection) -> Result<()> {
        let previous = self.writer.upsert(collection)?;
        self.dashboard.apply(&DashboardPatch::Upserted {
            previous,
            current: project(collection),
        })
    }

    /// Write-path entry point: remove one collection everywhere.
    /// Idempotent; removing an absent id is a no-op.
    ///
    /// # Errors
    /// Returns an error if a store operation fails.
    pub fn remove(&self, id: &CollectionId) -> Result<bool> {
        match self.writer.remove(id)? {
            Some(previous) => {
                self.dashboard
                    .apply(&DashboardPatch::Removed { previous })?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Run a maintenance pass.
    ///
    /// # Errors
    /// See [`RebuildOrchestrator::run`].
    pub fn rebuild(&self, mode: RebuildMode) -> Result<RebuildStatistics> {
        self.rebuild.run(mode)
    }

    /// Run a maintenance pass under a cancellation token.
    ///
    /// # Errors
    /// See [`RebuildOrchestrator::run_with_cancel`].
    pub fn rebuild_with_cancel(
        &self,
        mode: RebuildMode,
        cancel: &CancellationToken,
    ) -> Result<RebuildStatistics> {
        self.rebuild.run_with_cancel(mode, cancel)
    }

    /// Run a consistency verification pass.
    ///
    /// # Errors
    /// Propagates store/source connectivity failures only.
    pub fn verify(&self, options: VerifyOptions) -> Result<VerifyReport> {
        self.verifier.run(options)
    }

    /// The read-only query surface.
    pub fn reader(&self) -> &IndexReader {
        &self.reader
    }

    /// The mutation path (for callers that manage dashboard patches
    /// themselves).
    pub fn writer(&self) -> &IndexWriter {
        &self.writer
    }

    /// The precomputed thumbnail cache.
    pub fn thumbnails(&self) -> &ThumbnailCache {
        &self.thumbnails
    }

    /// The dashboard aggregate cache.
    pub fn dashboard(&self) -> &DashboardCache {
        &self.dashboard
    }
}
