//! Mosaic collection index: the derived, rank-queryable projection of the
//! platform's collection data
//!
//! The authoritative collection records live in a document store tuned
//! for durable writes; the interactive UI needs rank-aware navigation,
//! cheap pagination, scoped filtering, and instant cover rendering.
//! This crate maintains that projection in an ordered-set/keyed store
//! and keeps the two in sync under a bounded consistency model.
//!
//! # Quick Start
//!
//! ```ignore
//! use mosaic_index::{CollectionIndex, IndexConfig, RebuildMode, SortField, Direction};
//!
//! // Wire the subsystem over your store and source clients
//! let index = CollectionIndex::new(store, source, IndexConfig::default());
//!
//! // Populate at startup
//! index.rebuild(RebuildMode::ChangedOnly)?;
//!
//! // Write path: call on every collection mutation
//! index.upsert(&collection)?;
//!
//! // Interactive queries
//! let nav = index.reader().navigation(&id, SortField::UpdatedAt, Direction::Descending)?;
//! let page = index.reader().page(1, 24, SortField::Name, Direction::Ascending)?;
//! ```
//!
//! # Architecture
//!
//! `mosaic-index-core` holds the types and the store/source traits;
//! `mosaic-index-store` the in-memory store backend and test doubles;
//! `mosaic-index-engine` the codec, projector, writer/reader,
//! maintenance, and caches. This crate re-exports the public surface.

pub use mosaic_index_core::{
    Collection, CollectionId, CollectionIndexState, CollectionKind, CollectionSummary,
    DashboardStatistics, Direction, Error, LibraryId, MediaRef, PageInfo, RankedSetId,
    RawThumbnail, RebuildMode, RebuildStatistics, Result, RunStatus, Scope, ScoreKey, SortField,
    ThumbnailPayload, VerifyReport,
};
pub use mosaic_index_core::traits::{CollectionSource, IndexStore, ThumbnailSource};
pub use mosaic_index_engine::{
    CancellationToken, CollectionIndex, ConsistencyVerifier, DashboardCache, DashboardPatch,
    IndexConfig, IndexReader, IndexWriter, Navigation, Page, RebuildOrchestrator, SiblingsPage,
    ThumbnailCache, VerifyOptions, CONFIG_FILE_NAME,
};
pub use mosaic_index_store::{MemoryIndexStore, TtlIndex};

/// Test doubles for the store and source contracts.
pub mod testing {
    pub use mosaic_index_store::testing::{
        FailingStore, MemoryCollectionSource, StaticThumbnailSource,
    };
}
