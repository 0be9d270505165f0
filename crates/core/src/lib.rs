//! Core types and traits for the Mosaic collection index
//!
//! This crate defines the foundational pieces shared by the store and
//! engine crates:
//! - Source record types: Collection, CollectionId, LibraryId, MediaRef
//! - Derived records: CollectionSummary, CollectionIndexState, ThumbnailPayload
//! - Sort dimensions: SortField, Direction, Scope, RankedSetId, ScoreKey
//! - Error hierarchy: Error, Result
//! - Store/source traits: IndexStore, CollectionSource, ThumbnailSource
//! - Report value objects: RebuildStatistics, VerifyReport,
//!   DashboardStatistics, PageInfo

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod reports;
pub mod sort;
pub mod summary;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use reports::{
    DashboardStatistics, PageInfo, RebuildMode, RebuildStatistics, RunStatus, VerifyReport,
};
pub use sort::{Direction, RankedSetId, Scope, ScoreKey, SortField};
pub use summary::{CollectionIndexState, CollectionSummary, ThumbnailPayload};
pub use traits::{CollectionSource, IndexStore, RawThumbnail, ThumbnailSource};
pub use types::{Collection, CollectionId, CollectionKind, LibraryId, MediaRef};
