//! Derived record types stored in the index
//!
//! - CollectionSummary: the denormalized, read-optimized projection served
//!   to list/navigation views
//! - ThumbnailPayload: a precomputed, ready-to-serve cover thumbnail
//! - CollectionIndexState: per-collection freshness bookkeeping

use crate::types::{CollectionId, CollectionKind, LibraryId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Precomputed thumbnail payload, ready to serve without touching the
/// image pipeline. The `data_uri` embeds the encoded bytes so a renderer
/// can use it directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailPayload {
    /// MIME type of the encoded image ("image/jpeg", "image/webp", ...).
    pub mime: String,
    /// `data:<mime>;base64,<bytes>` string.
    pub data_uri: String,
}

/// Denormalized projection of a [`Collection`](crate::types::Collection).
///
/// Every field is a pure function of the source record at projection time.
/// Summaries are always replaced wholesale; a partially updated summary
/// never exists in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSummary {
    /// Source-store id.
    pub id: CollectionId,
    /// Display name.
    pub name: String,
    /// Description, if the source has one.
    pub description: Option<String>,
    /// Owning library.
    pub library_id: LibraryId,
    /// Type tag.
    pub kind: CollectionKind,
    /// Collection path.
    pub path: String,
    /// User-assigned tags.
    pub tags: Vec<String>,
    /// Id of the first media item, when the collection is non-empty.
    pub first_media_id: Option<String>,
    /// Thumbnail reference of the first media item.
    pub first_thumbnail: Option<String>,
    /// Number of images.
    pub image_count: u64,
    /// Number of generated thumbnails.
    pub thumbnail_count: u64,
    /// Number of derived cache entries.
    pub cache_entry_count: u64,
    /// Total media size in bytes.
    pub total_size_bytes: u64,
    /// Source creation time.
    pub created_at: DateTime<Utc>,
    /// Source modification time at projection.
    pub updated_at: DateTime<Utc>,
    /// Precomputed cover thumbnail, when the rebuild batched one in.
    pub thumbnail: Option<ThumbnailPayload>,
}

/// Per-collection index bookkeeping.
///
/// Freshness invariant: `indexed_at >= updated_at` of the source record
/// exactly when the stored summary reflects the current source state.
/// ChangedOnly rebuild relies on this comparison and nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionIndexState {
    /// Collection this state belongs to.
    pub collection_id: CollectionId,
    /// When the summary and ranked entries were last written.
    pub indexed_at: DateTime<Utc>,
    /// Source `updated_at` observed at that write.
    pub source_updated_at: DateTime<Utc>,
    /// Denormalized image count at that write.
    pub image_count: u64,
    /// Denormalized thumbnail count at that write.
    pub thumbnail_count: u64,
    /// Denormalized cache entry count at that write.
    pub cache_entry_count: u64,
    /// Whether a precomputed cover thumbnail was cached for the collection.
    pub has_cached_thumbnail: bool,
}

impl CollectionIndexState {
    /// Whether the indexed projection is still current for a source record
    /// last modified at `source_updated_at`.
    pub fn is_fresh(&self, source_updated_at: DateTime<Utc>) -> bool {
        self.source_updated_at >= source_updated_at
    }
}
