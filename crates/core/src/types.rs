//! Source-side record types for the collection index
//!
//! This module defines the shapes the index consumes from the platform's
//! document store:
//! - CollectionId / LibraryId: opaque identifiers owned by the source store
//! - CollectionKind: open type tag for a collection
//! - MediaRef: reference to a collection's first media item
//! - Collection: the authoritative record the index projects from
//!
//! The index never mutates a `Collection`; it only reads them, either one
//! at a time on the write path or as a stream during rebuild.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier for a collection, assigned by the source store.
///
/// Treated as an uninterpreted string throughout the index; ordering over
/// ids is only ever used as a deterministic tiebreak.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CollectionId(String);

impl CollectionId {
    /// Wrap a raw source-store id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CollectionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Opaque identifier for the library owning a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LibraryId(String);

impl LibraryId {
    /// Wrap a raw library id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LibraryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LibraryId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Type tag of a collection ("series", "album", "folder", ...).
///
/// The vocabulary is owned by the source store; the index treats the tag
/// as an opaque, case-sensitive string and maintains one scoped ordered
/// set per distinct value it has seen.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CollectionKind(String);

impl CollectionKind {
    /// Wrap a raw type tag.
    pub fn new(kind: impl Into<String>) -> Self {
        Self(kind.into())
    }

    /// The raw tag string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CollectionKind {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Reference to the first media item of a collection.
///
/// Carries enough to render a cover without loading the media record:
/// the media id plus the thumbnail reference the image pipeline produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    /// Id of the media item within the collection.
    pub media_id: String,
    /// Reference to the rendered thumbnail (storage path or asset key).
    pub thumbnail: Option<String>,
}

/// A collection as the source store holds it.
///
/// Hard contract with the source: `updated_at` advances whenever any field
/// projected into a summary changes. Incremental rebuild depends on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    /// Source-store id.
    pub id: CollectionId,
    /// Display name.
    pub name: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Owning library.
    pub library_id: LibraryId,
    /// Type tag.
    pub kind: CollectionKind,
    /// Filesystem or virtual path of the collection.
    pub path: String,
    /// User-assigned tags.
    pub tags: Vec<String>,
    /// First media item, if the collection is non-empty.
    pub first_media: Option<MediaRef>,
    /// Number of images in the collection.
    pub image_count: u64,
    /// Number of generated thumbnails.
    pub thumbnail_count: u64,
    /// Number of cache entries derived from the collection.
    pub cache_entry_count: u64,
    /// Total size of the collection's media in bytes.
    pub total_size_bytes: u64,
    /// Creation time in the source store.
    pub created_at: DateTime<Utc>,
    /// Last modification time in the source store.
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Collection {
        Collection {
            id: CollectionId::new("col-1"),
            name: "Holiday 2024".to_string(),
            description: Some("Trip photos".to_string()),
            library_id: LibraryId::new("lib-1"),
            kind: CollectionKind::new("album"),
            path: "/photos/holiday-2024".to_string(),
            tags: vec!["travel".to_string()],
            first_media: Some(MediaRef {
                media_id: "m-1".to_string(),
                thumbnail: Some("thumbs/m-1.jpg".to_string()),
            }),
            image_count: 120,
            thumbnail_count: 120,
            cache_entry_count: 3,
            total_size_bytes: 1_048_576,
            created_at: Utc.with_ymd_and_hms(2024, 7, 1, 8, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 7, 2, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_collection_id_display_and_order() {
        let a = CollectionId::new("a");
        let b = CollectionId::new("b");
        assert_eq!(a.to_string(), "a");
        assert!(a < b);
    }

    #[test]
    fn test_collection_serde_round_trip() {
        let c = sample();
        let json = serde_json::to_string(&c).unwrap();
        let back: Collection = serde_json::from_str(&json).unwrap();
        assert_eq!(c, back);
    }

    #[test]
    fn test_kind_is_case_sensitive() {
        assert_ne!(CollectionKind::new("Album"), CollectionKind::new("album"));
    }
}
