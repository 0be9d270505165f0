//! Sort dimensions and ranked-set addressing
//!
//! The index maintains one ordered structure per (sort field × scope).
//! All three dimensions are closed enums; storage keys are derived through
//! exhaustive matches so adding a sort field is a single enforced change
//! point instead of scattered string concatenation.

use crate::types::{CollectionKind, LibraryId};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Attribute a ranked set is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SortField {
    /// Source modification time.
    UpdatedAt,
    /// Source creation time.
    CreatedAt,
    /// Collection name (case-folded byte order).
    Name,
    /// Image count.
    ItemCount,
    /// Total media size in bytes.
    TotalSize,
}

impl SortField {
    /// Every sort field, in storage-key order.
    pub const ALL: [SortField; 5] = [
        SortField::UpdatedAt,
        SortField::CreatedAt,
        SortField::Name,
        SortField::ItemCount,
        SortField::TotalSize,
    ];

    /// Stable token used in storage keys. Part of the persisted layout;
    /// MUST NOT change for existing fields.
    pub fn as_token(&self) -> &'static str {
        match self {
            SortField::UpdatedAt => "updated",
            SortField::CreatedAt => "created",
            SortField::Name => "name",
            SortField::ItemCount => "items",
            SortField::TotalSize => "size",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

/// Traversal direction over a ranked set.
///
/// Direction is applied by reversing rank/range queries at the store
/// interface; score keys themselves are always encoded ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Smallest key first.
    Ascending,
    /// Largest key first.
    Descending,
}

impl Direction {
    /// Stable token used in logs and query surfaces.
    pub fn as_token(&self) -> &'static str {
        match self {
            Direction::Ascending => "asc",
            Direction::Descending => "desc",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

/// Filtering dimension over which a ranked set is independently maintained.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    /// Every indexed collection.
    Global,
    /// Collections owned by one library.
    Library(LibraryId),
    /// Collections of one type tag.
    Kind(CollectionKind),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => f.write_str("global"),
            Scope::Library(id) => write!(f, "library:{}", id),
            Scope::Kind(kind) => write!(f, "kind:{}", kind),
        }
    }
}

/// Address of one ranked set: (sort field × scope).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RankedSetId {
    /// Ordering attribute.
    pub field: SortField,
    /// Membership filter.
    pub scope: Scope,
}

impl RankedSetId {
    /// Ranked set for a field and scope.
    pub fn new(field: SortField, scope: Scope) -> Self {
        Self { field, scope }
    }

    /// Storage key for this set. Derivation is exhaustive over both enums;
    /// the key is part of the persisted layout.
    pub fn storage_key(&self) -> String {
        match &self.scope {
            Scope::Global => format!("idx:{}:global", self.field.as_token()),
            Scope::Library(id) => format!("idx:{}:library:{}", self.field.as_token(), id),
            Scope::Kind(kind) => format!("idx:{}:kind:{}", self.field.as_token(), kind),
        }
    }

    /// All ranked sets a collection with the given library and kind
    /// belongs to: every sort field across global + its library + its
    /// type scope.
    pub fn sets_for(library_id: &LibraryId, kind: &CollectionKind) -> Vec<RankedSetId> {
        let scopes = [
            Scope::Global,
            Scope::Library(library_id.clone()),
            Scope::Kind(kind.clone()),
        ];
        let mut sets = Vec::with_capacity(SortField::ALL.len() * scopes.len());
        for scope in &scopes {
            for field in SortField::ALL {
                sets.push(RankedSetId::new(field, scope.clone()));
            }
        }
        sets
    }
}

impl fmt::Display for RankedSetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.storage_key())
    }
}

/// Order-preserving byte key produced by the score codec.
///
/// Compared lexicographically; ranked sets order members by
/// `(ScoreKey, CollectionId)` so every ordering is total. Numeric and
/// time fields encode to 8 bytes, names to their case-folded UTF-8, so
/// the inline capacity covers the common case without allocation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ScoreKey(SmallVec<[u8; 24]>);

impl ScoreKey {
    /// Key over raw, already order-preserving bytes.
    pub fn from_bytes(bytes: impl AsRef<[u8]>) -> Self {
        Self(SmallVec::from_slice(bytes.as_ref()))
    }

    /// The encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Byte length of the key.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the key is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_keys_are_distinct_per_field_and_scope() {
        let lib = LibraryId::new("lib-1");
        let kind = CollectionKind::new("album");
        let mut keys: Vec<String> = RankedSetId::sets_for(&lib, &kind)
            .into_iter()
            .map(|s| s.storage_key())
            .collect();
        let total = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(total, 15);
        assert_eq!(keys.len(), 15);
    }

    #[test]
    fn test_global_key_shape() {
        let set = RankedSetId::new(SortField::UpdatedAt, Scope::Global);
        assert_eq!(set.storage_key(), "idx:updated:global");
    }

    #[test]
    fn test_scoped_key_embeds_scope_id() {
        let set = RankedSetId::new(SortField::Name, Scope::Library(LibraryId::new("L9")));
        assert_eq!(set.storage_key(), "idx:name:library:L9");
    }

    #[test]
    fn test_score_key_orders_lexicographically() {
        let a = ScoreKey::from_bytes([0x00, 0x01]);
        let b = ScoreKey::from_bytes([0x00, 0x02]);
        let c = ScoreKey::from_bytes([0x00, 0x01, 0x00]);
        assert!(a < b);
        assert!(a < c);
        assert!(c < b);
    }
}
