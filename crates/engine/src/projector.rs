//! Summary projection
//!
//! A pure function from a source `Collection` to its denormalized
//! `CollectionSummary`. No I/O, total for any valid input: missing
//! optionals project to their defaults (no description, no first media,
//! empty tags). The precomputed thumbnail payload is attached separately
//! by callers that have one (the rebuild path); the projection itself
//! never invents it.

use mosaic_index_core::{Collection, CollectionSummary};

/// Project a source collection into its summary.
pub fn project(collection: &Collection) -> CollectionSummary {
    CollectionSummary {
        id: collection.id.clone(),
        name: collection.name.clone(),
        description: collection.description.clone(),
        library_id: collection.library_id.clone(),
        kind: collection.kind.clone(),
        path: collection.path.clone(),
        tags: collection.tags.clone(),
        first_media_id: collection.first_media.as_ref().map(|m| m.media_id.clone()),
        first_thumbnail: collection
            .first_media
            .as_ref()
            .and_then(|m| m.thumbnail.clone()),
        image_count: collection.image_count,
        thumbnail_count: collection.thumbnail_count,
        cache_entry_count: collection.cache_entry_count,
        total_size_bytes: collection.total_size_bytes,
        created_at: collection.created_at,
        updated_at: collection.updated_at,
        thumbnail: None,
    }
}
