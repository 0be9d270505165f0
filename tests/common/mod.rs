//! Shared fixtures for the integration suites.
#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use mosaic_index::{Collection, CollectionId, CollectionKind, LibraryId, MediaRef};

/// Base instant all fixture timestamps offset from.
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// A collection whose `updated_at` is `epoch() + minute`, with counters
/// derived from `minute` so sort fields are all distinct.
pub fn collection(id: &str, name: &str, minute: i64) -> Collection {
    Collection {
        id: CollectionId::new(id),
        name: name.to_string(),
        description: Some(format!("{} description", name)),
        library_id: LibraryId::new("lib-1"),
        kind: CollectionKind::new("album"),
        path: format!("/media/{}", id),
        tags: vec!["fixture".into()],
        first_media: Some(MediaRef {
            media_id: format!("{}-m", id),
            thumbnail: Some(format!("thumbs/{}.jpg", id)),
        }),
        image_count: minute as u64 + 1,
        thumbnail_count: minute as u64,
        cache_entry_count: 1,
        total_size_bytes: (minute as u64 + 1) * 1024,
        created_at: epoch() - Duration::days(1) + Duration::minutes(minute),
        updated_at: epoch() + Duration::minutes(minute),
    }
}
