//! Dashboard aggregate cache
//!
//! A summary-of-summaries: total collections, images, thumbnails, cache
//! entries, and bytes. Recomputed fully from a summary scan on cold
//! start; patched incrementally per mutation afterwards. `computed_at`
//! is only advanced by a full recompute, so the freshness window bounds
//! how long accumulated patch error can live before a rescan.

use mosaic_index_core::{CollectionSummary, DashboardStatistics, IndexStore, Result};
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// One mutation's effect on the aggregate.
#[derive(Debug, Clone)]
pub enum DashboardPatch {
    /// A collection was written; `previous` is its prior summary if it
    /// was already indexed.
    Upserted {
        /// Summary before the write, when the id was already indexed.
        previous: Option<CollectionSummary>,
        /// Summary after the write.
        current: CollectionSummary,
    },
    /// A collection left the index.
    Removed {
        /// Summary that was removed.
        previous: CollectionSummary,
    },
}

/// Cache for the dashboard aggregate snapshot.
#[derive(Clone)]
pub struct DashboardCache {
    store: Arc<dyn IndexStore>,
    freshness: Duration,
    // Serializes the read-modify-write in apply(); patches from other
    // processes are still only reconciled by the next recompute.
    patch_lock: Arc<Mutex<()>>,
}

impl DashboardCache {
    /// Cache over the given store with the given freshness window.
    pub fn new(store: Arc<dyn IndexStore>, freshness: Duration) -> Self {
        Self {
            store,
            freshness,
            patch_lock: Arc::new(Mutex::new(())),
        }
    }

    /// The stored snapshot, if one exists.
    ///
    /// # Errors
    /// Returns an error if the store operation fails.
    pub fn get(&self) -> Result<Option<DashboardStatistics>> {
        self.store.aggregate_get()
    }

    /// Whether the stored snapshot exists and is inside the freshness
    /// window.
    ///
    /// # Errors
    /// Returns an error if the store operation fails.
    pub fn is_fresh(&self) -> Result<bool> {
        Ok(self
            .store
            .aggregate_get()?
            .map(|s| s.is_fresh(self.freshness, Utc::now()))
            .unwrap_or(false))
    }

    /// The stored snapshot if fresh, otherwise a full recompute.
    ///
    /// # Errors
    /// Returns an error if the store operation fails.
    pub fn get_or_recompute(&self) -> Result<DashboardStatistics> {
        if let Some(stats) = self.store.aggregate_get()? {
            if stats.is_fresh(self.freshness, Utc::now()) {
                return Ok(stats);
            }
        }
        self.recompute()
    }

    /// Recompute the aggregate from a full summary scan and store it.
    ///
    /// # Errors
    /// Returns an error if the store operation fails.
    pub fn recompute(&self) -> Result<DashboardStatistics> {
        let mut stats = DashboardStatistics::empty();
        for summary in self.store.summary_scan()? {
            stats.collection_count += 1;
            stats.image_count += summary.image_count;
            stats.thumbnail_count += summary.thumbnail_count;
            stats.cache_entry_count += summary.cache_entry_count;
            stats.total_size_bytes += summary.total_size_bytes;
        }
        stats.computed_at = Utc::now();
        self.store.aggregate_put(&stats)?;
        info!(
            collections = stats.collection_count,
            images = stats.image_count,
            "recomputed dashboard aggregate"
        );
        Ok(stats)
    }

    /// Apply one mutation's delta to the stored snapshot. With no
    /// snapshot present this falls back to a full recompute (which
    /// already reflects the mutation).
    ///
    /// # Errors
    /// Returns an error if the store operation fails.
    pub fn apply(&self, patch: &DashboardPatch) -> Result<()> {
        let _guard = self.patch_lock.lock();
        let mut stats = match self.store.aggregate_get()? {
            Some(stats) => stats,
            None => {
                self.recompute()?;
                return Ok(());
            }
        };

        match patch {
            DashboardPatch::Upserted { previous, current } => {
                if let Some(previous) = previous {
                    subtract(&mut stats, previous);
                } else {
                    stats.collection_count += 1;
                }
                add(&mut stats, current);
            }
            DashboardPatch::Removed { previous } => {
                stats.collection_count = stats.collection_count.saturating_sub(1);
                subtract(&mut stats, previous);
            }
        }

        self.store.aggregate_put(&stats)
    }
}

fn add(stats: &mut DashboardStatistics, summary: &CollectionSummary) {
    stats.image_count += summary.image_count;
    stats.thumbnail_count += summary.thumbnail_count;
    stats.cache_entry_count += summary.cache_entry_count;
    stats.total_size_bytes += summary.total_size_bytes;
}

fn subtract(stats: &mut DashboardStatistics, summary: &CollectionSummary) {
    stats.image_count = stats.image_count.saturating_sub(summary.image_count);
    stats.thumbnail_count = stats.thumbnail_count.saturating_sub(summary.thumbnail_count);
    stats.cache_entry_count = stats
        .cache_entry_count
        .saturating_sub(summary.cache_entry_count);
    stats.total_size_bytes = stats
        .total_size_bytes
        .saturating_sub(summary.total_size_bytes);
}
