//! Report value objects for maintenance runs and query surfaces
//!
//! All types here are immutable snapshots handed back to callers:
//! rebuild statistics, verifier findings, the dashboard aggregate, and
//! pagination metadata. None of them carry behavior beyond small
//! convenience accessors.

use crate::types::CollectionId;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Maintenance mode for a rebuild run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RebuildMode {
    /// Reproject only collections whose source `updated_at` is newer than
    /// the recorded index state. The default.
    ChangedOnly,
    /// Delegate to the consistency verifier; apply corrections unless
    /// `dry_run` is set.
    Verify {
        /// Analyze only, mutate nothing.
        dry_run: bool,
    },
    /// Clear all owned sets, summaries, and state, then rebuild from zero.
    Full,
    /// Reproject every collection unconditionally without clearing first.
    ForceRebuildAll,
}

impl fmt::Display for RebuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RebuildMode::ChangedOnly => f.write_str("changed-only"),
            RebuildMode::Verify { dry_run: true } => f.write_str("verify (dry-run)"),
            RebuildMode::Verify { dry_run: false } => f.write_str("verify"),
            RebuildMode::Full => f.write_str("full"),
            RebuildMode::ForceRebuildAll => f.write_str("force-rebuild-all"),
        }
    }
}

/// How a maintenance run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Ran to completion.
    Completed,
    /// Stopped at a cancellation checkpoint; already-written entries are
    /// individually consistent.
    Cancelled,
    /// Aborted by a store/source failure. Only ever seen inside the
    /// partial statistics carried by a `RebuildAborted` error.
    Failed,
}

/// Statistics for one rebuild run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebuildStatistics {
    /// Unique id of this run.
    pub run_id: Uuid,
    /// Mode the run executed in.
    pub mode: RebuildMode,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished (or was cancelled/aborted).
    pub finished_at: Option<DateTime<Utc>>,
    /// Source collections examined.
    pub examined: u64,
    /// Examined but already fresh, left untouched.
    pub skipped: u64,
    /// Reprojected and rewritten.
    pub rebuilt: u64,
    /// Removed from the index (verify-apply and full-clear paths).
    pub removed: u64,
    /// Thumbnail payloads cached via batch writes.
    pub thumbnails_cached: u64,
    /// How the run ended.
    pub status: RunStatus,
}

impl RebuildStatistics {
    /// Fresh statistics for a run starting now.
    pub fn start(mode: RebuildMode) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            mode,
            started_at: Utc::now(),
            finished_at: None,
            examined: 0,
            skipped: 0,
            rebuilt: 0,
            removed: 0,
            thumbnails_cached: 0,
            status: RunStatus::Completed,
        }
    }

    /// Stamp the end of the run.
    pub fn finish(&mut self, status: RunStatus) {
        self.finished_at = Some(Utc::now());
        self.status = status;
    }

    /// Wall-clock duration, if the run has finished.
    pub fn duration(&self) -> Option<Duration> {
        self.finished_at.map(|end| end - self.started_at)
    }
}

/// Findings of a consistency verification pass.
///
/// Inconsistency is reported as data, never thrown: the id lists below are
/// the add/update/remove candidates. With `applied`, the corrections were
/// issued through the index writer and the lists describe what was done.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyReport {
    /// Source records examined.
    pub source_examined: u64,
    /// Index state records examined.
    pub index_examined: u64,
    /// In the source but absent from the index (add candidates).
    pub missing: Vec<CollectionId>,
    /// Indexed but older than the source record (update candidates).
    pub stale: Vec<CollectionId>,
    /// Indexed with no matching source record (remove candidates).
    pub orphaned: Vec<CollectionId>,
    /// Indexed with a first media item but no cached thumbnail payload.
    pub missing_thumbnail: Vec<CollectionId>,
    /// Ranked-set entries whose id has no summary record, as
    /// (set storage key, id) pairs. Populated only when the per-scope
    /// membership check is enabled.
    pub set_orphans: Vec<(String, CollectionId)>,
    /// Whether corrections were applied (false ⇒ dry run).
    pub applied: bool,
    /// When the pass started.
    pub started_at: DateTime<Utc>,
    /// When the pass finished.
    pub finished_at: DateTime<Utc>,
}

impl VerifyReport {
    /// True when no add/update/remove divergence was found.
    ///
    /// `missing_thumbnail` is advisory (a cache-warmth hint for the
    /// rebuild, not drift) and does not affect cleanliness (a
    /// deployment without a thumbnail pipeline would otherwise never
    /// verify clean).
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty()
            && self.stale.is_empty()
            && self.orphaned.is_empty()
            && self.set_orphans.is_empty()
    }

    /// Total number of divergent entries, advisory findings included.
    pub fn divergence_count(&self) -> usize {
        self.missing.len()
            + self.stale.len()
            + self.orphaned.len()
            + self.missing_thumbnail.len()
            + self.set_orphans.len()
    }
}

/// Aggregate snapshot for the dashboard.
///
/// Recomputed fully on cold start, patched incrementally per mutation
/// afterwards; `computed_at` anchors the freshness window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStatistics {
    /// Indexed collections.
    pub collection_count: u64,
    /// Images across all collections.
    pub image_count: u64,
    /// Thumbnails across all collections.
    pub thumbnail_count: u64,
    /// Cache entries across all collections.
    pub cache_entry_count: u64,
    /// Total media size in bytes.
    pub total_size_bytes: u64,
    /// When this snapshot was computed or last patched from a full base.
    pub computed_at: DateTime<Utc>,
}

impl DashboardStatistics {
    /// An empty aggregate computed now.
    pub fn empty() -> Self {
        Self {
            collection_count: 0,
            image_count: 0,
            thumbnail_count: 0,
            cache_entry_count: 0,
            total_size_bytes: 0,
            computed_at: Utc::now(),
        }
    }

    /// Whether the snapshot is still within the freshness window.
    pub fn is_fresh(&self, window: std::time::Duration, now: DateTime<Utc>) -> bool {
        match Duration::from_std(window) {
            Ok(window) => now - self.computed_at <= window,
            Err(_) => true,
        }
    }
}

/// Pagination metadata returned with every page result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    /// 1-based page number.
    pub page: u64,
    /// Requested page size.
    pub page_size: u64,
    /// Total items in the scope.
    pub total_items: u64,
    /// Total pages at this page size (0 when the scope is empty).
    pub total_pages: u64,
}

impl PageInfo {
    /// Metadata for `page` of `total_items` at `page_size`.
    pub fn new(page: u64, page_size: u64, total_items: u64) -> Self {
        let total_pages = if page_size == 0 {
            0
        } else {
            (total_items + page_size - 1) / page_size
        };
        Self {
            page,
            page_size,
            total_items,
            total_pages,
        }
    }

    /// Whether a page follows this one.
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Whether a page precedes this one.
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_info_rounds_up() {
        let info = PageInfo::new(1, 10, 25);
        assert_eq!(info.total_pages, 3);
        assert!(info.has_next());
        assert!(!info.has_previous());
    }

    #[test]
    fn test_page_info_empty_scope() {
        let info = PageInfo::new(1, 10, 0);
        assert_eq!(info.total_pages, 0);
        assert!(!info.has_next());
    }

    #[test]
    fn test_rebuild_statistics_duration() {
        let mut stats = RebuildStatistics::start(RebuildMode::Full);
        assert!(stats.duration().is_none());
        stats.finish(RunStatus::Completed);
        assert!(stats.duration().is_some());
    }

    #[test]
    fn test_verify_report_clean() {
        let now = Utc::now();
        let report = VerifyReport {
            source_examined: 10,
            index_examined: 10,
            missing: vec![],
            stale: vec![],
            orphaned: vec![],
            missing_thumbnail: vec![],
            set_orphans: vec![],
            applied: false,
            started_at: now,
            finished_at: now,
        };
        assert!(report.is_clean());
        assert_eq!(report.divergence_count(), 0);
    }

    #[test]
    fn test_dashboard_freshness_window() {
        let stats = DashboardStatistics::empty();
        let now = stats.computed_at;
        assert!(stats.is_fresh(std::time::Duration::from_secs(60), now));
        let later = now + Duration::seconds(120);
        assert!(!stats.is_fresh(std::time::Duration::from_secs(60), later));
    }
}
