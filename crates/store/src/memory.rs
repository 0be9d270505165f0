//! In-memory implementation of the index store contract
//!
//! Record groups live in `DashMap`s (sharded, lock-free reads); each
//! ranked set keeps its members twice: a vector sorted by
//! `(ScoreKey, CollectionId)` for rank/range queries and an `FxHashMap`
//! for O(1) member lookup. Rank is a binary search, cardinality is the
//! vector length, inserts and removals shift the tail of one set's
//! vector while holding only that set's shard.
//!
//! Thumbnail payloads carry an optional expiry; expired entries read as
//! absent immediately and are reclaimed by [`MemoryIndexStore::thumbnail_purge_expired`].

use crate::ttl::TtlIndex;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use mosaic_index_core::{
    CollectionId, CollectionIndexState, CollectionSummary, DashboardStatistics, Direction,
    IndexStore, RankedSetId, Result, ScoreKey, ThumbnailPayload,
};
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use std::time::Duration;

/// One ranked set: members ordered by `(ScoreKey, CollectionId)`.
#[derive(Debug, Default)]
struct RankedSet {
    /// Ascending `(key, id)` order.
    order: Vec<(ScoreKey, CollectionId)>,
    /// Member → current key, for O(1) presence checks and repositioning.
    members: FxHashMap<CollectionId, ScoreKey>,
}

impl RankedSet {
    fn position_of(&self, key: &ScoreKey, id: &CollectionId) -> std::result::Result<usize, usize> {
        self.order
            .binary_search_by(|(k, i)| (k, i).cmp(&(key, id)))
    }

    fn insert(&mut self, id: &CollectionId, key: ScoreKey) {
        if let Some(old) = self.members.insert(id.clone(), key.clone()) {
            if old == key {
                return;
            }
            let pos = self
                .position_of(&old, id)
                .expect("member map and order vector diverged");
            self.order.remove(pos);
        }
        let pos = self
            .position_of(&key, id)
            .unwrap_err();
        self.order.insert(pos, (key, id.clone()));
    }

    fn remove(&mut self, id: &CollectionId) -> bool {
        match self.members.remove(id) {
            Some(key) => {
                let pos = self
                    .position_of(&key, id)
                    .expect("member map and order vector diverged");
                self.order.remove(pos);
                true
            }
            None => false,
        }
    }

    fn rank(&self, id: &CollectionId, direction: Direction) -> Option<u64> {
        let key = self.members.get(id)?;
        let pos = self.position_of(key, id).ok()? as u64;
        Some(match direction {
            Direction::Ascending => pos,
            Direction::Descending => self.order.len() as u64 - 1 - pos,
        })
    }

    fn range(&self, start: u64, count: u64, direction: Direction) -> Vec<CollectionId> {
        let len = self.order.len() as u64;
        if start >= len || count == 0 {
            return Vec::new();
        }
        let take = count.min(len - start) as usize;
        match direction {
            Direction::Ascending => self.order[start as usize..]
                .iter()
                .take(take)
                .map(|(_, id)| id.clone())
                .collect(),
            Direction::Descending => self
                .order
                .iter()
                .rev()
                .skip(start as usize)
                .take(take)
                .map(|(_, id)| id.clone())
                .collect(),
        }
    }

    fn len(&self) -> u64 {
        self.order.len() as u64
    }

    fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// A cached thumbnail payload plus its expiry deadline.
#[derive(Debug, Clone)]
struct CachedThumbnail {
    payload: ThumbnailPayload,
    expires_at: Option<DateTime<Utc>>,
}

impl CachedThumbnail {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(deadline) if deadline <= now)
    }
}

/// In-memory [`IndexStore`].
///
/// The production deployment injects a networked client with the same
/// contract; this implementation backs tests and single-process
/// deployments. Every method is atomic per set/key and never blocks
/// readers beyond one shard operation.
#[derive(Debug, Default)]
pub struct MemoryIndexStore {
    sets: DashMap<RankedSetId, RankedSet>,
    summaries: DashMap<CollectionId, CollectionSummary>,
    states: DashMap<CollectionId, CollectionIndexState>,
    thumbnails: DashMap<CollectionId, CachedThumbnail>,
    ttl: Mutex<TtlIndex>,
    aggregate: RwLock<Option<DashboardStatistics>>,
}

impl MemoryIndexStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn expiry_for(ttl: Option<Duration>) -> Option<DateTime<Utc>> {
        ttl.and_then(|d| chrono::Duration::from_std(d).ok())
            .map(|d| Utc::now() + d)
    }

    fn store_thumbnail(
        &self,
        id: &CollectionId,
        payload: &ThumbnailPayload,
        expires_at: Option<DateTime<Utc>>,
    ) {
        let previous = self.thumbnails.insert(
            id.clone(),
            CachedThumbnail {
                payload: payload.clone(),
                expires_at,
            },
        );
        let old_expiry = previous.and_then(|p| p.expires_at);
        if old_expiry != expires_at {
            let mut ttl = self.ttl.lock();
            if let Some(old) = old_expiry {
                ttl.remove(old, id);
            }
            if let Some(new) = expires_at {
                ttl.insert(new, id.clone());
            }
        }
    }
}

impl IndexStore for MemoryIndexStore {
    fn ranked_insert(&self, set: &RankedSetId, id: &CollectionId, key: ScoreKey) -> Result<()> {
        self.sets.entry(set.clone()).or_default().insert(id, key);
        Ok(())
    }

    fn ranked_remove(&self, set: &RankedSetId, id: &CollectionId) -> Result<bool> {
        let removed = match self.sets.get_mut(set) {
            Some(mut entry) => entry.remove(id),
            None => false,
        };
        if removed {
            // Drop sets that emptied so ranked_sets() reflects live scopes.
            self.sets.remove_if(set, |_, s| s.is_empty());
        }
        Ok(removed)
    }

    fn ranked_rank(
        &self,
        set: &RankedSetId,
        id: &CollectionId,
        direction: Direction,
    ) -> Result<Option<u64>> {
        Ok(self.sets.get(set).and_then(|s| s.rank(id, direction)))
    }

    fn ranked_range(
        &self,
        set: &RankedSetId,
        start: u64,
        count: u64,
        direction: Direction,
    ) -> Result<Vec<CollectionId>> {
        Ok(self
            .sets
            .get(set)
            .map(|s| s.range(start, count, direction))
            .unwrap_or_default())
    }

    fn ranked_len(&self, set: &RankedSetId) -> Result<u64> {
        Ok(self.sets.get(set).map(|s| s.len()).unwrap_or(0))
    }

    fn ranked_members(&self, set: &RankedSetId) -> Result<Vec<CollectionId>> {
        Ok(self
            .sets
            .get(set)
            .map(|s| s.order.iter().map(|(_, id)| id.clone()).collect())
            .unwrap_or_default())
    }

    fn ranked_clear(&self, set: &RankedSetId) -> Result<()> {
        self.sets.remove(set);
        Ok(())
    }

    fn ranked_sets(&self) -> Result<Vec<RankedSetId>> {
        Ok(self.sets.iter().map(|entry| entry.key().clone()).collect())
    }

    fn summary_put(&self, summary: &CollectionSummary) -> Result<()> {
        self.summaries.insert(summary.id.clone(), summary.clone());
        Ok(())
    }

    fn summary_get(&self, id: &CollectionId) -> Result<Option<CollectionSummary>> {
        Ok(self.summaries.get(id).map(|s| s.clone()))
    }

    fn summary_get_many(&self, ids: &[CollectionId]) -> Result<Vec<Option<CollectionSummary>>> {
        Ok(ids
            .iter()
            .map(|id| self.summaries.get(id).map(|s| s.clone()))
            .collect())
    }

    fn summary_remove(&self, id: &CollectionId) -> Result<bool> {
        Ok(self.summaries.remove(id).is_some())
    }

    fn summary_ids(&self) -> Result<Vec<CollectionId>> {
        Ok(self.summaries.iter().map(|e| e.key().clone()).collect())
    }

    fn summary_count(&self) -> Result<u64> {
        Ok(self.summaries.len() as u64)
    }

    fn summary_scan(&self) -> Result<Vec<CollectionSummary>> {
        Ok(self.summaries.iter().map(|e| e.value().clone()).collect())
    }

    fn state_put(&self, state: &CollectionIndexState) -> Result<()> {
        self.states.insert(state.collection_id.clone(), state.clone());
        Ok(())
    }

    fn state_get(&self, id: &CollectionId) -> Result<Option<CollectionIndexState>> {
        Ok(self.states.get(id).map(|s| s.clone()))
    }

    fn state_remove(&self, id: &CollectionId) -> Result<bool> {
        Ok(self.states.remove(id).is_some())
    }

    fn state_scan(&self) -> Result<Vec<CollectionIndexState>> {
        Ok(self.states.iter().map(|e| e.value().clone()).collect())
    }

    fn thumbnail_put(
        &self,
        id: &CollectionId,
        payload: &ThumbnailPayload,
        ttl: Option<Duration>,
    ) -> Result<()> {
        self.store_thumbnail(id, payload, Self::expiry_for(ttl));
        Ok(())
    }

    fn thumbnail_put_many(
        &self,
        entries: &[(CollectionId, ThumbnailPayload)],
        ttl: Option<Duration>,
    ) -> Result<()> {
        let expires_at = Self::expiry_for(ttl);
        for (id, payload) in entries {
            self.store_thumbnail(id, payload, expires_at);
        }
        Ok(())
    }

    fn thumbnail_get(&self, id: &CollectionId) -> Result<Option<ThumbnailPayload>> {
        let now = Utc::now();
        match self.thumbnails.get(id) {
            Some(entry) if !entry.is_expired(now) => Ok(Some(entry.payload.clone())),
            _ => Ok(None),
        }
    }

    fn thumbnail_remove(&self, id: &CollectionId) -> Result<bool> {
        let now = Utc::now();
        match self.thumbnails.remove(id) {
            Some((_, entry)) => {
                if let Some(deadline) = entry.expires_at {
                    self.ttl.lock().remove(deadline, id);
                }
                Ok(!entry.is_expired(now))
            }
            None => Ok(false),
        }
    }

    fn thumbnail_purge_expired(&self) -> Result<u64> {
        let now = Utc::now();
        let due = self.ttl.lock().find_expired(now);
        let mut dropped = 0;
        for id in &due {
            if self
                .thumbnails
                .remove_if(id, |_, entry| entry.is_expired(now))
                .is_some()
            {
                dropped += 1;
            }
        }
        self.ttl.lock().remove_expired(now);
        Ok(dropped)
    }

    fn aggregate_put(&self, stats: &DashboardStatistics) -> Result<()> {
        *self.aggregate.write() = Some(stats.clone());
        Ok(())
    }

    fn aggregate_get(&self) -> Result<Option<DashboardStatistics>> {
        Ok(self.aggregate.read().clone())
    }

    fn purge_index(&self) -> Result<()> {
        self.sets.clear();
        self.summaries.clear();
        self.states.clear();
        Ok(())
    }
}
