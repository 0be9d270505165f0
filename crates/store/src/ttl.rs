//! Expiry index for cached thumbnail payloads
//!
//! Maps expiry time → set of collection ids so the sweep only touches
//! entries that are actually due: O(expired count) instead of a scan of
//! every cached payload.

use chrono::{DateTime, Utc};
use mosaic_index_core::CollectionId;
use std::collections::{BTreeMap, HashSet};

/// Expiry index: expiry time → collection ids expiring then.
///
/// BTreeMap keeps expiries sorted, so collecting everything due before a
/// given instant is a range query over the expired prefix.
#[derive(Debug, Default)]
pub struct TtlIndex {
    index: BTreeMap<DateTime<Utc>, HashSet<CollectionId>>,
}

impl TtlIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self {
            index: BTreeMap::new(),
        }
    }

    /// Register `id` as expiring at `expires_at`.
    pub fn insert(&mut self, expires_at: DateTime<Utc>, id: CollectionId) {
        self.index.entry(expires_at).or_default().insert(id);
    }

    /// Drop `id`'s registration at `expires_at` (entry overwritten or
    /// removed early). Empty buckets are pruned.
    pub fn remove(&mut self, expires_at: DateTime<Utc>, id: &CollectionId) {
        if let Some(ids) = self.index.get_mut(&expires_at) {
            ids.remove(id);
            if ids.is_empty() {
                self.index.remove(&expires_at);
            }
        }
    }

    /// Ids due at or before `now`, leaving the index untouched.
    pub fn find_expired(&self, now: DateTime<Utc>) -> Vec<CollectionId> {
        self.index
            .range(..=now)
            .flat_map(|(_, ids)| ids.iter().cloned())
            .collect()
    }

    /// Drop every bucket due at or before `now`, returning how many ids
    /// were registered in them.
    pub fn remove_expired(&mut self, now: DateTime<Utc>) -> usize {
        let due: Vec<DateTime<Utc>> = self.index.range(..=now).map(|(ts, _)| *ts).collect();
        let mut count = 0;
        for ts in due {
            if let Some(ids) = self.index.remove(&ts) {
                count += ids.len();
            }
        }
        count
    }

    /// Total ids registered.
    pub fn len(&self) -> usize {
        self.index.values().map(HashSet::len).sum()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, secs).unwrap()
    }

    #[test]
    fn test_insert_and_find_expired() {
        let mut index = TtlIndex::new();
        index.insert(at(10), CollectionId::new("a"));
        index.insert(at(20), CollectionId::new("b"));

        let expired = index.find_expired(at(15));
        assert_eq!(expired, vec![CollectionId::new("a")]);
    }

    #[test]
    fn test_nothing_expired_before_first_deadline() {
        let mut index = TtlIndex::new();
        index.insert(at(10), CollectionId::new("a"));
        assert!(index.find_expired(at(5)).is_empty());
    }

    #[test]
    fn test_remove_prunes_empty_bucket() {
        let mut index = TtlIndex::new();
        index.insert(at(10), CollectionId::new("a"));
        index.remove(at(10), &CollectionId::new("a"));
        assert!(index.is_empty());
    }

    #[test]
    fn test_remove_expired_counts_dropped_ids() {
        let mut index = TtlIndex::new();
        index.insert(at(10), CollectionId::new("a"));
        index.insert(at(10), CollectionId::new("b"));
        index.insert(at(30), CollectionId::new("c"));

        assert_eq!(index.remove_expired(at(20)), 2);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_same_deadline_multiple_ids() {
        let mut index = TtlIndex::new();
        index.insert(at(10), CollectionId::new("a"));
        index.insert(at(10), CollectionId::new("b"));
        let mut expired = index.find_expired(at(10));
        expired.sort();
        assert_eq!(
            expired,
            vec![CollectionId::new("a"), CollectionId::new("b")]
        );
    }
}
