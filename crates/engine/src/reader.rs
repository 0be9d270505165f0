//! Index reader: the only component on the interactive request path
//!
//! Every operation is read-only and non-blocking with respect to the
//! others. Absence is an answer, not an error: an unindexed id yields
//! `None` / an empty page, and an empty scope yields an empty result.
//!
//! Rank and range queries go through the ranked sets (O(log N) /
//! O(log N + pageSize)); only `search_page` scans, and it deliberately
//! filters the entire matching set before sorting and paginating;
//! trimming candidates first would silently drop sparse matches.

use crate::codec::score_key;
use crate::config::IndexConfig;
use mosaic_index_core::{
    CollectionId, CollectionKind, CollectionSummary, Direction, IndexStore, LibraryId, PageInfo,
    RankedSetId, Result, Scope, SortField,
};
use std::sync::Arc;

/// Neighborhood of one collection within an ordering: its neighbors,
/// 1-based rank, and the total count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    /// Id ranked immediately before, if any.
    pub previous: Option<CollectionId>,
    /// Id ranked immediately after, if any.
    pub next: Option<CollectionId>,
    /// 1-based rank of the requested id.
    pub rank: u64,
    /// Total members in the scope.
    pub total: u64,
}

/// One page of summaries plus pagination metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Summaries in requested order.
    pub items: Vec<CollectionSummary>,
    /// Pagination metadata.
    pub info: PageInfo,
}

impl Page {
    fn empty(page: u64, page_size: u64) -> Self {
        Self {
            items: Vec::new(),
            info: PageInfo::new(page, page_size, 0),
        }
    }
}

/// A page in a collection's neighborhood: the page itself plus where the
/// anchor id sits, so callers can center the view on it.
#[derive(Debug, Clone, PartialEq)]
pub struct SiblingsPage {
    /// The requested page of summaries.
    pub page: Page,
    /// 1-based rank of the anchor id, `None` if it is unindexed.
    pub anchor_rank: Option<u64>,
    /// 1-based page number containing the anchor at this page size.
    pub anchor_page: Option<u64>,
}

/// Read-only query surface over the projection.
#[derive(Clone)]
pub struct IndexReader {
    store: Arc<dyn IndexStore>,
    config: IndexConfig,
}

impl IndexReader {
    /// Reader over the given store.
    pub fn new(store: Arc<dyn IndexStore>, config: IndexConfig) -> Self {
        Self { store, config }
    }

    /// Previous/next/rank/total for `id` under (field, direction).
    /// `Ok(None)` when `id` is not indexed; expected right after a
    /// creation whose write-path call has not landed yet.
    ///
    /// # Errors
    /// Returns an error only if the store itself fails.
    pub fn navigation(
        &self,
        id: &CollectionId,
        field: SortField,
        direction: Direction,
    ) -> Result<Option<Navigation>> {
        let set = RankedSetId::new(field, Scope::Global);
        let rank0 = match self.store.ranked_rank(&set, id, direction)? {
            Some(rank0) => rank0,
            None => return Ok(None),
        };
        let total = self.store.ranked_len(&set)?;

        let previous = if rank0 > 0 {
            self.store
                .ranked_range(&set, rank0 - 1, 1, direction)?
                .into_iter()
                .next()
        } else {
            None
        };
        let next = self
            .store
            .ranked_range(&set, rank0 + 1, 1, direction)?
            .into_iter()
            .next();

        Ok(Some(Navigation {
            previous,
            next,
            rank: rank0 + 1,
            total,
        }))
    }

    /// A page of the global ordering together with the anchor id's rank
    /// and page, for centering list views on the entry being viewed.
    ///
    /// # Errors
    /// Returns an error only if the store itself fails.
    pub fn siblings(
        &self,
        id: &CollectionId,
        page: u64,
        page_size: u64,
        field: SortField,
        direction: Direction,
    ) -> Result<SiblingsPage> {
        let page_size = self.clamp_page_size(page_size);
        let set = RankedSetId::new(field, Scope::Global);
        let anchor_rank = self
            .store
            .ranked_rank(&set, id, direction)?
            .map(|rank0| rank0 + 1);
        let anchor_page = anchor_rank.map(|rank| (rank - 1) / page_size + 1);

        let page = self.page_of_set(&set, page, page_size, direction)?;
        Ok(SiblingsPage {
            page,
            anchor_rank,
            anchor_page,
        })
    }

    /// One page of the global ordering.
    ///
    /// # Errors
    /// Returns an error only if the store itself fails.
    pub fn page(
        &self,
        page: u64,
        page_size: u64,
        field: SortField,
        direction: Direction,
    ) -> Result<Page> {
        self.scope_page(Scope::Global, page, page_size, field, direction)
    }

    /// One page of a library's collections.
    ///
    /// # Errors
    /// Returns an error only if the store itself fails.
    pub fn library_page(
        &self,
        library_id: &LibraryId,
        page: u64,
        page_size: u64,
        field: SortField,
        direction: Direction,
    ) -> Result<Page> {
        self.scope_page(
            Scope::Library(library_id.clone()),
            page,
            page_size,
            field,
            direction,
        )
    }

    /// One page of a collection type's members.
    ///
    /// # Errors
    /// Returns an error only if the store itself fails.
    pub fn kind_page(
        &self,
        kind: &CollectionKind,
        page: u64,
        page_size: u64,
        field: SortField,
        direction: Direction,
    ) -> Result<Page> {
        self.scope_page(Scope::Kind(kind.clone()), page, page_size, field, direction)
    }

    /// One page of any scope's ordering.
    ///
    /// # Errors
    /// Returns an error only if the store itself fails.
    pub fn scope_page(
        &self,
        scope: Scope,
        page: u64,
        page_size: u64,
        field: SortField,
        direction: Direction,
    ) -> Result<Page> {
        let page_size = self.clamp_page_size(page_size);
        let set = RankedSetId::new(field, scope);
        self.page_of_set(&set, page, page_size, direction)
    }

    /// Filter the entire summary set by `query`, then sort and paginate
    /// the matches. Matching is a case-insensitive substring test over
    /// name, description, tags, and path.
    ///
    /// # Errors
    /// Returns an error only if the store itself fails.
    pub fn search_page(
        &self,
        query: &str,
        page: u64,
        page_size: u64,
        field: SortField,
        direction: Direction,
    ) -> Result<Page> {
        let page = page.max(1);
        let page_size = self.clamp_page_size(page_size);
        let needle = query.trim().to_lowercase();

        let mut matches: Vec<CollectionSummary> = self
            .store
            .summary_scan()?
            .into_iter()
            .filter(|s| needle.is_empty() || matches_query(s, &needle))
            .collect();

        matches.sort_by(|a, b| {
            let ordering = score_key(a, field)
                .cmp(&score_key(b, field))
                .then_with(|| a.id.cmp(&b.id));
            match direction {
                Direction::Ascending => ordering,
                Direction::Descending => ordering.reverse(),
            }
        });

        let total = matches.len() as u64;
        let start = (page - 1).saturating_mul(page_size);
        let items: Vec<CollectionSummary> = if start >= total {
            Vec::new()
        } else {
            matches
                .into_iter()
                .skip(start as usize)
                .take(page_size as usize)
                .collect()
        };

        Ok(Page {
            items,
            info: PageInfo::new(page, page_size, total),
        })
    }

    /// Total indexed collections.
    ///
    /// # Errors
    /// Returns an error only if the store itself fails.
    pub fn count(&self) -> Result<u64> {
        self.count_in_scope(Scope::Global)
    }

    /// Total collections in a scope. O(1): reads the cardinality of the
    /// scope's UpdatedAt set.
    ///
    /// # Errors
    /// Returns an error only if the store itself fails.
    pub fn count_in_scope(&self, scope: Scope) -> Result<u64> {
        self.store
            .ranked_len(&RankedSetId::new(SortField::UpdatedAt, scope))
    }

    fn clamp_page_size(&self, page_size: u64) -> u64 {
        if page_size == 0 {
            self.config.default_page_size
        } else {
            page_size.min(self.config.max_page_size)
        }
    }

    fn page_of_set(
        &self,
        set: &RankedSetId,
        page: u64,
        page_size: u64,
        direction: Direction,
    ) -> Result<Page> {
        let page = page.max(1);
        let total = self.store.ranked_len(set)?;
        if total == 0 {
            return Ok(Page::empty(page, page_size));
        }

        let start = (page - 1).saturating_mul(page_size);
        let ids = self.store.ranked_range(set, start, page_size, direction)?;
        let items = self
            .store
            .summary_get_many(&ids)?
            .into_iter()
            .flatten()
            .collect();

        Ok(Page {
            items,
            info: PageInfo::new(page, page_size, total),
        })
    }
}

fn matches_query(summary: &CollectionSummary, needle: &str) -> bool {
    summary.name.to_lowercase().contains(needle)
        || summary
            .description
            .as_ref()
            .map(|d| d.to_lowercase().contains(needle))
            .unwrap_or(false)
        || summary
            .tags
            .iter()
            .any(|t| t.to_lowercase().contains(needle))
        || summary.path.to_lowercase().contains(needle)
}
