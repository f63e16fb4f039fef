//! Feed controller: one live window plus extension pages for one view.
//!
//! The live window keeps the first page current. "Load more" appends
//! one-shot pages read after the last item of the combined list, and the
//! reconciler merges both into one ordered, duplicate-free list.
//!
//! Every filter change or teardown bumps a generation counter. A page that
//! was requested under an older generation is discarded when it lands, so
//! results for an old filter never leak into the new list.

use std::sync::Arc;

use townsquare_domain::{FeedFilter, FeedItem, FeedKind, PageSize};

use crate::infrastructure::documents::decode_feed_items;
use crate::infrastructure::ports::{Cursor, Document, DocumentStore, StoreError, StoreQuery};

use super::extender::{Page, PaginationExtender};
use super::live_window::LiveWindow;
use super::query_builder::FeedQueryBuilder;
use super::reconcile::reconcile_documents;

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("Feed is closed")]
    Closed,
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PagingState {
    /// Only the live window is shown; `has_more` comes from it.
    NotStarted,
    More,
    Exhausted,
}

/// A "load more" that has been started but not applied yet.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub generation: u64,
    pub query: StoreQuery,
    pub cursor: Cursor,
    pub page_size: PageSize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Items were read and merged (duplicates included in the count).
    Appended(usize),
    /// Nothing further to read.
    Exhausted,
    /// The request belonged to a previous filter or a closed feed.
    Discarded,
}

pub struct Feed {
    store: Arc<dyn DocumentStore>,
    builder: FeedQueryBuilder,
    extender: PaginationExtender,
    filter: FeedFilter,
    query: StoreQuery,
    window: Option<LiveWindow>,
    /// Live items seen in the last applied snapshot.
    live: Vec<Document>,
    extensions: Vec<Document>,
    paging: PagingState,
    generation: u64,
}

impl Feed {
    pub async fn open(
        store: Arc<dyn DocumentStore>,
        kind: FeedKind,
        filter: FeedFilter,
    ) -> Result<Self, FeedError> {
        let builder = FeedQueryBuilder::new(kind);
        let query = builder.build(&filter);
        let window = LiveWindow::open(store.clone(), &query, filter.page_size).await?;
        let live = window.items().to_vec();
        tracing::debug!(
            feed = %kind,
            category = %filter.category,
            tag = ?filter.tag,
            "Feed opened"
        );
        Ok(Self {
            extender: PaginationExtender::new(store.clone()),
            store,
            builder,
            filter,
            query,
            window: Some(window),
            live,
            extensions: Vec::new(),
            paging: PagingState::NotStarted,
            generation: 0,
        })
    }

    pub fn filter(&self) -> &FeedFilter {
        &self.filter
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_closed(&self) -> bool {
        self.window.is_none()
    }

    pub fn has_more(&self) -> bool {
        match self.paging {
            PagingState::NotStarted => self
                .window
                .as_ref()
                .is_some_and(|window| window.has_more()),
            PagingState::More => true,
            PagingState::Exhausted => false,
        }
    }

    /// Live items followed by extension items, deduplicated, in query order.
    pub fn documents(&self) -> Vec<Document> {
        reconcile_documents(&self.query, &self.live, &self.extensions)
    }

    /// Decoded items with the search text applied.
    pub fn items(&self) -> Vec<FeedItem> {
        let docs = self.documents();
        let items = decode_feed_items(&docs);
        match &self.filter.search {
            Some(needle) => items
                .into_iter()
                .filter(|item| item.matches_search(needle))
                .collect(),
            None => items,
        }
    }

    /// Apply snapshots already delivered to the live window.
    pub fn sync(&mut self) -> Result<bool, FeedError> {
        let window = self.window.as_mut().ok_or(FeedError::Closed)?;
        if !window.drain_pending()? {
            return Ok(false);
        }
        self.absorb_snapshot();
        Ok(true)
    }

    /// Wait for the next live snapshot. `Ok(false)` when the subscription ended.
    pub async fn next_change(&mut self) -> Result<bool, FeedError> {
        let window = self.window.as_mut().ok_or(FeedError::Closed)?;
        if !window.changed().await? {
            return Ok(false);
        }
        self.absorb_snapshot();
        Ok(true)
    }

    /// Once paging has started, items pushed off the bottom of a full live
    /// window by newer ones are kept as extension items so the combined
    /// list does not open a gap.
    fn absorb_snapshot(&mut self) {
        let Some(window) = self.window.as_ref() else {
            return;
        };
        let snapshot = window.items().to_vec();

        if self.paging != PagingState::NotStarted && window.has_more() {
            if let Some(tail) = snapshot.last() {
                let pushed_down: Vec<Document> = self
                    .live
                    .iter()
                    .filter(|doc| !snapshot.iter().any(|s| s.id == doc.id))
                    .filter(|doc| self.query.compare(doc, tail).is_gt())
                    .cloned()
                    .collect();
                if !pushed_down.is_empty() {
                    tracing::debug!(count = pushed_down.len(), "Retaining items pushed out of live window");
                    self.extensions =
                        reconcile_documents(&self.query, &pushed_down, &self.extensions);
                }
            }
        }

        self.live = snapshot;
    }

    /// Start a "load more". Returns `None` when there is nothing to load.
    ///
    /// Calling this twice before applying the first result fetches the same
    /// page twice; the duplicates collapse on merge.
    pub fn begin_load_more(&self) -> Option<PageRequest> {
        if self.is_closed() || !self.has_more() {
            return None;
        }
        let last = self.documents().pop()?;
        Some(PageRequest {
            generation: self.generation,
            cursor: self.query.cursor_after(&last),
            query: self.query.clone(),
            page_size: self.filter.page_size,
        })
    }

    /// Merge the result of a page request.
    ///
    /// Stale requests are dropped. A failed read is returned to the caller
    /// and leaves the list as it was.
    pub fn apply_page(
        &mut self,
        request: &PageRequest,
        result: Result<Page, StoreError>,
    ) -> Result<LoadOutcome, FeedError> {
        if request.generation != self.generation || self.is_closed() {
            tracing::debug!(
                request_generation = request.generation,
                current_generation = self.generation,
                "Discarding page for a previous filter"
            );
            return Ok(LoadOutcome::Discarded);
        }

        let page = result.map_err(|e| {
            tracing::warn!(error = %e, "Load more failed; list unchanged");
            FeedError::Store(e)
        })?;

        if page.items.is_empty() {
            self.paging = PagingState::Exhausted;
            return Ok(LoadOutcome::Exhausted);
        }

        let count = page.items.len();
        self.extensions = reconcile_documents(&self.query, &page.items, &self.extensions);
        self.paging = if page.has_more {
            PagingState::More
        } else {
            PagingState::Exhausted
        };
        tracing::debug!(count, has_more = page.has_more, "Extension page merged");
        Ok(LoadOutcome::Appended(count))
    }

    /// Fetch and merge the next page.
    pub async fn load_more(&mut self) -> Result<LoadOutcome, FeedError> {
        let Some(request) = self.begin_load_more() else {
            if self.is_closed() {
                return Err(FeedError::Closed);
            }
            return Ok(LoadOutcome::Exhausted);
        };
        let result = self
            .extender
            .next_page(&request.query, request.cursor.clone(), request.page_size)
            .await;
        self.apply_page(&request, result)
    }

    /// Switch filters.
    ///
    /// A search-only change keeps everything in place. Any other change
    /// drops the live window and extension pages and starts again at page
    /// one, so no cursor from the old query is ever reused.
    pub async fn set_filter(&mut self, filter: FeedFilter) -> Result<(), FeedError> {
        if self.is_closed() {
            return Err(FeedError::Closed);
        }
        if filter.same_query_shape(&self.filter) && filter.page_size == self.filter.page_size {
            self.filter = filter;
            return Ok(());
        }

        self.generation += 1;
        self.window = None;
        self.live.clear();
        self.extensions.clear();
        self.paging = PagingState::NotStarted;

        let query = self.builder.build(&filter);
        let window = LiveWindow::open(self.store.clone(), &query, filter.page_size).await?;
        self.live = window.items().to_vec();
        self.window = Some(window);
        self.query = query;
        self.filter = filter;
        tracing::debug!(generation = self.generation, "Feed filter changed; paging reset");
        Ok(())
    }

    /// Release the live subscription. Pages still in flight are discarded
    /// when they land.
    pub fn close(&mut self) {
        if self.window.take().is_some() {
            self.generation += 1;
        }
    }
}
