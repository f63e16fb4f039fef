//! Stateless page reads for the REST surface.

use std::sync::Arc;

use townsquare_domain::{CategoryFilter, FeedFilter, FeedItem, FeedKind};

use crate::infrastructure::documents::decode_feed_items;
use crate::infrastructure::ports::{Cursor, DocumentStore};

use super::controller::FeedError;
use super::extender::PaginationExtender;
use super::query_builder::FeedQueryBuilder;

#[derive(Debug, Clone)]
pub struct FeedPage {
    pub items: Vec<FeedItem>,
    /// Token for the following page, present only while `has_more`.
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

/// One page of a feed, from the top or after a cursor token.
pub struct ListFeedPage {
    extender: PaginationExtender,
}

impl ListFeedPage {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            extender: PaginationExtender::new(store),
        }
    }

    /// A token minted for a different category or tag is rejected with
    /// `CursorMismatch` rather than silently applied to the new filter.
    pub async fn execute(
        &self,
        kind: FeedKind,
        filter: &FeedFilter,
        cursor: Option<&str>,
    ) -> Result<FeedPage, FeedError> {
        let query = FeedQueryBuilder::new(kind).build(filter);
        let after = cursor.map(Cursor::from_token).transpose()?;
        let page = self.extender.fetch(&query, after, filter.page_size).await?;

        let mut items = decode_feed_items(&page.items);
        if let Some(needle) = &filter.search {
            items.retain(|item| item.matches_search(needle));
        }
        let next_cursor = if page.has_more {
            page.cursor.as_ref().map(Cursor::to_token)
        } else {
            None
        };

        Ok(FeedPage {
            items,
            next_cursor,
            has_more: page.has_more,
        })
    }
}

/// Most-replied items of a feed.
pub struct FeaturedItems {
    store: Arc<dyn DocumentStore>,
    limit: usize,
}

impl FeaturedItems {
    pub fn new(store: Arc<dyn DocumentStore>, limit: usize) -> Self {
        Self { store, limit }
    }

    pub async fn execute(
        &self,
        kind: FeedKind,
        category: &CategoryFilter,
    ) -> Result<Vec<FeedItem>, FeedError> {
        let query = FeedQueryBuilder::new(kind).featured(category, self.limit);
        let docs = self.store.query(&query, None).await?;
        Ok(decode_feed_items(&docs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::SequentialRandom;
    use crate::infrastructure::memory_store::InMemoryDocumentStore;
    use crate::infrastructure::ports::{CollectionPath, StoreError};
    use serde_json::json;
    use townsquare_domain::PageSize;

    async fn seeded(count: i64) -> Arc<InMemoryDocumentStore> {
        let store = Arc::new(InMemoryDocumentStore::new(Arc::new(SequentialRandom::default())));
        for i in 0..count {
            let fields = json!({
                "createdAt": i, "lastActivityAt": i, "authorId": "u1",
                "category": if i % 2 == 0 { "jazz" } else { "folk" },
                "replyCount": i % 3,
                "payload": {"title": format!("Thread {i}"), "body": "..."}
            });
            store
                .create(
                    &CollectionPath::root("threads"),
                    fields.as_object().cloned().unwrap(),
                )
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn pages_chain_through_cursor_tokens() {
        let store = seeded(5).await;
        let list = ListFeedPage::new(store);
        let filter = FeedFilter::new(PageSize::clamped(2));

        let first = list.execute(FeedKind::Forum, &filter, None).await.unwrap();
        assert_eq!(first.items.len(), 2);
        let second = list
            .execute(FeedKind::Forum, &filter, first.next_cursor.as_deref())
            .await
            .unwrap();
        let third = list
            .execute(FeedKind::Forum, &filter, second.next_cursor.as_deref())
            .await
            .unwrap();

        assert_eq!(third.items.len(), 1);
        assert!(!third.has_more);
        assert!(third.next_cursor.is_none());
        assert_eq!(third.items[0].title(), Some("Thread 0"));
    }

    #[tokio::test]
    async fn token_from_other_filter_is_rejected() {
        let store = seeded(4).await;
        let list = ListFeedPage::new(store);
        let all = FeedFilter::new(PageSize::clamped(1));
        let first = list.execute(FeedKind::Forum, &all, None).await.unwrap();

        let jazz = all.with_category(CategoryFilter::Named("jazz".into()));
        let err = list
            .execute(FeedKind::Forum, &jazz, first.next_cursor.as_deref())
            .await
            .unwrap_err();
        assert!(matches!(err, FeedError::Store(StoreError::CursorMismatch)));
    }

    #[tokio::test]
    async fn search_filters_the_page() {
        let store = seeded(4).await;
        let list = ListFeedPage::new(store);
        let filter = FeedFilter::new(PageSize::clamped(10)).with_search(Some("THREAD 3"));
        let page = list.execute(FeedKind::Forum, &filter, None).await.unwrap();
        assert_eq!(page.items.len(), 1);
    }

    #[tokio::test]
    async fn featured_prefers_most_replied() {
        let store = seeded(6).await;
        let featured = FeaturedItems::new(store, 2);
        let items = featured
            .execute(FeedKind::Forum, &CategoryFilter::All)
            .await
            .unwrap();
        // replyCount = i % 3: items 5 and 2 both have 2 replies, newest first.
        let titles: Vec<_> = items.iter().filter_map(|i| i.title()).collect();
        assert_eq!(titles, vec!["Thread 5", "Thread 2"]);
    }
}
