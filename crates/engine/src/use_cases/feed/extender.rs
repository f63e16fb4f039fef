//! One-shot page reads anchored after a cursor.

use std::sync::Arc;

use townsquare_domain::PageSize;

use crate::infrastructure::ports::{Cursor, Document, DocumentStore, StoreError, StoreQuery};

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<Document>,
    /// Anchor for the following page. Unchanged when the page is empty.
    pub cursor: Option<Cursor>,
    pub has_more: bool,
}

pub struct PaginationExtender {
    store: Arc<dyn DocumentStore>,
}

impl PaginationExtender {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Read up to `page_size` results after `after` (or from the top).
    ///
    /// An empty page is terminal: `has_more` is false and the cursor is
    /// handed back as it came in. Store errors propagate untouched.
    pub async fn fetch(
        &self,
        query: &StoreQuery,
        after: Option<Cursor>,
        page_size: PageSize,
    ) -> Result<Page, StoreError> {
        let query = query.clone().limit(page_size.as_usize());
        let items = self.store.query(&query, after.clone()).await?;

        let Some(last) = items.last() else {
            return Ok(Page {
                items,
                cursor: after,
                has_more: false,
            });
        };

        let cursor = query.cursor_after(last);
        let has_more = items.len() == page_size.as_usize();
        Ok(Page {
            items,
            cursor: Some(cursor),
            has_more,
        })
    }

    /// The page following `cursor`.
    pub async fn next_page(
        &self,
        query: &StoreQuery,
        cursor: Cursor,
        page_size: PageSize,
    ) -> Result<Page, StoreError> {
        self.fetch(query, Some(cursor), page_size).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{CollectionPath, Direction, MockDocumentStore};
    use serde_json::json;
    use townsquare_domain::DocumentId;

    fn query() -> StoreQuery {
        StoreQuery::new(CollectionPath::root("products")).order_by("createdAt", Direction::Desc)
    }

    fn doc(id: &str, at: i64) -> Document {
        Document::new(
            DocumentId::new(id).unwrap(),
            json!({"createdAt": at}).as_object().cloned().unwrap(),
        )
    }

    #[tokio::test]
    async fn full_page_reports_more_and_anchors_on_last_item() {
        let mut store = MockDocumentStore::new();
        store
            .expect_query()
            .withf(|q, after| q.limit == Some(2) && after.is_none())
            .returning(|_, _| Ok(vec![doc("p2", 2), doc("p1", 1)]));
        let extender = PaginationExtender::new(Arc::new(store));

        let page = extender
            .fetch(&query(), None, PageSize::clamped(2))
            .await
            .unwrap();
        assert!(page.has_more);
        assert_eq!(page.cursor.unwrap().document_id(), "p1");
    }

    #[tokio::test]
    async fn empty_page_keeps_cursor_and_ends_paging() {
        let mut store = MockDocumentStore::new();
        store.expect_query().returning(|_, _| Ok(vec![]));
        let extender = PaginationExtender::new(Arc::new(store));
        let cursor = query().cursor_after(&doc("p1", 1));

        let page = extender
            .next_page(&query(), cursor.clone(), PageSize::clamped(2))
            .await
            .unwrap();
        assert!(!page.has_more);
        assert_eq!(page.cursor, Some(cursor));
    }

    #[tokio::test]
    async fn store_errors_propagate() {
        let mut store = MockDocumentStore::new();
        store
            .expect_query()
            .returning(|_, _| Err(StoreError::unavailable("query", "timeout")));
        let extender = PaginationExtender::new(Arc::new(store));
        let cursor = query().cursor_after(&doc("p1", 1));

        let err = extender
            .next_page(&query(), cursor, PageSize::clamped(2))
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }
}
