//! View counter.

use std::sync::Arc;

use townsquare_domain::{DocumentId, FeedKind};

use crate::infrastructure::documents::VIEW_COUNT;
use crate::infrastructure::ports::WriteBatch;
use crate::infrastructure::resilient_writes::{ResilientWriter, WriteOutcome};

use super::item_ref;

/// Background `viewCount` increment. Failures are retried and end up as a
/// degraded outcome, never as an error for the viewer. A view of an item
/// that does not exist is skipped.
pub struct RecordView {
    writer: Arc<ResilientWriter>,
}

impl RecordView {
    pub fn new(writer: Arc<ResilientWriter>) -> Self {
        Self { writer }
    }

    pub async fn execute(&self, kind: FeedKind, id: DocumentId) -> WriteOutcome {
        let batch = WriteBatch::new().increment(item_ref(kind, id), VIEW_COUNT, 1);
        self.writer.commit("record_view", batch).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::SequentialRandom;
    use crate::infrastructure::memory_store::InMemoryDocumentStore;
    use crate::infrastructure::ports::DocumentStore;
    use crate::infrastructure::resilient_writes::{RetryConfig, WriteHealth};
    use serde_json::json;

    fn setup() -> (Arc<InMemoryDocumentStore>, RecordView, Arc<WriteHealth>) {
        let random = Arc::new(SequentialRandom::default());
        let store = Arc::new(InMemoryDocumentStore::new(random.clone()));
        let health = Arc::new(WriteHealth::new());
        let config = RetryConfig {
            max_retries: 2,
            base_delay_ms: 1,
            max_delay_ms: 5,
            jitter_factor: 0.0,
        };
        let writer = ResilientWriter::new(store.clone(), random, config, health.clone());
        (store, RecordView::new(Arc::new(writer)), health)
    }

    async fn seed_product(store: &InMemoryDocumentStore) -> DocumentId {
        let id = DocumentId::new("p1").unwrap();
        store
            .set(
                &item_ref(FeedKind::Marketplace, id.clone()),
                json!({"viewCount": 0}).as_object().cloned().unwrap(),
                false,
            )
            .await
            .unwrap();
        id
    }

    #[tokio::test]
    async fn view_survives_a_transient_failure() {
        let (store, views, health) = setup();
        let id = seed_product(&store).await;

        store.fail_next(1);
        let outcome = views.execute(FeedKind::Marketplace, id.clone()).await;
        assert_eq!(outcome, WriteOutcome::Applied { attempts: 2 });
        assert_eq!(health.degraded_writes(), 0);

        let doc = store
            .get(&item_ref(FeedKind::Marketplace, id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.get_i64(VIEW_COUNT), Some(1));
    }

    #[tokio::test]
    async fn offline_store_degrades_instead_of_failing() {
        let (store, views, health) = setup();
        let id = seed_product(&store).await;

        store.set_offline(true);
        let outcome = views.execute(FeedKind::Marketplace, id).await;
        assert!(!outcome.is_applied());
        assert_eq!(health.degraded_writes(), 1);
    }

    #[tokio::test]
    async fn view_of_missing_item_keeps_health_clean() {
        let (_, views, health) = setup();

        let outcome = views
            .execute(FeedKind::Forum, DocumentId::new("does-not-exist").unwrap())
            .await;
        assert!(matches!(outcome, WriteOutcome::Skipped { .. }));
        assert_eq!(health.degraded_writes(), 0);
    }
}
