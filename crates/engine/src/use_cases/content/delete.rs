//! Delete a post.
//!
//! Direct delete with no cascade: comment and reaction sub-collections
//! are left orphaned.

use std::sync::Arc;

use townsquare_domain::{DeletePolicy, DocumentId, FeedKind, Session};

use crate::infrastructure::ports::DocumentStore;

use super::{item_author, item_ref, PostError};

pub struct DeletePost {
    store: Arc<dyn DocumentStore>,
}

impl DeletePost {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn execute(
        &self,
        kind: FeedKind,
        session: &Session,
        id: DocumentId,
    ) -> Result<(), PostError> {
        let policy = kind.delete_policy();
        if policy == DeletePolicy::Never {
            return Err(PostError::NotDeletable(kind));
        }

        let item = item_ref(kind, id);
        let author = item_author(self.store.as_ref(), &item).await?;
        if !session.can_delete(&author, policy) {
            tracing::warn!(
                feed = %kind,
                item = %item,
                user_id = %session.user_id,
                "Delete refused"
            );
            return Err(PostError::Forbidden);
        }

        self.store.delete(&item).await?;
        tracing::info!(feed = %kind, item = %item, "Post deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{Document, MockDocumentStore};
    use serde_json::json;
    use townsquare_domain::UserId;

    fn product_by(author: &str) -> Document {
        Document::new(
            DocumentId::new("p1").unwrap(),
            json!({"createdAt": 1, "lastActivityAt": 1, "authorId": author})
                .as_object()
                .cloned()
                .unwrap(),
        )
    }

    fn store_with(doc: Option<Document>, deletes: usize) -> MockDocumentStore {
        let mut store = MockDocumentStore::new();
        store
            .expect_get()
            .returning(move |_| Ok(doc.clone()));
        store.expect_delete().times(deletes).returning(|_| Ok(()));
        store
    }

    fn member(id: &str) -> Session {
        Session::member(UserId::new(id).unwrap())
    }

    #[tokio::test]
    async fn owner_deletes_own_product() {
        let use_case = DeletePost::new(Arc::new(store_with(Some(product_by("u1")), 1)));
        use_case
            .execute(FeedKind::Marketplace, &member("u1"), DocumentId::new("p1").unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn stranger_is_forbidden() {
        let use_case = DeletePost::new(Arc::new(store_with(Some(product_by("u1")), 0)));
        let err = use_case
            .execute(FeedKind::Marketplace, &member("u2"), DocumentId::new("p1").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, PostError::Forbidden));
    }

    #[tokio::test]
    async fn forum_threads_are_never_deleted() {
        let use_case = DeletePost::new(Arc::new(MockDocumentStore::new()));
        let admin = Session::admin(UserId::new("mod").unwrap());
        let err = use_case
            .execute(FeedKind::Forum, &admin, DocumentId::new("t1").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, PostError::NotDeletable(FeedKind::Forum)));
    }

    #[tokio::test]
    async fn missing_item_is_not_found() {
        let use_case = DeletePost::new(Arc::new(store_with(None, 0)));
        let err = use_case
            .execute(FeedKind::Stories, &member("u1"), DocumentId::new("p1").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, PostError::NotFound(_)));
    }

    #[tokio::test]
    async fn only_admins_delete_confessions() {
        let confession = product_by("anonymous");
        let use_case = DeletePost::new(Arc::new(store_with(Some(confession.clone()), 1)));
        let admin = Session::admin(UserId::new("mod").unwrap());
        use_case
            .execute(FeedKind::Confessions, &admin, DocumentId::new("p1").unwrap())
            .await
            .unwrap();

        let use_case = DeletePost::new(Arc::new(store_with(Some(confession), 0)));
        let err = use_case
            .execute(FeedKind::Confessions, &member("u1"), DocumentId::new("p1").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, PostError::Forbidden));
    }
}
