//! Comments on threads and stories.
//!
//! Adding a comment bumps the parent in the same atomic batch: the reply
//! counter goes up and `lastActivityAt` moves to the comment time, which
//! floats the parent to the top of its feed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use townsquare_domain::{CommentBody, DeletePolicy, DocumentId, FeedKind, Session, UserId};

use crate::infrastructure::documents::{
    millis, timestamp, AUTHOR_ID, COMMENTS, COMMENT_BODY, CREATED_AT, LAST_ACTIVITY_AT,
    REPLY_COUNT,
};
use crate::infrastructure::ports::{
    ClockPort, CollectionPath, Direction, Document, DocumentRef, DocumentStore, Fields,
    Precondition, RandomPort, StoreError, StoreQuery, WriteBatch,
};

use super::{item_ref, PostError};

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: DocumentId,
    pub author_id: UserId,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    fn from_document(doc: &Document) -> Result<Self, StoreError> {
        let author_id = doc
            .get_str(AUTHOR_ID)
            .and_then(|raw| UserId::new(raw).ok())
            .ok_or_else(|| StoreError::serialization(format!("{}: missing author", doc.id)))?;
        Ok(Self {
            id: doc.id.clone(),
            author_id,
            body: doc.get_str(COMMENT_BODY).unwrap_or_default().to_string(),
            created_at: timestamp(doc, CREATED_AT)?,
        })
    }
}

fn comments_of(kind: FeedKind, parent: DocumentId) -> Result<(DocumentRef, CollectionPath), PostError> {
    if !kind.has_comments() {
        return Err(PostError::CommentsDisabled(kind));
    }
    let parent = item_ref(kind, parent);
    let collection = CollectionPath::child(&parent, COMMENTS);
    Ok((parent, collection))
}

pub struct AddComment {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn ClockPort>,
    random: Arc<dyn RandomPort>,
}

impl AddComment {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
    ) -> Self {
        Self {
            store,
            clock,
            random,
        }
    }

    pub async fn execute(
        &self,
        kind: FeedKind,
        session: &Session,
        parent: DocumentId,
        body: CommentBody,
    ) -> Result<DocumentId, PostError> {
        let (parent, comments) = comments_of(kind, parent)?;
        let id = DocumentId::new(self.random.gen_document_id())?;
        let now = millis(self.clock.now());

        let mut comment = Fields::new();
        comment.insert(AUTHOR_ID.into(), session.user_id.to_string().into());
        comment.insert(COMMENT_BODY.into(), String::from(body).into());
        comment.insert(CREATED_AT.into(), now.clone());

        let mut bump = Fields::new();
        bump.insert(LAST_ACTIVITY_AT.into(), now);

        let batch = WriteBatch::new()
            .require(Precondition::Exists(parent.clone()))
            .set(comments.doc(id.clone()), comment)
            .increment(parent.clone(), REPLY_COUNT, 1)
            .update(parent.clone(), bump);

        self.store.commit(batch).await.map_err(|e| match e {
            StoreError::PreconditionFailed(_) => PostError::NotFound(parent.to_string()),
            other => PostError::Store(other),
        })?;

        tracing::debug!(parent = %parent, comment = %id, "Comment added");
        Ok(id)
    }
}

pub struct ListComments {
    store: Arc<dyn DocumentStore>,
}

impl ListComments {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Oldest first.
    pub async fn execute(
        &self,
        kind: FeedKind,
        parent: DocumentId,
    ) -> Result<Vec<Comment>, PostError> {
        let (_, comments) = comments_of(kind, parent)?;
        let query = StoreQuery::new(comments).order_by(CREATED_AT, Direction::Asc);
        let docs = self.store.query(&query, None).await?;
        Ok(docs
            .iter()
            .filter_map(|doc| match Comment::from_document(doc) {
                Ok(comment) => Some(comment),
                Err(e) => {
                    tracing::warn!(id = %doc.id, error = %e, "Skipping malformed comment");
                    None
                }
            })
            .collect())
    }
}

pub struct DeleteComment {
    store: Arc<dyn DocumentStore>,
}

impl DeleteComment {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Owner or admin. The parent's reply counter is decremented when the
    /// parent still exists.
    pub async fn execute(
        &self,
        kind: FeedKind,
        session: &Session,
        parent: DocumentId,
        comment_id: DocumentId,
    ) -> Result<(), PostError> {
        let (parent, comments) = comments_of(kind, parent)?;
        let comment = comments.doc(comment_id);

        let doc = self
            .store
            .get(&comment)
            .await?
            .ok_or_else(|| PostError::NotFound(comment.to_string()))?;
        let author = Comment::from_document(&doc)?.author_id;
        if !session.can_delete(&author, DeletePolicy::OwnerOrAdmin) {
            return Err(PostError::Forbidden);
        }

        let mut batch = WriteBatch::new()
            .require(Precondition::Exists(comment.clone()))
            .delete(comment.clone());
        if self.store.get(&parent).await?.is_some() {
            batch = batch
                .require(Precondition::Exists(parent.clone()))
                .increment(parent, REPLY_COUNT, -1);
        }

        self.store.commit(batch).await.map_err(|e| match e {
            StoreError::PreconditionFailed(_) => PostError::NotFound(comment.to_string()),
            other => PostError::Store(other),
        })?;
        tracing::debug!(comment = %comment, "Comment deleted");
        Ok(())
    }
}
