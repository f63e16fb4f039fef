//! Posting, deleting, comments and view counts.

mod comments;
mod delete;
mod publish;
mod views;

use std::sync::Arc;

use townsquare_domain::{DocumentId, DomainError, FeedKind, UserId};

use crate::infrastructure::documents::decode_feed_item;
use crate::infrastructure::ports::{CollectionPath, DocumentRef, DocumentStore, StoreError};

pub use comments::{AddComment, Comment, DeleteComment, ListComments};
pub use delete::DeletePost;
pub use publish::{PublishPost, ANONYMOUS_AUTHOR};
pub use views::RecordView;

#[derive(Debug, thiserror::Error)]
pub enum PostError {
    #[error("Sign in to post")]
    NotSignedIn,
    #[error(transparent)]
    Validation(#[from] DomainError),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Not allowed to delete this item")]
    Forbidden,
    #[error("{0} items cannot be deleted")]
    NotDeletable(FeedKind),
    #[error("{0} items have no comments")]
    CommentsDisabled(FeedKind),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Container for content use cases.
pub struct ContentUseCases {
    pub publish: Arc<PublishPost>,
    pub delete: Arc<DeletePost>,
    pub add_comment: Arc<AddComment>,
    pub list_comments: Arc<ListComments>,
    pub delete_comment: Arc<DeleteComment>,
    pub record_view: Arc<RecordView>,
}

impl ContentUseCases {
    pub fn new(
        publish: Arc<PublishPost>,
        delete: Arc<DeletePost>,
        add_comment: Arc<AddComment>,
        list_comments: Arc<ListComments>,
        delete_comment: Arc<DeleteComment>,
        record_view: Arc<RecordView>,
    ) -> Self {
        Self {
            publish,
            delete,
            add_comment,
            list_comments,
            delete_comment,
            record_view,
        }
    }
}

pub(crate) fn item_ref(kind: FeedKind, id: DocumentId) -> DocumentRef {
    CollectionPath::root(kind.collection()).doc(id)
}

/// Author of an existing item, or `NotFound`.
pub(crate) async fn item_author(
    store: &dyn DocumentStore,
    item: &DocumentRef,
) -> Result<UserId, PostError> {
    let doc = store
        .get(item)
        .await?
        .ok_or_else(|| PostError::NotFound(item.to_string()))?;
    Ok(decode_feed_item(&doc)?.author_id)
}
