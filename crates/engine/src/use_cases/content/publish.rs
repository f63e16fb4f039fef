//! Publish a post to a feed.

use std::sync::Arc;

use townsquare_domain::{DocumentId, FeedKind, PostDraft, Session, UserId};

use crate::infrastructure::documents::new_item_fields;
use crate::infrastructure::ports::{ClockPort, CollectionPath, DocumentStore};

use super::PostError;

/// Author id recorded on anonymous feeds. The poster's identity is never
/// stored there, signed in or not.
pub const ANONYMOUS_AUTHOR: &str = "anonymous";

pub struct PublishPost {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn ClockPort>,
}

impl PublishPost {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn ClockPort>) -> Self {
        Self { store, clock }
    }

    pub async fn execute(
        &self,
        kind: FeedKind,
        session: Option<&Session>,
        draft: PostDraft,
    ) -> Result<DocumentId, PostError> {
        let author = if kind.allows_anonymous() {
            UserId::new(ANONYMOUS_AUTHOR)?
        } else {
            session.ok_or(PostError::NotSignedIn)?.user_id.clone()
        };
        let content = draft.validate(kind)?;

        let fields = new_item_fields(content, &author, self.clock.now());
        let id = self
            .store
            .create(&CollectionPath::root(kind.collection()), fields)
            .await?;

        tracing::info!(feed = %kind, id = %id, "Post published");
        Ok(id)
    }
}
