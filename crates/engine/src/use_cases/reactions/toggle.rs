//! Toggle a member's reaction on a story.
//!
//! The reaction document (`stories/{id}/reactions/{userId}`) and the
//! story's `reactionCounts` change in one conditional batch. The batch is
//! guarded on the reaction's `kind` as it was read, so two toggles from the
//! same member racing each other cannot both apply.

use std::sync::Arc;

use serde_json::Value;
use townsquare_domain::{DocumentId, FeedKind, ReactionKind, ReactionTransition, Session};

use crate::infrastructure::documents::{
    millis, reaction_counter, CREATED_AT, REACTIONS, REACTION_KIND, USER_ID,
};
use crate::infrastructure::ports::{
    ClockPort, CollectionPath, DocumentRef, DocumentStore, Fields, Precondition, StoreError,
    WriteBatch,
};

use super::ReactionError;

/// Attempts before a toggle gives up with [`ReactionError::Conflict`].
pub const MAX_TOGGLE_ATTEMPTS: u32 = 3;

pub struct ToggleReaction {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn ClockPort>,
}

impl ToggleReaction {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn ClockPort>) -> Self {
        Self { store, clock }
    }

    fn story_ref(story: &DocumentId) -> DocumentRef {
        CollectionPath::root(FeedKind::Stories.collection()).doc(story.clone())
    }

    /// Press `pressed` on `story`. Returns the applied transition; its
    /// `next` is the caller's reaction afterwards.
    pub async fn execute(
        &self,
        session: &Session,
        story: DocumentId,
        pressed: ReactionKind,
    ) -> Result<ReactionTransition, ReactionError> {
        let story_ref = Self::story_ref(&story);
        let reaction_ref = CollectionPath::child(&story_ref, REACTIONS)
            .doc(DocumentId::new(session.user_id.as_str())?);

        for attempt in 1..=MAX_TOGGLE_ATTEMPTS {
            if self.store.get(&story_ref).await?.is_none() {
                return Err(ReactionError::StoryNotFound(story.to_string()));
            }
            // The guard holds the raw stored value; a kind this build does not
            // know is replaced as if there were no reaction.
            let stored = self
                .store
                .get(&reaction_ref)
                .await?
                .and_then(|doc| doc.get(REACTION_KIND).cloned());
            let previous = stored.as_ref().and_then(Value::as_str).and_then(|k| k.parse().ok());
            if stored.is_some() && previous.is_none() {
                tracing::warn!(story = %story, user_id = %session.user_id, stored = ?stored, "Replacing unrecognised reaction kind");
            }
            let transition = ReactionTransition::press(previous, pressed);

            let batch =
                self.transition_batch(&story_ref, &reaction_ref, session, stored, &transition);
            match self.store.commit(batch).await {
                Ok(()) => {
                    tracing::debug!(
                        story = %story,
                        user_id = %session.user_id,
                        previous = ?transition.previous,
                        next = ?transition.next,
                        "Reaction toggled"
                    );
                    return Ok(transition);
                }
                Err(StoreError::PreconditionFailed(reason)) => {
                    tracing::debug!(story = %story, attempt, reason = %reason, "Reaction toggle raced, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::warn!(story = %story, user_id = %session.user_id, "Reaction toggle kept conflicting");
        Err(ReactionError::Conflict)
    }

    fn transition_batch(
        &self,
        story_ref: &DocumentRef,
        reaction_ref: &DocumentRef,
        session: &Session,
        stored: Option<Value>,
        transition: &ReactionTransition,
    ) -> WriteBatch {
        let mut batch = WriteBatch::new()
            .require(Precondition::Exists(story_ref.clone()))
            .require(Precondition::FieldEquals {
                doc: reaction_ref.clone(),
                field: REACTION_KIND.to_string(),
                value: stored,
            });

        batch = match transition.next {
            Some(kind) => {
                let mut fields = Fields::new();
                fields.insert(REACTION_KIND.into(), Value::from(kind.as_str()));
                fields.insert(USER_ID.into(), Value::from(session.user_id.as_str()));
                fields.insert(CREATED_AT.into(), millis(self.clock.now()));
                batch.set(reaction_ref.clone(), fields)
            }
            None => batch.delete(reaction_ref.clone()),
        };

        for (kind, delta) in transition.counter_deltas() {
            batch = batch.increment(story_ref.clone(), &reaction_counter(kind), delta);
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{Document, MockClockPort, MockDocumentStore};
    use chrono::{TimeZone, Utc};
    use mockall::predicate::*;
    use serde_json::json;
    use townsquare_domain::UserId;

    fn clock() -> Arc<MockClockPort> {
        let mut clock = MockClockPort::new();
        clock
            .expect_now()
            .returning(|| Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap());
        Arc::new(clock)
    }

    fn story_doc() -> Document {
        Document::new(
            DocumentId::new("s1").unwrap(),
            json!({"createdAt": 1}).as_object().cloned().unwrap(),
        )
    }

    fn session() -> Session {
        Session::member(UserId::new("u1").unwrap())
    }

    #[tokio::test]
    async fn missing_story_is_not_found_without_writing() {
        let mut store = MockDocumentStore::new();
        store.expect_get().times(1).returning(|_| Ok(None));
        store.expect_commit().never();

        let toggle = ToggleReaction::new(Arc::new(store), clock());
        let err = toggle
            .execute(&session(), DocumentId::new("s1").unwrap(), ReactionKind::Heart)
            .await
            .unwrap_err();
        assert!(matches!(err, ReactionError::StoryNotFound(_)));
    }

    #[tokio::test]
    async fn gives_up_after_repeated_conflicts() {
        let mut store = MockDocumentStore::new();
        store.expect_get().returning(|doc| {
            if doc.collection.as_str() == "stories" {
                Ok(Some(story_doc()))
            } else {
                Ok(None)
            }
        });
        store
            .expect_commit()
            .times(MAX_TOGGLE_ATTEMPTS as usize)
            .returning(|_| Err(StoreError::precondition("kind changed")));

        let toggle = ToggleReaction::new(Arc::new(store), clock());
        let err = toggle
            .execute(&session(), DocumentId::new("s1").unwrap(), ReactionKind::Heart)
            .await
            .unwrap_err();
        assert!(matches!(err, ReactionError::Conflict));
    }

    #[tokio::test]
    async fn new_reaction_batch_guards_on_absence() {
        let mut store = MockDocumentStore::new();
        store.expect_get().returning(|doc| {
            if doc.collection.as_str() == "stories" {
                Ok(Some(story_doc()))
            } else {
                Ok(None)
            }
        });
        store
            .expect_commit()
            .withf(|batch| {
                batch.preconditions.iter().any(|p| {
                    matches!(p, Precondition::FieldEquals { value: None, field, .. } if field == "kind")
                }) && batch.writes.len() == 2
            })
            .times(1)
            .returning(|_| Ok(()));

        let toggle = ToggleReaction::new(Arc::new(store), clock());
        let transition = toggle
            .execute(&session(), DocumentId::new("s1").unwrap(), ReactionKind::Heart)
            .await
            .unwrap();
        assert_eq!(transition.next, Some(ReactionKind::Heart));
    }

    #[tokio::test]
    async fn store_outage_is_surfaced() {
        let mut store = MockDocumentStore::new();
        store
            .expect_get()
            .with(always())
            .returning(|_| Err(StoreError::unavailable("get", "offline")));

        let toggle = ToggleReaction::new(Arc::new(store), clock());
        let err = toggle
            .execute(&session(), DocumentId::new("s1").unwrap(), ReactionKind::Like)
            .await
            .unwrap_err();
        assert!(matches!(err, ReactionError::Store(ref e) if e.is_transient()));
    }
}
