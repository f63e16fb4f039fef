//! Unique handle claims.
//!
//! `usernames/{handle}` is the source of truth for ownership; the copy on
//! `users/{userId}` is written in the same batch. A claim only lands when
//! the handle document is still absent, so two members racing for the same
//! handle cannot both get it: the loser re-reads and moves on to the next
//! suffixed variant.

use std::sync::Arc;

use serde_json::Value;
use townsquare_domain::{DocumentId, DomainError, Handle, UserId};

use crate::infrastructure::documents::{millis, CLAIMED_AT, USERNAME, USERNAMES, USERS, USER_ID};
use crate::infrastructure::ports::{
    ClockPort, CollectionPath, DocumentRef, DocumentStore, Fields, Precondition, StoreError,
    WriteBatch,
};

/// Highest numeric suffix tried before giving up.
pub const MAX_SUFFIX: u32 = 99;

/// Conditional-write retries per candidate handle.
const ATTEMPTS_PER_CANDIDATE: u32 = 3;

#[derive(Debug, thiserror::Error)]
pub enum UsernameError {
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error("No free variant of @{0}")]
    Exhausted(Handle),
    #[error("Handle claim kept conflicting, try again")]
    Conflict,
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimedHandle {
    pub handle: Handle,
    /// The base handle was taken and a suffix was added.
    pub disambiguated: bool,
}

fn handle_ref(handle: &Handle) -> Result<DocumentRef, DomainError> {
    Ok(CollectionPath::root(USERNAMES).doc(DocumentId::new(handle.as_str())?))
}

fn user_ref(user: &UserId) -> Result<DocumentRef, DomainError> {
    Ok(CollectionPath::root(USERS).doc(DocumentId::new(user.as_str())?))
}

/// Handle currently recorded on `users/{userId}`.
pub async fn handle_of(
    store: &dyn DocumentStore,
    user: &UserId,
) -> Result<Option<Handle>, UsernameError> {
    let doc = store.get(&user_ref(user)?).await?;
    Ok(doc
        .as_ref()
        .and_then(|d| d.get_str(USERNAME))
        .and_then(|raw| Handle::new(raw).ok()))
}

enum Attempt {
    Claimed,
    Taken,
    Raced,
}

pub struct ClaimUsername {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn ClockPort>,
    max_suffix: u32,
}

impl ClaimUsername {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn ClockPort>) -> Self {
        Self {
            store,
            clock,
            max_suffix: MAX_SUFFIX,
        }
    }

    pub fn with_max_suffix(mut self, max_suffix: u32) -> Self {
        self.max_suffix = max_suffix;
        self
    }

    /// Claim `desired` (normalized) or the first free `desired{n}`.
    ///
    /// Claiming releases the member's previous handle. Re-claiming the
    /// handle already held is a no-op.
    pub async fn execute(
        &self,
        user: &UserId,
        desired: &str,
    ) -> Result<ClaimedHandle, UsernameError> {
        let base = Handle::normalize(desired)?;
        let candidates =
            std::iter::once(base.clone()).chain((2..=self.max_suffix).map(|n| base.with_suffix(n)));

        for candidate in candidates {
            let disambiguated = candidate != base;
            for _ in 0..ATTEMPTS_PER_CANDIDATE {
                match self.try_claim(user, &candidate).await? {
                    Attempt::Claimed => {
                        tracing::info!(user_id = %user, handle = %candidate, disambiguated, "Handle claimed");
                        return Ok(ClaimedHandle {
                            handle: candidate,
                            disambiguated,
                        });
                    }
                    Attempt::Taken => break,
                    Attempt::Raced => {
                        tracing::debug!(user_id = %user, handle = %candidate, "Handle claim raced, re-reading");
                    }
                }
            }
            if self.is_taken_by_other(user, &candidate).await? {
                continue;
            }
            return Err(UsernameError::Conflict);
        }

        tracing::warn!(user_id = %user, base = %base, "No free handle variant");
        Err(UsernameError::Exhausted(base))
    }

    async fn is_taken_by_other(&self, user: &UserId, handle: &Handle) -> Result<bool, UsernameError> {
        let owner = self
            .store
            .get(&handle_ref(handle)?)
            .await?
            .and_then(|doc| doc.get_str(USER_ID).map(str::to_string));
        Ok(owner.is_some_and(|owner| owner != user.as_str()))
    }

    async fn try_claim(&self, user: &UserId, candidate: &Handle) -> Result<Attempt, UsernameError> {
        let current = handle_of(self.store.as_ref(), user).await?;
        if current.as_ref() == Some(candidate) {
            return Ok(Attempt::Claimed);
        }

        let candidate_ref = handle_ref(candidate)?;
        let holder = self.store.get(&candidate_ref).await?;
        let held_by_me = match holder.as_ref().and_then(|doc| doc.get_str(USER_ID)) {
            Some(owner) if owner == user.as_str() => true,
            Some(_) => return Ok(Attempt::Taken),
            None => false,
        };

        let user_ref = user_ref(user)?;
        let now = millis(self.clock.now());
        let mut batch = WriteBatch::new().require(Precondition::FieldEquals {
            doc: user_ref.clone(),
            field: USERNAME.to_string(),
            value: current.as_ref().map(|h| Value::from(h.as_str())),
        });

        if held_by_me {
            batch = batch.require(Precondition::FieldEquals {
                doc: candidate_ref.clone(),
                field: USER_ID.to_string(),
                value: Some(Value::from(user.as_str())),
            });
        } else {
            let mut claim = Fields::new();
            claim.insert(USER_ID.into(), Value::from(user.as_str()));
            claim.insert(CLAIMED_AT.into(), now);
            batch = batch
                .require(Precondition::Absent(candidate_ref.clone()))
                .set(candidate_ref, claim);
        }

        let mut profile = Fields::new();
        profile.insert(USERNAME.into(), Value::from(candidate.as_str()));
        batch = batch.merge(user_ref, profile);

        if let Some(old) = current {
            let old_ref = handle_ref(&old)?;
            let still_mine = self
                .store
                .get(&old_ref)
                .await?
                .is_some_and(|doc| doc.get_str(USER_ID) == Some(user.as_str()));
            if still_mine {
                batch = batch
                    .require(Precondition::FieldEquals {
                        doc: old_ref.clone(),
                        field: USER_ID.to_string(),
                        value: Some(Value::from(user.as_str())),
                    })
                    .delete(old_ref);
            }
        }

        match self.store.commit(batch).await {
            Ok(()) => Ok(Attempt::Claimed),
            Err(StoreError::PreconditionFailed(_)) => Ok(Attempt::Raced),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::{FixedClock, SequentialRandom};
    use crate::infrastructure::memory_store::InMemoryDocumentStore;
    use chrono::{TimeZone, Utc};

    fn setup() -> (Arc<InMemoryDocumentStore>, ClaimUsername) {
        let store = Arc::new(InMemoryDocumentStore::new(Arc::new(
            SequentialRandom::default(),
        )));
        let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()));
        (store.clone(), ClaimUsername::new(store, clock))
    }

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    async fn owner_of(store: &InMemoryDocumentStore, handle: &str) -> Option<String> {
        store
            .get(&handle_ref(&Handle::new(handle).unwrap()).unwrap())
            .await
            .unwrap()
            .and_then(|doc| doc.get_str(USER_ID).map(str::to_string))
    }

    #[tokio::test]
    async fn concurrent_claims_get_distinct_handles() {
        let (store, claim) = setup();
        let (u1, u2) = (user("u1"), user("u2"));
        let (a, b) = tokio::join!(
            claim.execute(&u1, "DJ Nova"),
            claim.execute(&u2, "dj nova"),
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_ne!(a.handle, b.handle);
        let mut handles = vec![a.handle.to_string(), b.handle.to_string()];
        handles.sort();
        assert_eq!(handles, vec!["dj_nova", "dj_nova2"]);
        assert_eq!(a.disambiguated, a.handle.as_str() == "dj_nova2");

        let base_owner = owner_of(&store, "dj_nova").await.unwrap();
        let suffixed_owner = owner_of(&store, "dj_nova2").await.unwrap();
        assert_ne!(base_owner, suffixed_owner);
    }

    #[tokio::test]
    async fn reclaiming_own_handle_is_a_no_op() {
        let (_, claim) = setup();
        let first = claim.execute(&user("u1"), "nova").await.unwrap();
        let again = claim.execute(&user("u1"), "Nova").await.unwrap();
        assert_eq!(first, again);
        assert!(!again.disambiguated);
    }

    #[tokio::test]
    async fn renaming_releases_the_old_handle() {
        let (store, claim) = setup();
        claim.execute(&user("u1"), "nova").await.unwrap();
        claim.execute(&user("u1"), "stellar").await.unwrap();

        assert_eq!(owner_of(&store, "nova").await, None);
        assert_eq!(owner_of(&store, "stellar").await.as_deref(), Some("u1"));
        assert_eq!(
            handle_of(store.as_ref(), &user("u1")).await.unwrap(),
            Some(Handle::new("stellar").unwrap())
        );

        let other = claim.execute(&user("u2"), "nova").await.unwrap();
        assert!(!other.disambiguated);
    }

    #[tokio::test]
    async fn runs_out_of_variants() {
        let (_, claim) = setup();
        let claim = claim.with_max_suffix(2);
        claim.execute(&user("u1"), "echo").await.unwrap();
        claim.execute(&user("u2"), "echo").await.unwrap();
        let err = claim.execute(&user("u3"), "echo").await.unwrap_err();
        assert!(matches!(err, UsernameError::Exhausted(ref h) if h.as_str() == "echo"));
    }

    #[tokio::test]
    async fn unusable_input_is_rejected() {
        let (_, claim) = setup();
        let err = claim.execute(&user("u1"), "!!").await.unwrap_err();
        assert!(matches!(err, UsernameError::Invalid(_)));
    }
}
