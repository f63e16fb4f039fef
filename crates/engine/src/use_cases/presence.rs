//! Page presence: who is looking at a page right now.
//!
//! Each viewer owns one document `page_presence/{page}__{userId}` that is
//! refreshed by heartbeats. Viewers whose last heartbeat is older than the
//! presence TTL are simply not returned; nothing sweeps stale documents.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use townsquare_domain::common::{from_millis, to_millis};
use townsquare_domain::{DocumentId, DomainError, Handle, PresenceTtl, Session, UserId};

use crate::infrastructure::documents::{millis, HANDLE, LAST_SEEN, PAGE, PAGE_PRESENCE, USER_ID};
use crate::infrastructure::ports::{
    ClockPort, CollectionPath, Direction, Document, DocumentRef, DocumentStore, FieldFilter,
    Fields, StoreError, StoreQuery, WriteBatch,
};
use crate::infrastructure::resilient_writes::{ResilientWriter, WriteOutcome};

const MAX_PAGE_KEY_LENGTH: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum PresenceError {
    #[error(transparent)]
    InvalidPage(#[from] DomainError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Validated page key, e.g. `forum`, `station-kcrw`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageKey(String);

impl PageKey {
    pub fn new(raw: &str) -> Result<Self, DomainError> {
        let key = raw.trim();
        if key.is_empty() || key.len() > MAX_PAGE_KEY_LENGTH {
            return Err(DomainError::validation(format!(
                "Page key must be 1-{} characters",
                MAX_PAGE_KEY_LENGTH
            )));
        }
        if key.contains("__")
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
        {
            return Err(DomainError::validation(format!("Invalid page key: {}", key)));
        }
        Ok(Self(key.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Viewer {
    pub user_id: UserId,
    pub handle: Option<Handle>,
    pub last_seen: DateTime<Utc>,
}

impl Viewer {
    fn from_document(doc: &Document) -> Option<Self> {
        Some(Self {
            user_id: UserId::new(doc.get_str(USER_ID)?).ok()?,
            handle: doc.get_str(HANDLE).and_then(|h| Handle::new(h).ok()),
            last_seen: doc.get_i64(LAST_SEEN).and_then(from_millis)?,
        })
    }
}

fn presence_ref(page: &PageKey, user: &UserId) -> Result<DocumentRef, DomainError> {
    let id = DocumentId::new(format!("{}__{}", page.as_str(), user))?;
    Ok(CollectionPath::root(PAGE_PRESENCE).doc(id))
}

/// Record that the member is on `page`.
pub struct Heartbeat {
    writer: Arc<ResilientWriter>,
    clock: Arc<dyn ClockPort>,
}

impl Heartbeat {
    pub fn new(writer: Arc<ResilientWriter>, clock: Arc<dyn ClockPort>) -> Self {
        Self { writer, clock }
    }

    pub async fn execute(&self, session: &Session, page: &PageKey) -> Result<WriteOutcome, PresenceError> {
        let doc = presence_ref(page, &session.user_id)?;
        let mut fields = Fields::new();
        fields.insert(PAGE.into(), Value::from(page.as_str()));
        fields.insert(USER_ID.into(), Value::from(session.user_id.as_str()));
        if let Some(handle) = &session.handle {
            fields.insert(HANDLE.into(), Value::from(handle.as_str()));
        }
        fields.insert(LAST_SEEN.into(), millis(self.clock.now()));

        Ok(self
            .writer
            .commit("presence_heartbeat", WriteBatch::new().merge(doc, fields))
            .await)
    }
}

/// Drop the member's presence on `page`.
pub struct LeavePage {
    writer: Arc<ResilientWriter>,
}

impl LeavePage {
    pub fn new(writer: Arc<ResilientWriter>) -> Self {
        Self { writer }
    }

    pub async fn execute(&self, session: &Session, page: &PageKey) -> Result<WriteOutcome, PresenceError> {
        let doc = presence_ref(page, &session.user_id)?;
        Ok(self
            .writer
            .commit("presence_leave", WriteBatch::new().delete(doc))
            .await)
    }
}

/// Viewers seen on a page within the TTL, most recent first.
pub struct ActiveViewers {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn ClockPort>,
    ttl: PresenceTtl,
}

impl ActiveViewers {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn ClockPort>, ttl: PresenceTtl) -> Self {
        Self { store, clock, ttl }
    }

    pub async fn execute(&self, page: &PageKey) -> Result<Vec<Viewer>, PresenceError> {
        let cutoff = to_millis(self.ttl.cutoff(self.clock.now()));
        let query = StoreQuery::new(CollectionPath::root(PAGE_PRESENCE))
            .filter(FieldFilter::eq(PAGE, page.as_str()))
            .filter(FieldFilter::gte(LAST_SEEN, cutoff))
            .order_by(LAST_SEEN, Direction::Desc);
        let docs = self.store.query(&query, None).await?;
        Ok(docs.iter().filter_map(Viewer::from_document).collect())
    }
}

/// Container for presence use cases.
pub struct PresenceUseCases {
    pub heartbeat: Arc<Heartbeat>,
    pub leave: Arc<LeavePage>,
    pub viewers: Arc<ActiveViewers>,
}

impl PresenceUseCases {
    pub fn new(heartbeat: Arc<Heartbeat>, leave: Arc<LeavePage>, viewers: Arc<ActiveViewers>) -> Self {
        Self {
            heartbeat,
            leave,
            viewers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::SequentialRandom;
    use crate::infrastructure::memory_store::InMemoryDocumentStore;
    use crate::infrastructure::ports::MockClockPort;
    use crate::infrastructure::resilient_writes::{RetryConfig, WriteHealth};
    use chrono::{Duration, TimeZone};
    use std::sync::Mutex;

    struct SteppingClock(Mutex<DateTime<Utc>>);

    impl SteppingClock {
        fn advance(&self, seconds: i64) {
            if let Ok(mut now) = self.0.lock() {
                *now += Duration::seconds(seconds);
            }
        }
    }

    impl ClockPort for SteppingClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    struct Fixture {
        clock: Arc<SteppingClock>,
        heartbeat: Heartbeat,
        leave: LeavePage,
        viewers: ActiveViewers,
    }

    fn fixture() -> Fixture {
        let random = Arc::new(SequentialRandom::default());
        let store = Arc::new(InMemoryDocumentStore::new(random.clone()));
        let clock = Arc::new(SteppingClock(Mutex::new(
            Utc.with_ymd_and_hms(2025, 7, 1, 20, 0, 0).unwrap(),
        )));
        let writer = Arc::new(ResilientWriter::new(
            store.clone(),
            random,
            RetryConfig::default(),
            Arc::new(WriteHealth::new()),
        ));
        Fixture {
            heartbeat: Heartbeat::new(writer.clone(), clock.clone()),
            leave: LeavePage::new(writer),
            viewers: ActiveViewers::new(store, clock.clone(), PresenceTtl::new(60).unwrap()),
            clock,
        }
    }

    fn member(id: &str, handle: Option<&str>) -> Session {
        Session::member(UserId::new(id).unwrap())
            .with_handle(handle.map(|h| Handle::new(h).unwrap()))
    }

    #[tokio::test]
    async fn viewers_expire_after_ttl() {
        let f = fixture();
        let page = PageKey::new("forum").unwrap();

        f.heartbeat.execute(&member("u1", Some("nova")), &page).await.unwrap();
        f.clock.advance(45);
        f.heartbeat.execute(&member("u2", None), &page).await.unwrap();

        let viewers = f.viewers.execute(&page).await.unwrap();
        let ids: Vec<_> = viewers.iter().map(|v| v.user_id.to_string()).collect();
        assert_eq!(ids, vec!["u2", "u1"]);
        assert_eq!(viewers[1].handle.as_ref().map(Handle::as_str), Some("nova"));

        f.clock.advance(30);
        let viewers = f.viewers.execute(&page).await.unwrap();
        assert_eq!(viewers.len(), 1);
        assert_eq!(viewers[0].user_id.as_str(), "u2");
    }

    #[tokio::test]
    async fn presence_is_per_page_and_leave_removes_it() {
        let f = fixture();
        let forum = PageKey::new("forum").unwrap();
        let chat = PageKey::new("chat").unwrap();
        let session = member("u1", None);

        f.heartbeat.execute(&session, &forum).await.unwrap();
        f.heartbeat.execute(&session, &chat).await.unwrap();
        assert_eq!(f.viewers.execute(&forum).await.unwrap().len(), 1);

        let outcome = f.leave.execute(&session, &forum).await.unwrap();
        assert!(outcome.is_applied());
        assert!(f.viewers.execute(&forum).await.unwrap().is_empty());
        assert_eq!(f.viewers.execute(&chat).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn viewer_query_uses_cutoff() {
        let mut clock = MockClockPort::new();
        clock
            .expect_now()
            .returning(|| Utc.with_ymd_and_hms(2025, 7, 1, 20, 0, 0).unwrap());
        let mut store = crate::infrastructure::ports::MockDocumentStore::new();
        store
            .expect_query()
            .withf(|q, _| {
                q.filters.contains(&FieldFilter::gte(
                    LAST_SEEN,
                    to_millis(Utc.with_ymd_and_hms(2025, 7, 1, 19, 59, 0).unwrap()),
                ))
            })
            .times(1)
            .returning(|_, _| Ok(vec![]));

        let viewers = ActiveViewers::new(Arc::new(store), Arc::new(clock), PresenceTtl::new(60).unwrap());
        assert!(viewers
            .execute(&PageKey::new("forum").unwrap())
            .await
            .unwrap()
            .is_empty());
    }

    #[test]
    fn page_keys_are_validated() {
        assert!(PageKey::new("station-kcrw").is_ok());
        assert!(PageKey::new("").is_err());
        assert!(PageKey::new("a/b").is_err());
        assert!(PageKey::new("a__b").is_err());
    }
}
