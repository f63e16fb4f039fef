//! In-memory document store.
//!
//! A complete, process-local implementation of [`DocumentStore`]: ordered
//! queries, live snapshot listeners, cursor reads, atomic increments and
//! conditional write batches. It does not persist data and backs both the
//! development server and the test suite.
//!
//! Listeners are re-evaluated while the write lock is still held, so every
//! subscription observes snapshots in commit order.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use townsquare_domain::DocumentId;

use crate::infrastructure::ports::{
    field_at, set_field_at, CollectionPath, Cursor, Document, DocumentRef, DocumentStore, Fields,
    Precondition, RandomPort, StoreError, StoreQuery, Subscription, SubscriptionId, WriteBatch,
    WriteOp,
};

type Collections = BTreeMap<CollectionPath, BTreeMap<DocumentId, Fields>>;
type SnapshotSender = mpsc::UnboundedSender<Result<Vec<Document>, StoreError>>;

struct Listener {
    query: StoreQuery,
    sender: SnapshotSender,
    last: Vec<Document>,
}

pub struct InMemoryDocumentStore {
    collections: RwLock<Collections>,
    listeners: DashMap<SubscriptionId, Listener>,
    next_subscription: AtomicU64,
    random: Arc<dyn RandomPort>,
    offline: AtomicBool,
    failures_remaining: AtomicU32,
}

impl InMemoryDocumentStore {
    pub fn new(random: Arc<dyn RandomPort>) -> Self {
        Self {
            collections: RwLock::new(BTreeMap::new()),
            listeners: DashMap::new(),
            next_subscription: AtomicU64::new(1),
            random,
            offline: AtomicBool::new(false),
            failures_remaining: AtomicU32::new(0),
        }
    }

    /// While offline every operation fails with [`StoreError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Make the next `count` operations fail with [`StoreError::Unavailable`].
    pub fn fail_next(&self, count: u32) {
        self.failures_remaining.store(count, Ordering::SeqCst);
    }

    /// Number of live subscriptions.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn check_available(&self, operation: &'static str) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable(operation, "store is offline"));
        }
        let injected = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(StoreError::unavailable(operation, "injected failure"));
        }
        Ok(())
    }

    fn documents_in(collections: &Collections, path: &CollectionPath) -> Vec<Document> {
        collections
            .get(path)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Push fresh snapshots to listeners on the touched collections whose
    /// result set changed, and drop listeners whose receiver is gone.
    fn notify(&self, collections: &Collections, touched: &BTreeSet<CollectionPath>) {
        let mut closed = Vec::new();
        for mut entry in self.listeners.iter_mut() {
            let id = *entry.key();
            let listener = entry.value_mut();
            if !touched.contains(&listener.query.collection) {
                continue;
            }
            let snapshot = listener
                .query
                .evaluate(Self::documents_in(collections, &listener.query.collection), None);
            if snapshot == listener.last {
                continue;
            }
            if listener.sender.send(Ok(snapshot.clone())).is_err() {
                closed.push(id);
                continue;
            }
            listener.last = snapshot;
        }
        for id in closed {
            tracing::debug!(subscription = id.0, "Dropping listener with closed receiver");
            self.listeners.remove(&id);
        }
    }

    fn check_precondition(
        collections: &Collections,
        precondition: &Precondition,
    ) -> Result<(), StoreError> {
        let lookup = |doc: &DocumentRef| {
            collections
                .get(&doc.collection)
                .and_then(|docs| docs.get(&doc.id))
        };
        match precondition {
            Precondition::Exists(doc) => match lookup(doc) {
                Some(_) => Ok(()),
                None => Err(StoreError::precondition(format!("{} does not exist", doc))),
            },
            Precondition::Absent(doc) => match lookup(doc) {
                Some(_) => Err(StoreError::precondition(format!("{} already exists", doc))),
                None => Ok(()),
            },
            Precondition::FieldEquals { doc, field, value } => {
                let actual = lookup(doc).and_then(|fields| field_at(fields, field));
                if actual == value.as_ref() {
                    Ok(())
                } else {
                    Err(StoreError::precondition(format!(
                        "{}.{} changed concurrently",
                        doc, field
                    )))
                }
            }
        }
    }

    fn apply(collections: &mut Collections, op: WriteOp) -> Result<CollectionPath, StoreError> {
        match op {
            WriteOp::Set { doc, fields, merge } => {
                let docs = collections.entry(doc.collection.clone()).or_default();
                if merge {
                    if let Some(existing) = docs.get_mut(&doc.id) {
                        merge_into(existing, fields);
                        return Ok(doc.collection);
                    }
                }
                docs.insert(doc.id.clone(), fields);
                Ok(doc.collection)
            }
            WriteOp::Update { doc, fields } => {
                let existing = collections
                    .get_mut(&doc.collection)
                    .and_then(|docs| docs.get_mut(&doc.id))
                    .ok_or_else(|| StoreError::not_found(&doc))?;
                for (path, value) in fields {
                    set_field_at(existing, &path, value);
                }
                Ok(doc.collection)
            }
            WriteOp::Delete(doc) => {
                if let Some(docs) = collections.get_mut(&doc.collection) {
                    docs.remove(&doc.id);
                }
                Ok(doc.collection)
            }
            WriteOp::Increment { doc, field, delta } => {
                let existing = collections
                    .get_mut(&doc.collection)
                    .and_then(|docs| docs.get_mut(&doc.id))
                    .ok_or_else(|| StoreError::not_found(&doc))?;
                let current = field_at(existing, &field)
                    .and_then(Value::as_i64)
                    .unwrap_or(0);
                set_field_at(existing, &field, Value::from(current.saturating_add(delta)));
                Ok(doc.collection)
            }
        }
    }

    /// Apply `ops` atomically, then notify listeners.
    async fn write(
        &self,
        preconditions: &[Precondition],
        ops: Vec<WriteOp>,
    ) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        for precondition in preconditions {
            Self::check_precondition(&collections, precondition)?;
        }

        let mut staged = if ops.len() > 1 {
            Some(collections.clone())
        } else {
            None
        };
        let mut touched = BTreeSet::new();
        for op in ops {
            let target = match staged.as_mut() {
                Some(copy) => copy,
                None => &mut *collections,
            };
            touched.insert(Self::apply(target, op)?);
        }
        if let Some(copy) = staged {
            *collections = copy;
        }

        self.notify(&collections, &touched);
        Ok(())
    }
}

/// Deep merge: nested maps merge key by key, everything else overwrites.
fn merge_into(target: &mut Fields, source: Fields) {
    for (key, value) in source {
        match value {
            Value::Object(incoming) => {
                if let Some(Value::Object(existing)) = target.get_mut(&key) {
                    merge_into(existing, incoming);
                } else {
                    target.insert(key, Value::Object(incoming));
                }
            }
            value => {
                target.insert(key, value);
            }
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, doc: &DocumentRef) -> Result<Option<Document>, StoreError> {
        self.check_available("get")?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(&doc.collection)
            .and_then(|docs| docs.get(&doc.id))
            .map(|fields| Document::new(doc.id.clone(), fields.clone())))
    }

    async fn query(
        &self,
        query: &StoreQuery,
        after: Option<Cursor>,
    ) -> Result<Vec<Document>, StoreError> {
        self.check_available("query")?;
        if let Some(cursor) = &after {
            query.check_cursor(cursor)?;
        }
        let collections = self.collections.read().await;
        Ok(query.evaluate(
            Self::documents_in(&collections, &query.collection),
            after.as_ref(),
        ))
    }

    async fn subscribe(&self, query: &StoreQuery) -> Result<Subscription, StoreError> {
        self.check_available("subscribe")?;
        let (sender, snapshots) = mpsc::unbounded_channel();
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::SeqCst));

        // Hold the read lock until the listener is registered so no write
        // can land between the initial snapshot and registration.
        let collections = self.collections.read().await;
        let initial = query.evaluate(Self::documents_in(&collections, &query.collection), None);
        // The receiver is still in scope, so this send cannot fail.
        let _ = sender.send(Ok(initial.clone()));
        self.listeners.insert(
            id,
            Listener {
                query: query.clone(),
                sender,
                last: initial,
            },
        );
        drop(collections);

        tracing::debug!(
            subscription = id.0,
            collection = %query.collection,
            "Listener registered"
        );
        Ok(Subscription { id, snapshots })
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        if self.listeners.remove(&id).is_some() {
            tracing::debug!(subscription = id.0, "Listener removed");
        }
    }

    async fn create(
        &self,
        collection: &CollectionPath,
        fields: Fields,
    ) -> Result<DocumentId, StoreError> {
        self.check_available("create")?;
        let id = DocumentId::new(self.random.gen_document_id())
            .map_err(|e| StoreError::serialization(e.to_string()))?;
        let op = WriteOp::Set {
            doc: collection.doc(id.clone()),
            fields,
            merge: false,
        };
        self.write(&[], vec![op]).await?;
        Ok(id)
    }

    async fn set(&self, doc: &DocumentRef, fields: Fields, merge: bool) -> Result<(), StoreError> {
        self.check_available("set")?;
        let op = WriteOp::Set {
            doc: doc.clone(),
            fields,
            merge,
        };
        self.write(&[], vec![op]).await
    }

    async fn update(&self, doc: &DocumentRef, fields: Fields) -> Result<(), StoreError> {
        self.check_available("update")?;
        let op = WriteOp::Update {
            doc: doc.clone(),
            fields,
        };
        self.write(&[], vec![op]).await
    }

    async fn delete(&self, doc: &DocumentRef) -> Result<(), StoreError> {
        self.check_available("delete")?;
        self.write(&[], vec![WriteOp::Delete(doc.clone())]).await
    }

    async fn increment(
        &self,
        doc: &DocumentRef,
        field: &str,
        delta: i64,
    ) -> Result<(), StoreError> {
        self.check_available("increment")?;
        let op = WriteOp::Increment {
            doc: doc.clone(),
            field: field.to_string(),
            delta,
        };
        self.write(&[], vec![op]).await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        self.check_available("commit")?;
        self.write(&batch.preconditions, batch.writes).await
    }
}
