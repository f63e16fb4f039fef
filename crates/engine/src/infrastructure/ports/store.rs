//! The document store port.

use async_trait::async_trait;
use tokio::sync::mpsc;
use townsquare_domain::DocumentId;

use super::error::StoreError;
use super::query::{CollectionPath, Cursor, Document, DocumentRef, Fields, StoreQuery, WriteBatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Live query listener.
///
/// The first message is the current result set; every later message is the
/// complete result set after a change. Messages arrive in emission order.
/// Dropping the receiver or calling [`DocumentStore::unsubscribe`] ends the
/// subscription.
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub snapshots: mpsc::UnboundedReceiver<Result<Vec<Document>, StoreError>>,
}

/// Managed document store: ordered collections, live queries, cursor
/// pagination, atomic increments and conditional write batches.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, doc: &DocumentRef) -> Result<Option<Document>, StoreError>;

    /// One-shot read, resuming strictly after `after` when given.
    ///
    /// Fails with [`StoreError::CursorMismatch`] when the cursor was produced
    /// by a query of a different shape.
    async fn query(
        &self,
        query: &StoreQuery,
        after: Option<Cursor>,
    ) -> Result<Vec<Document>, StoreError>;

    async fn subscribe(&self, query: &StoreQuery) -> Result<Subscription, StoreError>;

    /// Idempotent.
    fn unsubscribe(&self, id: SubscriptionId);

    /// Create a document with a store-assigned id.
    async fn create(
        &self,
        collection: &CollectionPath,
        fields: Fields,
    ) -> Result<DocumentId, StoreError>;

    /// Replace the document, or with `merge` overwrite only the given fields.
    async fn set(&self, doc: &DocumentRef, fields: Fields, merge: bool) -> Result<(), StoreError>;

    /// Overwrite the given (dotted) fields of an existing document.
    async fn update(&self, doc: &DocumentRef, fields: Fields) -> Result<(), StoreError>;

    /// Deleting a missing document succeeds. Sub-collections are left alone.
    async fn delete(&self, doc: &DocumentRef) -> Result<(), StoreError>;

    /// Atomic add on a numeric (dotted) field of an existing document.
    /// A missing field counts as zero.
    async fn increment(&self, doc: &DocumentRef, field: &str, delta: i64)
        -> Result<(), StoreError>;

    /// Apply every write or none. Fails with
    /// [`StoreError::PreconditionFailed`] when a precondition does not hold.
    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;
}
