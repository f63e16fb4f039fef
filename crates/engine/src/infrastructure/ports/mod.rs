//! Port traits for infrastructure boundaries.
//!
//! Ports exist for:
//! - The managed document store (the in-memory adapter stands in for it)
//! - Clock/Random (for testing)

mod error;
mod query;
mod store;
mod testing;

pub use error::StoreError;
pub use query::{
    compare_values, field_at, set_field_at, CollectionPath, Cursor, Direction, Document,
    DocumentRef, FieldFilter, Fields, OrderBy, Precondition, StoreQuery, WriteBatch, WriteOp,
};
pub use store::{DocumentStore, Subscription, SubscriptionId};
pub use testing::{ClockPort, RandomPort};

#[cfg(test)]
pub use store::MockDocumentStore;
#[cfg(test)]
pub use testing::MockClockPort;
