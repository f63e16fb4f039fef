//! Live window over the first page of a feed query.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use townsquare_domain::PageSize;

use crate::infrastructure::ports::{
    Document, DocumentStore, StoreError, StoreQuery, SubscriptionId,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowState {
    pub items: Vec<Document>,
    /// `items.len() == page size`. A collection holding exactly one page
    /// reports `true`; the following extension comes back empty.
    pub has_more: bool,
}

/// Subscription to the first `page_size` results of a query.
///
/// Each snapshot replaces the state wholesale. The subscription is released
/// on [`LiveWindow::close`] or when the window is dropped.
pub struct LiveWindow {
    store: Arc<dyn DocumentStore>,
    subscription: SubscriptionId,
    snapshots: mpsc::UnboundedReceiver<Result<Vec<Document>, StoreError>>,
    page_size: usize,
    state: WindowState,
    closed: bool,
}

impl LiveWindow {
    /// Subscribe and wait for the initial snapshot.
    pub async fn open(
        store: Arc<dyn DocumentStore>,
        query: &StoreQuery,
        page_size: PageSize,
    ) -> Result<Self, StoreError> {
        let query = query.clone().limit(page_size.as_usize());
        let subscription = store.subscribe(&query).await?;
        let mut window = Self {
            store,
            subscription: subscription.id,
            snapshots: subscription.snapshots,
            page_size: page_size.as_usize(),
            state: WindowState::default(),
            closed: false,
        };
        window.changed().await?;
        tracing::debug!(
            subscription = window.subscription.0,
            collection = %query.collection,
            items = window.state.items.len(),
            has_more = window.state.has_more,
            "Live window opened"
        );
        Ok(window)
    }

    pub fn state(&self) -> &WindowState {
        &self.state
    }

    pub fn items(&self) -> &[Document] {
        &self.state.items
    }

    pub fn has_more(&self) -> bool {
        self.state.has_more
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn replace(&mut self, mut docs: Vec<Document>) {
        docs.truncate(self.page_size);
        let has_more = docs.len() == self.page_size;
        self.state = WindowState {
            items: docs,
            has_more,
        };
    }

    /// Wait for the next snapshot. Returns `Ok(false)` once the
    /// subscription has ended.
    pub async fn changed(&mut self) -> Result<bool, StoreError> {
        if self.closed {
            return Ok(false);
        }
        match self.snapshots.recv().await {
            Some(Ok(docs)) => {
                self.replace(docs);
                Ok(true)
            }
            Some(Err(e)) => Err(e),
            None => Ok(false),
        }
    }

    /// Apply every snapshot already delivered without waiting. Only the
    /// newest one matters since each replaces the whole window.
    pub fn drain_pending(&mut self) -> Result<bool, StoreError> {
        let mut latest = None;
        loop {
            match self.snapshots.try_recv() {
                Ok(Ok(docs)) => latest = Some(docs),
                Ok(Err(e)) => return Err(e),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        match latest {
            Some(docs) => {
                self.replace(docs);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Stop listening. Idempotent; the last state stays readable.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.store.unsubscribe(self.subscription);
        self.snapshots.close();
        tracing::debug!(subscription = self.subscription.0, "Live window closed");
    }
}

impl Drop for LiveWindow {
    fn drop(&mut self) {
        self.close();
    }
}
