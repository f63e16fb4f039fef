//! Live paginated feeds.
//!
//! - [`FeedQueryBuilder`] turns a filter tuple into a store query
//! - [`LiveWindow`] keeps the first page current through a subscription
//! - [`PaginationExtender`] reads page 2+ after a cursor
//! - [`reconcile`] merges both into one ordered, duplicate-free list
//! - [`Feed`] owns all of the above for one mounted view

mod controller;
mod extender;
mod listing;
mod live_window;
mod query_builder;
mod reconcile;


use std::sync::Arc;

pub use controller::{Feed, FeedError, LoadOutcome, PageRequest};
pub use extender::{Page, PaginationExtender};
pub use listing::{FeaturedItems, FeedPage, ListFeedPage};
pub use live_window::{LiveWindow, WindowState};
pub use query_builder::FeedQueryBuilder;
pub use reconcile::{reconcile, reconcile_documents};

/// Container for feed use cases.
pub struct FeedUseCases {
    pub list_page: Arc<ListFeedPage>,
    pub featured: Arc<FeaturedItems>,
}

impl FeedUseCases {
    pub fn new(list_page: Arc<ListFeedPage>, featured: Arc<FeaturedItems>) -> Self {
        Self {
            list_page,
            featured,
        }
    }
}
