//! Feed query builder.
//!
//! Turns a filter tuple into a store query. The same tuple always yields a
//! query of the same shape, so a cursor taken from one page stays valid
//! for the next.

use townsquare_domain::{CategoryFilter, FeedFilter, FeedKind};

use crate::infrastructure::documents::{
    CATEGORY, CREATED_AT, LAST_ACTIVITY_AT, REPLY_COUNT, TAGS,
};
use crate::infrastructure::ports::{CollectionPath, Direction, FieldFilter, StoreQuery};

#[derive(Debug, Clone)]
pub struct FeedQueryBuilder {
    collection: CollectionPath,
}

impl FeedQueryBuilder {
    pub fn new(kind: FeedKind) -> Self {
        Self {
            collection: CollectionPath::root(kind.collection()),
        }
    }

    /// Newest activity first, ties broken by creation time. Category and
    /// tag filters are conjunctive.
    pub fn build(&self, filter: &FeedFilter) -> StoreQuery {
        let mut query = StoreQuery::new(self.collection.clone())
            .order_by(LAST_ACTIVITY_AT, Direction::Desc)
            .order_by(CREATED_AT, Direction::Desc)
            .limit(filter.page_size.as_usize());
        if let Some(category) = filter.category.as_named() {
            query = query.filter(FieldFilter::eq(CATEGORY, category));
        }
        if let Some(tag) = &filter.tag {
            query = query.filter(FieldFilter::array_contains(TAGS, tag.as_str()));
        }
        query
    }

    /// Most-replied items for the side widget.
    pub fn featured(&self, category: &CategoryFilter, limit: usize) -> StoreQuery {
        let mut query = StoreQuery::new(self.collection.clone())
            .order_by(REPLY_COUNT, Direction::Desc)
            .order_by(CREATED_AT, Direction::Desc)
            .limit(limit);
        if let Some(category) = category.as_named() {
            query = query.filter(FieldFilter::eq(CATEGORY, category));
        }
        query
    }
}
