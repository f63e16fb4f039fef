//! Feed filter tuple.
//!
//! `category` and `tag` shape the store query. `search` never reaches the
//! store; it narrows the already-reconciled list on the client side.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::common::none_if_blank;
use crate::value_objects::PageSize;

/// Sentinel accepted from clients for "no category filter".
pub const ALL_CATEGORIES: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "scope", content = "name")]
pub enum CategoryFilter {
    #[default]
    All,
    Named(String),
}

impl CategoryFilter {
    /// Blank input and `"all"` (any case) both mean no filter.
    pub fn parse(input: Option<&str>) -> Self {
        match input.and_then(none_if_blank) {
            Some(name) if name.eq_ignore_ascii_case(ALL_CATEGORIES) => CategoryFilter::All,
            Some(name) => CategoryFilter::Named(name.to_lowercase()),
            None => CategoryFilter::All,
        }
    }

    pub fn as_named(&self) -> Option<&str> {
        match self {
            CategoryFilter::All => None,
            CategoryFilter::Named(name) => Some(name),
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str(ALL_CATEGORIES),
            CategoryFilter::Named(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedFilter {
    pub category: CategoryFilter,
    pub tag: Option<String>,
    pub page_size: PageSize,
    pub search: Option<String>,
}

impl FeedFilter {
    pub fn new(page_size: PageSize) -> Self {
        Self {
            category: CategoryFilter::All,
            tag: None,
            page_size,
            search: None,
        }
    }

    pub fn with_category(mut self, category: CategoryFilter) -> Self {
        self.category = category;
        self
    }

    pub fn with_tag(mut self, tag: Option<&str>) -> Self {
        self.tag = tag.and_then(none_if_blank).map(str::to_string);
        self
    }

    pub fn with_search(mut self, search: Option<&str>) -> Self {
        self.search = search.and_then(none_if_blank).map(str::to_lowercase);
        self
    }

    /// True when both filters would produce the same store query, so
    /// cursors from one remain valid for the other. Page size and search
    /// text do not affect the query shape.
    pub fn same_query_shape(&self, other: &FeedFilter) -> bool {
        self.category == other.category && self.tag == other.tag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_and_blank_mean_no_category() {
        assert_eq!(CategoryFilter::parse(Some("ALL")), CategoryFilter::All);
        assert_eq!(CategoryFilter::parse(Some("   ")), CategoryFilter::All);
        assert_eq!(CategoryFilter::parse(None), CategoryFilter::All);
        assert_eq!(
            CategoryFilter::parse(Some(" Jazz ")),
            CategoryFilter::Named("jazz".into())
        );
    }

    #[test]
    fn search_and_page_size_do_not_change_shape() {
        let base = FeedFilter::new(PageSize::clamped(12))
            .with_category(CategoryFilter::Named("jazz".into()));
        let searched = FeedFilter::new(PageSize::clamped(30))
            .with_category(CategoryFilter::Named("jazz".into()))
            .with_search(Some("Vinyl"));
        assert!(base.same_query_shape(&searched));
        assert_eq!(searched.search.as_deref(), Some("vinyl"));

        let tagged = base.clone().with_tag(Some("live"));
        assert!(!base.same_query_shape(&tagged));
    }
}
