//! Townsquare domain types.
//!
//! Pure types and invariants for the community feeds: ids, filters, page
//! sizes, handles, reactions and the feed item shape. No I/O.

extern crate self as townsquare_domain;

pub mod common;
pub mod entities;
pub mod error;
pub mod ids;
pub mod value_objects;

pub use entities::{CommentBody, FeedItem, PostContent, PostDraft, Session};
pub use error::DomainError;
pub use ids::{DocumentId, UserId};
pub use value_objects::{
    CategoryFilter, DeletePolicy, FeedFilter, FeedKind, Handle, PageSize, PresenceTtl,
    ReactionKind, ReactionTransition, ALL_CATEGORIES,
};
