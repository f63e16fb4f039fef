//! Domain entities.

pub mod feed_item;
pub mod post;
pub mod session;

pub use feed_item::FeedItem;
pub use post::{CommentBody, PostContent, PostDraft};
pub use session::Session;
