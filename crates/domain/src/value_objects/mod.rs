//! Validated value objects.

pub mod feed_filter;
pub mod feed_kind;
pub mod handle;
pub mod page_size;
pub mod presence_ttl;
pub mod reaction;

pub use feed_filter::{CategoryFilter, FeedFilter, ALL_CATEGORIES};
pub use feed_kind::{DeletePolicy, FeedKind};
pub use handle::Handle;
pub use page_size::PageSize;
pub use presence_ttl::PresenceTtl;
pub use reaction::{ReactionKind, ReactionTransition};
