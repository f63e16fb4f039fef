//! Use cases: the feed core plus the content, reaction, handle and
//! presence operations built on the document store port.

pub mod content;
pub mod feed;
pub mod presence;
pub mod reactions;
pub mod usernames;

use std::sync::Arc;

pub use content::{ContentUseCases, PostError};
pub use feed::{FeedError, FeedUseCases};
pub use presence::{PresenceError, PresenceUseCases};
pub use reactions::{ReactionError, ToggleReaction};
pub use usernames::{ClaimUsername, UsernameError};

/// Every use case the API layer can reach.
pub struct UseCases {
    pub feed: FeedUseCases,
    pub content: ContentUseCases,
    pub toggle_reaction: Arc<ToggleReaction>,
    pub claim_username: Arc<ClaimUsername>,
    pub presence: PresenceUseCases,
}
