//! Story reactions: one reaction document per member per story.
//!
//! [`ToggleReaction`] is the server-side write. [`ReactionBar`] is the
//! optimistic view a client keeps for one story: apply a press locally,
//! send it, and roll it back only when the toggle returns an error.

mod bar;
mod toggle;


pub use bar::ReactionBar;
pub use toggle::{ToggleReaction, MAX_TOGGLE_ATTEMPTS};

use townsquare_domain::DomainError;

use crate::infrastructure::ports::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ReactionError {
    #[error("Story not found: {0}")]
    StoryNotFound(String),
    #[error("Reaction changed concurrently, try again")]
    Conflict,
    #[error(transparent)]
    Validation(#[from] DomainError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
