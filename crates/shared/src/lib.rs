//! Townsquare wire types.
//!
//! Types shared by the engine and any client of its REST API or live feed
//! socket:
//! - Request bodies
//! - Response payloads and error envelopes
//! - Live feed socket messages
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - only serde, serde_json and domain vocabulary enums
//! 2. **No business logic** - pure data types and serialization
//! 3. **No domain IDs** - ids travel as plain strings, timestamps as RFC 3339

pub mod messages;
pub mod requests;
pub mod responses;

pub use messages::{ClientFeedMessage, LiveFeedMessage};
pub use requests::{
    ClaimUsernameRequest, CreateCommentRequest, CreatePostRequest, FeedPageParams,
    LiveFeedParams, ReactionRequest,
};
pub use responses::{
    ClaimUsernameResponse, CommentData, CreatedResponse, ErrorCode, ErrorResponse, FeedItemData,
    FeedPageResponse, HealthResponse, PresenceResponse, PresenceViewerData, ReactionResponse,
};

// Re-export shared vocabulary types from the domain crate
pub use townsquare_domain::{FeedKind, ReactionKind};
