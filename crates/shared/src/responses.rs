//! Response payloads and the error envelope.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use townsquare_domain::ReactionKind;

// =============================================================================
// Feeds
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedItemData {
    pub id: String,
    pub created_at: String,
    pub last_activity_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub author_id: String,
    #[serde(default)]
    pub payload: Map<String, Value>,
    pub reply_count: i64,
    pub view_count: i64,
    #[serde(default)]
    pub reaction_counts: BTreeMap<ReactionKind, i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedPageResponse {
    pub items: Vec<FeedItemData>,
    /// Pass back as `cursor` to fetch the following page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentData {
    pub id: String,
    pub author_id: String,
    pub body: String,
    pub created_at: String,
}

// =============================================================================
// Reactions, usernames, presence
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionResponse {
    /// The caller's reaction after the toggle; `None` when it was removed.
    pub reaction: Option<ReactionKind>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimUsernameResponse {
    pub handle: String,
    /// True when the requested base handle was taken and a suffix was added.
    pub disambiguated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceViewerData {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    pub last_seen: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceResponse {
    pub page: String,
    pub viewers: Vec<PresenceViewerData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// Background writes that exhausted their retries since startup.
    pub degraded_writes: u64,
}

// =============================================================================
// Error Codes
// =============================================================================

/// Error classification codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // === Client Errors (4xx) ===
    /// Request was malformed or invalid
    BadRequest,
    /// Sign-in required
    Unauthorized,
    /// User lacks permission for this operation
    Forbidden,
    /// Requested resource not found (or vanished)
    NotFound,
    /// Operation conflicts with current state
    Conflict,
    /// Request data failed validation
    ValidationError,

    // === Server Errors (5xx) ===
    /// Internal server error
    InternalError,
    /// The document store is unavailable
    ServiceUnavailable,

    /// Unknown variant for forward compatibility
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
