//! Request bodies and query strings.

use serde::{Deserialize, Serialize};
use townsquare_domain::ReactionKind;

/// Query string for `GET /api/feeds/{kind}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedPageParams {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub page_size: Option<u32>,
    /// Opaque token from a previous page's `next_cursor`.
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

/// Query string for `GET /ws/feeds/{kind}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LiveFeedParams {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub price_cents: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionRequest {
    pub kind: ReactionKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimUsernameRequest {
    /// Free-form; the server normalizes it into a handle.
    pub desired: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_request_tolerates_missing_fields() {
        let req: CreatePostRequest = serde_json::from_str(r#"{"body":"hi"}"#).unwrap();
        assert_eq!(req.body.as_deref(), Some("hi"));
        assert!(req.tags.is_empty());
        assert!(req.price_cents.is_none());
    }

    #[test]
    fn reaction_request_uses_snake_case() {
        let req: ReactionRequest = serde_json::from_str(r#"{"kind":"heart"}"#).unwrap();
        assert_eq!(req.kind, ReactionKind::Heart);
    }
}
