//! Feed item - the shape shared by threads, stories, products, shouts and
//! confessions.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ids::{DocumentId, UserId};
use crate::value_objects::ReactionKind;

/// Payload keys searched by the client-side text filter.
const SEARCHABLE_FIELDS: [&str; 3] = ["title", "body", "text"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub id: DocumentId,
    /// Assigned once at creation.
    pub created_at: DateTime<Utc>,
    /// Secondary activity time. Equals `created_at` until bumped by a reply.
    pub last_activity_at: DateTime<Utc>,
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub author_id: UserId,
    #[serde(default)]
    pub payload: Map<String, Value>,
    #[serde(default)]
    pub reply_count: i64,
    #[serde(default)]
    pub view_count: i64,
    #[serde(default)]
    pub reaction_counts: BTreeMap<ReactionKind, i64>,
}

impl FeedItem {
    pub fn title(&self) -> Option<&str> {
        self.payload.get("title").and_then(Value::as_str)
    }

    /// Case-insensitive substring match against the searchable payload
    /// fields. `needle` must already be lowercase.
    pub fn matches_search(&self, needle: &str) -> bool {
        SEARCHABLE_FIELDS.iter().any(|field| {
            self.payload
                .get(*field)
                .and_then(Value::as_str)
                .is_some_and(|text| text.to_lowercase().contains(needle))
        })
    }

    pub fn is_authored_by(&self, user_id: &UserId) -> bool {
        &self.author_id == user_id
    }

    pub fn total_reactions(&self) -> i64 {
        self.reaction_counts.values().sum()
    }
}
