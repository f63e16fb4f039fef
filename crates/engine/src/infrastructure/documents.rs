//! Document field layout for feed items and their sub-collections.
//!
//! Timestamps are stored as epoch milliseconds so the store orders them
//! numerically.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use townsquare_domain::common::{from_millis, to_millis};
use townsquare_domain::{FeedItem, PostContent, ReactionKind, UserId};

use crate::infrastructure::ports::{Document, Fields, StoreError};

pub const CREATED_AT: &str = "createdAt";
pub const LAST_ACTIVITY_AT: &str = "lastActivityAt";
pub const CATEGORY: &str = "category";
pub const TAGS: &str = "tags";
pub const AUTHOR_ID: &str = "authorId";
pub const PAYLOAD: &str = "payload";
pub const REPLY_COUNT: &str = "replyCount";
pub const VIEW_COUNT: &str = "viewCount";
pub const REACTION_COUNTS: &str = "reactionCounts";

pub const COMMENTS: &str = "comments";
pub const REACTIONS: &str = "reactions";
pub const COMMENT_BODY: &str = "body";
pub const REACTION_KIND: &str = "kind";

pub const USERS: &str = "users";
pub const USERNAMES: &str = "usernames";
pub const USERNAME: &str = "username";
pub const USER_ID: &str = "userId";
pub const CLAIMED_AT: &str = "claimedAt";

pub const PAGE_PRESENCE: &str = "page_presence";
pub const PAGE: &str = "page";
pub const HANDLE: &str = "handle";
pub const LAST_SEEN: &str = "lastSeen";

/// `reactionCounts.heart`
pub fn reaction_counter(kind: ReactionKind) -> String {
    format!("{}.{}", REACTION_COUNTS, kind)
}

pub fn millis(at: DateTime<Utc>) -> Value {
    Value::from(to_millis(at))
}

/// Fields of a freshly published item. Both timestamps start equal.
pub fn new_item_fields(content: PostContent, author: &UserId, now: DateTime<Utc>) -> Fields {
    let mut fields = Fields::new();
    fields.insert(CREATED_AT.into(), millis(now));
    fields.insert(LAST_ACTIVITY_AT.into(), millis(now));
    if let Some(category) = content.category {
        fields.insert(CATEGORY.into(), Value::String(category));
    }
    fields.insert(TAGS.into(), json!(content.tags));
    fields.insert(AUTHOR_ID.into(), Value::String(author.to_string()));
    fields.insert(PAYLOAD.into(), Value::Object(content.payload));
    fields.insert(REPLY_COUNT.into(), Value::from(0));
    fields.insert(VIEW_COUNT.into(), Value::from(0));
    fields.insert(REACTION_COUNTS.into(), Value::Object(Fields::new()));
    fields
}

pub fn timestamp(doc: &Document, field: &str) -> Result<DateTime<Utc>, StoreError> {
    doc.get_i64(field)
        .and_then(from_millis)
        .ok_or_else(|| StoreError::serialization(format!("{}: missing or invalid {}", doc.id, field)))
}

/// Decode a feed item. Counters default to zero and unknown reaction keys
/// are skipped.
pub fn decode_feed_item(doc: &Document) -> Result<FeedItem, StoreError> {
    let author_id = doc
        .get_str(AUTHOR_ID)
        .ok_or_else(|| StoreError::serialization(format!("{}: missing {}", doc.id, AUTHOR_ID)))
        .and_then(|raw| {
            UserId::new(raw).map_err(|e| StoreError::serialization(e.to_string()))
        })?;

    let tags = doc
        .get(TAGS)
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let reaction_counts: BTreeMap<ReactionKind, i64> = doc
        .get(REACTION_COUNTS)
        .and_then(Value::as_object)
        .map(|counts| {
            counts
                .iter()
                .filter_map(|(key, value)| Some((key.parse().ok()?, value.as_i64()?)))
                .collect()
        })
        .unwrap_or_default();

    Ok(FeedItem {
        id: doc.id.clone(),
        created_at: timestamp(doc, CREATED_AT)?,
        last_activity_at: timestamp(doc, LAST_ACTIVITY_AT)?,
        category: doc.get_str(CATEGORY).map(str::to_string),
        tags,
        author_id,
        payload: doc
            .get(PAYLOAD)
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default(),
        reply_count: doc.get_i64(REPLY_COUNT).unwrap_or(0),
        view_count: doc.get_i64(VIEW_COUNT).unwrap_or(0),
        reaction_counts,
    })
}

/// Decode a list, skipping (and logging) malformed documents.
pub fn decode_feed_items<'a>(docs: impl IntoIterator<Item = &'a Document>) -> Vec<FeedItem> {
    docs.into_iter()
        .filter_map(|doc| match decode_feed_item(doc) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!(id = %doc.id, error = %e, "Skipping malformed feed item");
                None
            }
        })
        .collect()
}
