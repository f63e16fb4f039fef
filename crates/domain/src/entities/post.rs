//! Post and comment drafts, validated per feed before anything is written.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::common::none_if_blank;
use crate::error::DomainError;
use crate::value_objects::FeedKind;

const MAX_TITLE_LENGTH: usize = 200;
const MAX_BODY_LENGTH: usize = 10_000;
const MAX_SHOUT_LENGTH: usize = 500;
const MAX_CONFESSION_LENGTH: usize = 2_000;
const MAX_COMMENT_LENGTH: usize = 2_000;
const MAX_TAGS: usize = 8;

/// Raw form input for a new feed item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostDraft {
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub price_cents: Option<i64>,
}

/// A draft that passed validation for a specific feed.
#[derive(Debug, Clone, PartialEq)]
pub struct PostContent {
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub payload: Map<String, Value>,
}

fn required(value: Option<&str>, field: &str, max: usize) -> Result<String, DomainError> {
    let value = value
        .and_then(none_if_blank)
        .ok_or_else(|| DomainError::validation(format!("{} cannot be empty", field)))?;
    if value.chars().count() > max {
        return Err(DomainError::validation(format!(
            "{} cannot exceed {} characters",
            field, max
        )));
    }
    Ok(value.to_string())
}

fn normalize_tags(tags: &[String]) -> Result<Vec<String>, DomainError> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        if let Some(tag) = none_if_blank(tag) {
            let tag = tag.to_lowercase();
            if !out.contains(&tag) {
                out.push(tag);
            }
        }
    }
    if out.len() > MAX_TAGS {
        return Err(DomainError::validation(format!(
            "At most {} tags are allowed",
            MAX_TAGS
        )));
    }
    Ok(out)
}

impl PostDraft {
    pub fn validate(&self, kind: FeedKind) -> Result<PostContent, DomainError> {
        let mut payload = Map::new();
        match kind {
            FeedKind::Forum | FeedKind::Stories => {
                let title = required(self.title.as_deref(), "Title", MAX_TITLE_LENGTH)?;
                let body = required(self.body.as_deref(), "Body", MAX_BODY_LENGTH)?;
                payload.insert("title".into(), Value::String(title));
                payload.insert("body".into(), Value::String(body));
            }
            FeedKind::Marketplace => {
                let title = required(self.title.as_deref(), "Title", MAX_TITLE_LENGTH)?;
                let price = self
                    .price_cents
                    .ok_or_else(|| DomainError::validation("Price is required"))?;
                if price < 0 {
                    return Err(DomainError::validation("Price cannot be negative"));
                }
                payload.insert("title".into(), Value::String(title));
                payload.insert("priceCents".into(), Value::from(price));
                if let Some(body) = self.body.as_deref().and_then(none_if_blank) {
                    if body.chars().count() > MAX_BODY_LENGTH {
                        return Err(DomainError::validation(format!(
                            "Body cannot exceed {} characters",
                            MAX_BODY_LENGTH
                        )));
                    }
                    payload.insert("body".into(), Value::String(body.to_string()));
                }
            }
            FeedKind::Shoutbox => {
                let text = required(self.body.as_deref(), "Message", MAX_SHOUT_LENGTH)?;
                payload.insert("text".into(), Value::String(text));
            }
            FeedKind::Confessions => {
                let text = required(self.body.as_deref(), "Confession", MAX_CONFESSION_LENGTH)?;
                payload.insert("text".into(), Value::String(text));
            }
        }

        Ok(PostContent {
            category: self
                .category
                .as_deref()
                .and_then(none_if_blank)
                .map(str::to_lowercase),
            tags: normalize_tags(&self.tags)?,
            payload,
        })
    }
}

/// Validated comment body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommentBody(String);

impl CommentBody {
    pub fn new(body: impl Into<String>) -> Result<Self, DomainError> {
        let body = body.into();
        Ok(Self(required(Some(body.as_str()), "Comment", MAX_COMMENT_LENGTH)?))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CommentBody {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CommentBody> for String {
    fn from(body: CommentBody) -> Self {
        body.0
    }
}
