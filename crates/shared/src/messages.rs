//! Messages pushed over the live feed socket.

use serde::{Deserialize, Serialize};

use crate::responses::FeedItemData;

/// Client → server message on `/ws/feeds/{kind}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFeedMessage {
    /// Append the next page below the live window.
    LoadMore,
    /// Replace the filter. Anything but a search change restarts at page one.
    SetFilter {
        #[serde(default)]
        category: Option<String>,
        #[serde(default)]
        tag: Option<String>,
        #[serde(default)]
        search: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

/// Server → client message on `/ws/feeds/{kind}`.
///
/// Every snapshot carries the complete merged list (live window plus loaded
/// pages); clients replace their list wholesale instead of applying diffs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveFeedMessage {
    Snapshot {
        items: Vec<FeedItemData>,
        has_more: bool,
    },
    Error {
        message: String,
    },
    /// Unknown message type for forward compatibility
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_is_tagged() {
        let msg = LiveFeedMessage::Snapshot {
            items: vec![],
            has_more: true,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "snapshot");
        assert_eq!(json["has_more"], true);
    }

    #[test]
    fn set_filter_fields_are_optional() {
        let msg: ClientFeedMessage =
            serde_json::from_str(r#"{"type":"set_filter","category":"jazz"}"#).unwrap();
        match msg {
            ClientFeedMessage::SetFilter { category, tag, .. } => {
                assert_eq!(category.as_deref(), Some("jazz"));
                assert!(tag.is_none());
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn unknown_type_is_tolerated() {
        let msg: LiveFeedMessage = serde_json::from_str(r#"{"type":"typing"}"#).unwrap();
        assert!(matches!(msg, LiveFeedMessage::Unknown));
    }
}
