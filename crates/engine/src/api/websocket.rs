//! Live feed socket.
//!
//! Each connection owns one [`Feed`]: the live window over the first page
//! plus whatever pages the client asked for with `load_more`. Every change
//! is pushed as a [`LiveFeedMessage::Snapshot`] of the merged list. The
//! feed is closed when the client goes away.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    response::{IntoResponse, Response},
};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use townsquare_domain::{CategoryFilter, FeedFilter, FeedItem, FeedKind};
use townsquare_shared::{ClientFeedMessage, LiveFeedMessage, LiveFeedParams};
use uuid::Uuid;

use crate::app::App;
use crate::use_cases::feed::{Feed, FeedError};

use super::http::{feed_filter, feed_item_data, parse_kind};

type Sender = SplitSink<WebSocket, Message>;

/// WebSocket upgrade handler for `/ws/feeds/{kind}`.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app): State<Arc<App>>,
    Path(kind): Path<String>,
    Query(params): Query<LiveFeedParams>,
) -> Response {
    let kind = match parse_kind(&kind) {
        Ok(kind) => kind,
        Err(e) => return e.into_response(),
    };
    let filter = feed_filter(
        &app,
        kind,
        params.category.as_deref(),
        params.tag.as_deref(),
        params.page_size,
    );
    ws.on_upgrade(move |socket| handle_socket(socket, app, kind, filter))
}

pub(crate) fn snapshot_message(items: Vec<FeedItem>, has_more: bool) -> LiveFeedMessage {
    LiveFeedMessage::Snapshot {
        items: items.into_iter().map(feed_item_data).collect(),
        has_more,
    }
}

async fn send_message(sender: &mut Sender, message: &LiveFeedMessage) -> bool {
    match serde_json::to_string(message) {
        Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize live feed message");
            false
        }
    }
}

async fn send_snapshot(sender: &mut Sender, feed: &Feed) -> bool {
    send_message(sender, &snapshot_message(feed.items(), feed.has_more())).await
}

async fn send_error(sender: &mut Sender, error: &FeedError) -> bool {
    send_message(
        sender,
        &LiveFeedMessage::Error {
            message: error.to_string(),
        },
    )
    .await
}

/// Apply one client message. Returns `false` once the socket is unusable.
async fn handle_client_message(
    sender: &mut Sender,
    feed: &mut Feed,
    connection_id: Uuid,
    text: &str,
) -> bool {
    let message = match serde_json::from_str::<ClientFeedMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!(connection_id = %connection_id, error = %e, "Failed to parse message");
            return true;
        }
    };

    let result = match message {
        ClientFeedMessage::LoadMore => feed.load_more().await.map(|outcome| {
            tracing::debug!(connection_id = %connection_id, ?outcome, "Load more");
        }),
        ClientFeedMessage::SetFilter {
            category,
            tag,
            search,
        } => {
            let filter = FeedFilter::new(feed.filter().page_size)
                .with_category(CategoryFilter::parse(category.as_deref()))
                .with_tag(tag.as_deref())
                .with_search(search.as_deref());
            feed.set_filter(filter).await
        }
        ClientFeedMessage::Unknown => return true,
    };

    match result {
        Ok(()) => send_snapshot(sender, feed).await,
        Err(e) => {
            tracing::warn!(connection_id = %connection_id, error = %e, "Feed request failed");
            send_error(sender, &e).await
        }
    }
}

async fn handle_socket(socket: WebSocket, app: Arc<App>, kind: FeedKind, filter: FeedFilter) {
    let (mut sender, mut receiver) = socket.split();
    let connection_id = Uuid::new_v4();

    let mut feed = match Feed::open(app.store.clone(), kind, filter).await {
        Ok(feed) => feed,
        Err(e) => {
            tracing::warn!(connection_id = %connection_id, feed = %kind, error = %e, "Could not open feed");
            let _ = send_error(&mut sender, &e).await;
            return;
        }
    };

    tracing::info!(connection_id = %connection_id, feed = %kind, category = %feed.filter().category, "Live feed connected");

    if send_snapshot(&mut sender, &feed).await {
        loop {
            tokio::select! {
                changed = feed.next_change() => match changed {
                    Ok(true) => {
                        if !send_snapshot(&mut sender, &feed).await {
                            break;
                        }
                    }
                    Ok(false) => break,
                    Err(e) => {
                        tracing::warn!(connection_id = %connection_id, error = %e, "Live window failed");
                        let _ = send_error(&mut sender, &e).await;
                        break;
                    }
                },
                incoming = receiver.next() => match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if !handle_client_message(&mut sender, &mut feed, connection_id, text.as_str()).await {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(connection_id = %connection_id, error = %e, "WebSocket error");
                        break;
                    }
                    Some(Ok(_)) => {}
                },
            }
        }
    }

    feed.close();
    tracing::info!(connection_id = %connection_id, feed = %kind, "Live feed disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::documents::decode_feed_items;
    use crate::infrastructure::ports::Document;
    use serde_json::json;
    use townsquare_domain::DocumentId;

    #[test]
    fn snapshot_carries_decoded_items() {
        let good = Document::new(
            DocumentId::new("m1").unwrap(),
            json!({"createdAt": 1, "lastActivityAt": 1, "authorId": "u1", "payload": {"text": "hi"}})
                .as_object()
                .cloned()
                .unwrap(),
        );
        let broken = Document::new(
            DocumentId::new("m2").unwrap(),
            json!({"createdAt": 2}).as_object().cloned().unwrap(),
        );
        let items = decode_feed_items(&[good, broken]);

        match snapshot_message(items, true) {
            LiveFeedMessage::Snapshot { items, has_more } => {
                assert!(has_more);
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].id, "m1");
                assert_eq!(items[0].payload["text"], "hi");
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }
}
