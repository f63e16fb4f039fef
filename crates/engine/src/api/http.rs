//! HTTP routes.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use townsquare_domain::{
    CategoryFilter, CommentBody, DocumentId, FeedFilter, FeedItem, FeedKind, PageSize, PostDraft,
};
use townsquare_shared::{
    ClaimUsernameRequest, ClaimUsernameResponse, CommentData, CreateCommentRequest,
    CreatePostRequest, CreatedResponse, FeedItemData, FeedPageParams, FeedPageResponse,
    HealthResponse, PresenceResponse, PresenceViewerData, ReactionRequest, ReactionResponse,
};

use crate::app::App;
use crate::use_cases::content::Comment;
use crate::use_cases::presence::{PageKey, Viewer};

use super::error::ApiError;
use super::session::{MaybeSession, RequireSession};

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
        .route("/api/feeds/{kind}", get(list_feed).post(publish))
        .route("/api/feeds/{kind}/featured", get(featured))
        .route("/api/feeds/{kind}/{id}", axum::routing::delete(delete_post))
        .route(
            "/api/feeds/{kind}/{id}/comments",
            get(list_comments).post(add_comment),
        )
        .route(
            "/api/feeds/{kind}/{id}/comments/{comment_id}",
            axum::routing::delete(delete_comment),
        )
        .route("/api/feeds/{kind}/{id}/views", post(record_view))
        .route("/api/stories/{id}/reaction", put(toggle_reaction))
        .route("/api/usernames/claim", post(claim_username))
        .route(
            "/api/presence/{page}",
            get(list_viewers).post(heartbeat).delete(leave_page),
        )
}

pub(crate) fn parse_kind(raw: &str) -> Result<FeedKind, ApiError> {
    Ok(raw.parse::<FeedKind>()?)
}

fn parse_id(raw: &str) -> Result<DocumentId, ApiError> {
    Ok(DocumentId::new(raw)?)
}

/// Filter tuple from query parameters; page size falls back to the
/// configured size for the feed.
pub(crate) fn feed_filter(
    app: &App,
    kind: FeedKind,
    category: Option<&str>,
    tag: Option<&str>,
    page_size: Option<u32>,
) -> FeedFilter {
    let page_size = page_size
        .map(PageSize::clamped)
        .unwrap_or_else(|| app.config.page_size(kind));
    FeedFilter::new(page_size)
        .with_category(CategoryFilter::parse(category))
        .with_tag(tag)
}

pub(crate) fn feed_item_data(item: FeedItem) -> FeedItemData {
    FeedItemData {
        id: item.id.to_string(),
        created_at: item.created_at.to_rfc3339(),
        last_activity_at: item.last_activity_at.to_rfc3339(),
        category: item.category,
        tags: item.tags,
        author_id: item.author_id.to_string(),
        payload: item.payload,
        reply_count: item.reply_count,
        view_count: item.view_count,
        reaction_counts: item.reaction_counts,
    }
}

fn comment_data(comment: Comment) -> CommentData {
    CommentData {
        id: comment.id.to_string(),
        author_id: comment.author_id.to_string(),
        body: comment.body,
        created_at: comment.created_at.to_rfc3339(),
    }
}

fn viewer_data(viewer: Viewer) -> PresenceViewerData {
    PresenceViewerData {
        user_id: viewer.user_id.to_string(),
        handle: viewer.handle.map(String::from),
        last_seen: viewer.last_seen.to_rfc3339(),
    }
}

async fn health(State(app): State<Arc<App>>) -> Json<HealthResponse> {
    let degraded_writes = app.write_health.degraded_writes();
    let status = if degraded_writes == 0 { "ok" } else { "degraded" };
    Json(HealthResponse {
        status: status.to_string(),
        degraded_writes,
    })
}

// =============================================================================
// Feeds
// =============================================================================

async fn list_feed(
    State(app): State<Arc<App>>,
    Path(kind): Path<String>,
    Query(params): Query<FeedPageParams>,
) -> Result<Json<FeedPageResponse>, ApiError> {
    let kind = parse_kind(&kind)?;
    let filter = feed_filter(
        &app,
        kind,
        params.category.as_deref(),
        params.tag.as_deref(),
        params.page_size,
    )
    .with_search(params.search.as_deref());

    let page = app
        .use_cases
        .feed
        .list_page
        .execute(kind, &filter, params.cursor.as_deref())
        .await?;
    Ok(Json(FeedPageResponse {
        items: page.items.into_iter().map(feed_item_data).collect(),
        next_cursor: page.next_cursor,
        has_more: page.has_more,
    }))
}

async fn featured(
    State(app): State<Arc<App>>,
    Path(kind): Path<String>,
    Query(params): Query<FeedPageParams>,
) -> Result<Json<Vec<FeedItemData>>, ApiError> {
    let kind = parse_kind(&kind)?;
    let category = CategoryFilter::parse(params.category.as_deref());
    let items = app.use_cases.feed.featured.execute(kind, &category).await?;
    Ok(Json(items.into_iter().map(feed_item_data).collect()))
}

async fn publish(
    State(app): State<Arc<App>>,
    Path(kind): Path<String>,
    MaybeSession(session): MaybeSession,
    Json(req): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let kind = parse_kind(&kind)?;
    let draft = PostDraft {
        category: req.category,
        tags: req.tags,
        title: req.title,
        body: req.body,
        price_cents: req.price_cents,
    };
    let id = app
        .use_cases
        .content
        .publish
        .execute(kind, session.as_ref(), draft)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse { id: id.to_string() }),
    ))
}

async fn delete_post(
    State(app): State<Arc<App>>,
    Path((kind, id)): Path<(String, String)>,
    RequireSession(session): RequireSession,
) -> Result<StatusCode, ApiError> {
    let kind = parse_kind(&kind)?;
    app.use_cases
        .content
        .delete
        .execute(kind, &session, parse_id(&id)?)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Comments and views
// =============================================================================

async fn list_comments(
    State(app): State<Arc<App>>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Json<Vec<CommentData>>, ApiError> {
    let kind = parse_kind(&kind)?;
    let comments = app
        .use_cases
        .content
        .list_comments
        .execute(kind, parse_id(&id)?)
        .await?;
    Ok(Json(comments.into_iter().map(comment_data).collect()))
}

async fn add_comment(
    State(app): State<Arc<App>>,
    Path((kind, id)): Path<(String, String)>,
    RequireSession(session): RequireSession,
    Json(req): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let kind = parse_kind(&kind)?;
    let body = CommentBody::new(req.body)?;
    let comment_id = app
        .use_cases
        .content
        .add_comment
        .execute(kind, &session, parse_id(&id)?, body)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            id: comment_id.to_string(),
        }),
    ))
}

async fn delete_comment(
    State(app): State<Arc<App>>,
    Path((kind, id, comment_id)): Path<(String, String, String)>,
    RequireSession(session): RequireSession,
) -> Result<StatusCode, ApiError> {
    let kind = parse_kind(&kind)?;
    app.use_cases
        .content
        .delete_comment
        .execute(kind, &session, parse_id(&id)?, parse_id(&comment_id)?)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Accepted immediately; the increment runs in the background.
async fn record_view(
    State(app): State<Arc<App>>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let kind = parse_kind(&kind)?;
    let id = parse_id(&id)?;
    let record_view = app.use_cases.content.record_view.clone();
    tokio::spawn(async move {
        record_view.execute(kind, id).await;
    });
    Ok(StatusCode::ACCEPTED)
}

// =============================================================================
// Reactions, usernames, presence
// =============================================================================

async fn toggle_reaction(
    State(app): State<Arc<App>>,
    Path(id): Path<String>,
    RequireSession(session): RequireSession,
    Json(req): Json<ReactionRequest>,
) -> Result<Json<ReactionResponse>, ApiError> {
    let transition = app
        .use_cases
        .toggle_reaction
        .execute(&session, parse_id(&id)?, req.kind)
        .await?;
    Ok(Json(ReactionResponse {
        reaction: transition.next,
    }))
}

async fn claim_username(
    State(app): State<Arc<App>>,
    RequireSession(session): RequireSession,
    Json(req): Json<ClaimUsernameRequest>,
) -> Result<Json<ClaimUsernameResponse>, ApiError> {
    let claimed = app
        .use_cases
        .claim_username
        .execute(&session.user_id, &req.desired)
        .await?;
    Ok(Json(ClaimUsernameResponse {
        handle: claimed.handle.to_string(),
        disambiguated: claimed.disambiguated,
    }))
}

async fn heartbeat(
    State(app): State<Arc<App>>,
    Path(page): Path<String>,
    RequireSession(session): RequireSession,
) -> Result<StatusCode, ApiError> {
    let page = PageKey::new(&page)?;
    app.use_cases
        .presence
        .heartbeat
        .execute(&session, &page)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn leave_page(
    State(app): State<Arc<App>>,
    Path(page): Path<String>,
    RequireSession(session): RequireSession,
) -> Result<StatusCode, ApiError> {
    let page = PageKey::new(&page)?;
    app.use_cases.presence.leave.execute(&session, &page).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_viewers(
    State(app): State<Arc<App>>,
    Path(page): Path<String>,
) -> Result<Json<PresenceResponse>, ApiError> {
    let page = PageKey::new(&page)?;
    let viewers = app.use_cases.presence.viewers.execute(&page).await?;
    Ok(Json(PresenceResponse {
        page: page.as_str().to_string(),
        viewers: viewers.into_iter().map(viewer_data).collect(),
    }))
}
