//! Caller identity.
//!
//! Sign-in happens elsewhere; requests carry the member id in `x-user-id`.
//! Admin rights come from `ADMIN_USER_IDS`, the handle from `users/{id}`.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use townsquare_domain::{Session, UserId};

use crate::app::App;
use crate::use_cases::usernames::handle_of;

use super::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Session when the caller identified themselves.
pub struct MaybeSession(pub Option<Session>);

/// Session or 401.
pub struct RequireSession(pub Session);

async fn resolve(parts: &Parts, app: &App) -> Result<Option<Session>, ApiError> {
    let Some(raw) = parts
        .headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    else {
        return Ok(None);
    };

    let user_id = UserId::new(raw)?;
    let session = if app.config.is_admin(&user_id) {
        Session::admin(user_id)
    } else {
        Session::member(user_id)
    };

    let handle = match handle_of(app.store.as_ref(), &session.user_id).await {
        Ok(handle) => handle,
        Err(e) => {
            tracing::warn!(user_id = %session.user_id, error = %e, "Could not load handle");
            None
        }
    };
    Ok(Some(session.with_handle(handle)))
}

impl FromRequestParts<Arc<App>> for MaybeSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, app: &Arc<App>) -> Result<Self, Self::Rejection> {
        Ok(Self(resolve(parts, app).await?))
    }
}

impl FromRequestParts<Arc<App>> for RequireSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, app: &Arc<App>) -> Result<Self, Self::Rejection> {
        resolve(parts, app)
            .await?
            .map(Self)
            .ok_or_else(|| ApiError::Unauthorized("Sign in required".to_string()))
    }
}
