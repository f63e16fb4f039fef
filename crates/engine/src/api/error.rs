//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use townsquare_domain::DomainError;
use townsquare_shared::{ErrorCode, ErrorResponse};

use crate::infrastructure::ports::StoreError;
use crate::use_cases::{FeedError, PostError, PresenceError, ReactionError, UsernameError};

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Validation(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    Unavailable(String),
    Internal(String),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, ErrorCode, &str) {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorCode::BadRequest, msg.as_str()),
            ApiError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::ValidationError, msg.as_str())
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized, msg.as_str()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, ErrorCode::Forbidden, msg.as_str()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorCode::NotFound, msg.as_str()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, ErrorCode::Conflict, msg.as_str()),
            ApiError::Unavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorCode::ServiceUnavailable,
                msg.as_str(),
            ),
            ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::InternalError,
                "Internal error",
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            tracing::error!(error = %detail, "Request failed");
        }
        let (status, code, message) = self.parts();
        (status, Json(ErrorResponse::new(code, message))).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(_) => ApiError::Validation(e.to_string()),
            DomainError::Parse(_) => ApiError::BadRequest(e.to_string()),
            DomainError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            DomainError::Constraint(_) => ApiError::Conflict(e.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            StoreError::Unavailable { .. } => ApiError::Unavailable(e.to_string()),
            StoreError::PreconditionFailed(_) => ApiError::Conflict(e.to_string()),
            StoreError::CursorMismatch | StoreError::InvalidCursor(_) => {
                ApiError::BadRequest(e.to_string())
            }
            StoreError::Serialization(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<FeedError> for ApiError {
    fn from(e: FeedError) -> Self {
        match e {
            FeedError::Store(e) => e.into(),
            FeedError::Closed => ApiError::Conflict(e.to_string()),
        }
    }
}

impl From<PostError> for ApiError {
    fn from(e: PostError) -> Self {
        match e {
            PostError::NotSignedIn => ApiError::Unauthorized(e.to_string()),
            PostError::Validation(e) => e.into(),
            PostError::NotFound(_) => ApiError::NotFound(e.to_string()),
            PostError::Forbidden | PostError::NotDeletable(_) => ApiError::Forbidden(e.to_string()),
            PostError::CommentsDisabled(_) => ApiError::BadRequest(e.to_string()),
            PostError::Store(e) => e.into(),
        }
    }
}

impl From<ReactionError> for ApiError {
    fn from(e: ReactionError) -> Self {
        match e {
            ReactionError::StoryNotFound(_) => ApiError::NotFound(e.to_string()),
            ReactionError::Conflict => ApiError::Conflict(e.to_string()),
            ReactionError::Validation(e) => e.into(),
            ReactionError::Store(e) => e.into(),
        }
    }
}

impl From<UsernameError> for ApiError {
    fn from(e: UsernameError) -> Self {
        match e {
            UsernameError::Invalid(e) => e.into(),
            UsernameError::Exhausted(_) | UsernameError::Conflict => {
                ApiError::Conflict(e.to_string())
            }
            UsernameError::Store(e) => e.into(),
        }
    }
}

impl From<PresenceError> for ApiError {
    fn from(e: PresenceError) -> Self {
        match e {
            PresenceError::InvalidPage(e) => e.into(),
            PresenceError::Store(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use townsquare_domain::FeedKind;

    fn status(err: impl Into<ApiError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn errors_map_to_status_codes() {
        assert_eq!(status(PostError::NotSignedIn), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status(PostError::NotDeletable(FeedKind::Forum)),
            StatusCode::FORBIDDEN
        );
        assert_eq!(status(StoreError::CursorMismatch), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(StoreError::unavailable("query", "offline")),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(status(ReactionError::Conflict), StatusCode::CONFLICT);
        assert_eq!(
            status(DomainError::validation("empty")),
            StatusCode::BAD_REQUEST
        );
    }
}
