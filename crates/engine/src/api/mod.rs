//! API layer - HTTP and WebSocket entry points.

pub mod error;
pub mod http;
pub mod session;
pub mod websocket;

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::app::App;

pub use error::ApiError;

/// REST routes plus the live feed socket, bound to `app`.
pub fn router(app: Arc<App>) -> Router {
    http::routes()
        .route("/ws/feeds/{kind}", get(websocket::ws_handler))
        .with_state(app)
}
