//! HTTP API
//!
//! Axum handlers for the browser client.
//!
//! | Path | Description |
//! |------|-------------|
//! | `POST /api/upload` | Store a finished recording, return its URL |
//! | `POST /api/compose` | Mux audio + video server-side, store, return URL |
//! | `GET /api/health` | Liveness and version information |

pub mod compose;
pub mod form;
pub mod system;
pub mod upload;

use crate::media::Muxer;
use crate::notify::{NotificationRequest, Notifier};
use crate::storage::ObjectStore;
use crate::utils::ErrorResponse;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared state passed to all request handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ObjectStore>,
    pub notifier: Arc<dyn Notifier>,
    pub muxer: Arc<Muxer>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        notifier: Arc<dyn Notifier>,
        muxer: Arc<Muxer>,
    ) -> Self {
        Self {
            store,
            notifier,
            muxer,
        }
    }
}

/// Build the router with all API endpoints
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/upload", post(upload::handle_upload))
        .route("/api/compose", post(compose::handle_compose))
        .route("/api/health", get(system::handle_health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// JSON error body with one of the fixed public messages
pub(crate) fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(ErrorResponse::new(message))).into_response()
}

/// Send a notification, logging instead of failing
///
/// The caller's response is already decided by the time this runs.
pub(crate) async fn send_notification(notifier: &dyn Notifier, recipient: String, url: &str) {
    let request = NotificationRequest::new(recipient, url);
    if let Err(e) = notifier.notify(&request).await {
        tracing::warn!("Failed to notify {}: {}", request.recipient, e);
    }
}
