//! Compose endpoint
//!
//! `POST /api/compose` takes a sung `audio` track and the reference `video`,
//! muxes them server-side, uploads the composite, and answers with its URL.

use crate::api::upload::{read_form, UploadResponse};
use crate::api::{error_response, send_notification, AppState};
use crate::media::MediaError;
use crate::storage::{self, upload_key};
use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use uuid::Uuid;

pub const MISSING_TRACKS: &str = "Missing audio or video track";
pub const UNSUPPORTED_MEDIA: &str = "Unsupported media type";
pub const COMPOSE_FAILED: &str = "Failed to compose";

/// Key prefix for muxed composites
const COMPOSITE_PREFIX: &str = "composites";

/// Handle `POST /api/compose`
pub async fn handle_compose(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let form = match read_form(multipart, MISSING_TRACKS).await {
        Ok(form) => form,
        Err(response) => return response,
    };

    let (Some(audio), Some(video)) = (form.file("audio"), form.file("video")) else {
        return error_response(StatusCode::BAD_REQUEST, MISSING_TRACKS);
    };

    tracing::info!(
        "Composing {} bytes of {} with {} bytes of {}",
        audio.len(),
        audio.mime,
        video.len(),
        video.mime
    );

    let composite = match state.muxer.combine(&audio, &video).await {
        Ok(composite) => composite,
        Err(MediaError::UnsupportedMime { expected, actual }) => {
            tracing::debug!("Rejected {:?} track with MIME type '{}'", expected, actual);
            return error_response(StatusCode::BAD_REQUEST, UNSUPPORTED_MEDIA);
        }
        Err(e) => {
            tracing::error!("Error composing recording: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, COMPOSE_FAILED);
        }
    };

    let asset = composite.into_asset();
    let key = upload_key(
        COMPOSITE_PREFIX,
        asset.file_name.as_deref(),
        Utc::now(),
        Uuid::new_v4(),
    );

    match storage::upload(state.store.as_ref(), &asset, &key).await {
        Ok(result) => {
            if let Some(email) = form.text("email") {
                send_notification(state.notifier.as_ref(), email, &result.url).await;
            }
            (StatusCode::OK, Json(UploadResponse { url: result.url })).into_response()
        }
        Err(e) => {
            tracing::error!("Error uploading composite: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, COMPOSE_FAILED)
        }
    }
}
