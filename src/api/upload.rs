//! Upload endpoint
//!
//! `POST /api/upload` stores the `file` part of a multipart form and answers
//! with its public URL. An optional `email` part triggers a notification.

use crate::api::form::{FormData, FormError};
use crate::api::{error_response, send_notification, AppState};
use crate::storage::{self, upload_key};
use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub const NO_FILE_PROVIDED: &str = "No file provided";
pub const UPLOAD_FAILED: &str = "Failed to upload";
pub const FILE_TOO_LARGE: &str = "File too large";

/// Key prefix for direct uploads
const UPLOAD_PREFIX: &str = "uploads";

/// Successful upload body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}

/// Where a request is in its handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UploadStage {
    Received,
    Validated,
    Delegated,
    Responded,
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UploadStage::Received => "received",
            UploadStage::Validated => "validated",
            UploadStage::Delegated => "delegated",
            UploadStage::Responded => "responded",
        })
    }
}

/// Handle `POST /api/upload`
pub async fn handle_upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let request_id = Uuid::new_v4();
    tracing::debug!(%request_id, stage = %UploadStage::Received, "Upload request");

    let form = match read_form(multipart, NO_FILE_PROVIDED).await {
        Ok(form) => form,
        Err(response) => return response,
    };

    let Some(file) = form.file("file") else {
        tracing::debug!(%request_id, "Rejected: no file field");
        return error_response(StatusCode::BAD_REQUEST, NO_FILE_PROVIDED);
    };
    tracing::debug!(
        %request_id,
        stage = %UploadStage::Validated,
        "File '{}' ({}, {} bytes)",
        file.file_name.as_deref().unwrap_or("<unnamed>"),
        file.mime,
        file.len()
    );

    let key = upload_key(
        UPLOAD_PREFIX,
        file.file_name.as_deref(),
        Utc::now(),
        Uuid::new_v4(),
    );
    tracing::debug!(%request_id, stage = %UploadStage::Delegated, "Storing as {}", key);

    let response = match storage::upload(state.store.as_ref(), &file, &key).await {
        Ok(result) => {
            if let Some(email) = form.text("email") {
                send_notification(state.notifier.as_ref(), email, &result.url).await;
            }
            (StatusCode::OK, Json(UploadResponse { url: result.url })).into_response()
        }
        Err(e) => {
            tracing::error!(%request_id, "Error uploading file: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, UPLOAD_FAILED)
        }
    };

    tracing::debug!(
        %request_id,
        stage = %UploadStage::Responded,
        "Status {}",
        response.status()
    );
    response
}

/// Buffer the form, mapping every failure to a fixed 400/413 body
///
/// `rejected` is the 400 message for bodies that are not readable multipart.
pub(crate) async fn read_form(
    multipart: Result<Multipart, MultipartRejection>,
    rejected: &str,
) -> Result<FormData, Response> {
    let multipart = multipart.map_err(|rejection| {
        tracing::debug!("Not a multipart request: {}", rejection.body_text());
        error_response(StatusCode::BAD_REQUEST, rejected)
    })?;

    FormData::read(multipart).await.map_err(|e| match e {
        FormError::TooLarge => error_response(StatusCode::PAYLOAD_TOO_LARGE, FILE_TOO_LARGE),
        FormError::Malformed(reason) => {
            tracing::debug!("Malformed multipart body: {}", reason);
            error_response(StatusCode::BAD_REQUEST, rejected)
        }
    })
}
