//! Health endpoint
//!
//! Reports liveness plus basic build and host information.

use crate::api::AppState;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

/// Health report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub os: String,
    pub arch: String,
    pub storage: String,
    /// FFmpeg version, once the muxer has been used
    pub engine: Option<String>,
}

/// Handle `GET /api/health`
pub async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        storage: state.store.name().to_string(),
        engine: state.muxer.engine_info().map(|info| info.version.clone()),
    })
}
