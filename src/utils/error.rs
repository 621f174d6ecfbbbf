//! Error types and handling
//!
//! Common error types used across the application.

use crate::config::ConfigError;
use crate::media::MediaError;
use crate::notify::NotifyError;
use crate::storage::StorageError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    #[error("Server error: {0}")]
    Server(String),
}

impl AppError {
    /// Stable machine-readable code for logs
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Io(_) => "IO_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Media(_) => "MEDIA_ERROR",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Notify(_) => "NOTIFY_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
        }
    }
}

/// Error body returned by the HTTP API
///
/// Only ever carries one of the fixed public messages; internal error text
/// stays in the server log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: &str) -> Self {
        Self {
            error: message.to_string(),
        }
    }
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
