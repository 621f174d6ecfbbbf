//! Notifier capability and errors

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A request to tell someone their recording is ready
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub recipient: String,
    pub url: String,
}

impl NotificationRequest {
    pub fn new(recipient: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            url: url.into(),
        }
    }
}

/// Notification errors
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Invalid email address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to build message: {0}")]
    Message(String),

    #[error("Mail transport error: {0}")]
    Transport(String),

    #[error("Notifier has been shut down")]
    Closed,
}

/// Something that can deliver a notification
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one notification
    async fn notify(&self, request: &NotificationRequest) -> Result<(), NotifyError>;

    /// Release held connections; later `notify` calls fail with `Closed`
    async fn shutdown(&self) {}
}

/// Used when no mail server is configured
#[derive(Debug, Default)]
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn notify(&self, request: &NotificationRequest) -> Result<(), NotifyError> {
        tracing::info!(
            "Notifications disabled; not emailing {} about {}",
            request.recipient,
            request.url
        );
        Ok(())
    }
}
