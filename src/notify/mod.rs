//! Notification module
//!
//! Emails a playback link once a recording has been uploaded.

pub mod message;
pub mod smtp;
pub mod types;

pub use smtp::SmtpNotifier;
pub use types::{DisabledNotifier, NotificationRequest, Notifier, NotifyError};

use crate::config::SmtpConfig;
use std::sync::Arc;

/// Build the notifier for the given SMTP settings
pub async fn connect(config: Option<&SmtpConfig>) -> Result<Arc<dyn Notifier>, NotifyError> {
    let Some(config) = config else {
        tracing::info!("SMTP not configured; notifications disabled");
        return Ok(Arc::new(DisabledNotifier));
    };

    let notifier = SmtpNotifier::new(config)?;
    match notifier.verify().await {
        Ok(true) => tracing::info!("SMTP server {} reachable", config.host),
        Ok(false) => tracing::warn!("SMTP server {} did not accept a test connection", config.host),
        Err(e) => tracing::warn!("SMTP connection check failed: {}", e),
    }
    Ok(Arc::new(notifier))
}
