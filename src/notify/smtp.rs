//! SMTP notifier
//!
//! Holds one pooled transport for the life of the process. Connections are
//! opened on demand, reused across notifications, and released on shutdown.

use crate::config::{SmtpConfig, SmtpSecurity};
use crate::notify::message;
use crate::notify::types::{NotificationRequest, Notifier, NotifyError};
use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::PoolConfig;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use parking_lot::RwLock;
use std::sync::Arc;

/// Maximum pooled SMTP connections
const POOL_MAX_SIZE: u32 = 4;

type Transport = AsyncSmtpTransport<Tokio1Executor>;

pub struct SmtpNotifier {
    from: Mailbox,
    transport: RwLock<Option<Arc<Transport>>>,
}

impl SmtpNotifier {
    /// Build the pooled transport; no connection is made yet
    pub fn new(config: &SmtpConfig) -> Result<Self, NotifyError> {
        let from = parse_mailbox(&config.from)?;

        let builder = match config.security {
            SmtpSecurity::Tls => Transport::relay(&config.host),
            SmtpSecurity::StartTls => Transport::starttls_relay(&config.host),
            SmtpSecurity::None => Ok(Transport::builder_dangerous(&config.host)),
        }
        .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(
                config.user.clone(),
                config.password.clone(),
            ))
            .pool_config(PoolConfig::new().max_size(POOL_MAX_SIZE))
            .build();

        tracing::info!(
            "SMTP notifier ready: {}:{} ({:?})",
            config.host,
            config.port,
            config.security
        );

        Ok(Self {
            from,
            transport: RwLock::new(Some(Arc::new(transport))),
        })
    }

    /// Check that the server accepts a connection
    pub async fn verify(&self) -> Result<bool, NotifyError> {
        let transport = self.transport()?;
        transport
            .test_connection()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))
    }

    fn transport(&self) -> Result<Arc<Transport>, NotifyError> {
        self.transport.read().clone().ok_or(NotifyError::Closed)
    }

    fn build_message(&self, request: &NotificationRequest) -> Result<Message, NotifyError> {
        let to = parse_mailbox(&request.recipient)?;
        let rendered = message::render(&request.url);

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(rendered.subject)
            .multipart(MultiPart::alternative_plain_html(rendered.text, rendered.html))
            .map_err(|e| NotifyError::Message(e.to_string()))
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify(&self, request: &NotificationRequest) -> Result<(), NotifyError> {
        let transport = self.transport()?;
        let email = self.build_message(request)?;

        let response = transport
            .send(email)
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        tracing::info!(
            "Notified {} about {} (SMTP {})",
            request.recipient,
            request.url,
            response.code()
        );
        Ok(())
    }

    async fn shutdown(&self) {
        // In-flight sends keep their own handle; the pool closes when the
        // last one finishes
        if self.transport.write().take().is_some() {
            tracing::info!("SMTP notifier shut down");
        }
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address
        .parse::<Mailbox>()
        .map_err(|e| NotifyError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}
