//! Outbound email.
//!
//! `SmtpMailer` delivers through lettre's async SMTP transport. When no SMTP
//! host is configured `LogMailer` takes its place and only logs what would
//! have been sent.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::EmailConfig;
use crate::messages::EmailContent;

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub message_id: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, email: &EmailContent) -> Result<SentEmail>;

    /// False when messages are only logged and never reach the recipient
    fn delivers(&self) -> bool {
        true
    }
}

fn new_message_id() -> String {
    format!("<{}@luber>", Uuid::new_v4())
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &EmailConfig) -> Result<Self> {
        let host = config
            .smtp_host
            .as_deref()
            .ok_or_else(|| anyhow!("email.smtp_host is not configured"))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
            .port(config.smtp_port);
        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e| anyhow!("Invalid email.from '{}': {}", config.from, e))?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, email: &EmailContent) -> Result<SentEmail> {
        let to: Mailbox = to
            .parse()
            .map_err(|e| anyhow!("Invalid recipient '{}': {}", to, e))?;
        let message_id = new_message_id();

        let message = Message::builder()
            .from(self.from.clone())
            .to(to.clone())
            .subject(email.subject.clone())
            .message_id(Some(message_id.clone()))
            .header(ContentType::TEXT_HTML)
            .body(email.html.clone())?;

        match self.transport.send(message).await {
            Ok(_) => {
                info!("Email sent to {} ({})", to, message_id);
                Ok(SentEmail { message_id })
            }
            Err(e) => {
                warn!("Failed to send email to {}: {}", to, e);
                Err(e.into())
            }
        }
    }
}

/// Mailer used when SMTP is not configured
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, email: &EmailContent) -> Result<SentEmail> {
        let message_id = new_message_id();
        info!(
            "SMTP disabled, would send '{}' to {} ({})",
            email.subject, to, message_id
        );
        Ok(SentEmail { message_id })
    }

    fn delivers(&self) -> bool {
        false
    }
}

pub fn build_mailer(config: &EmailConfig) -> Result<Arc<dyn Mailer>> {
    if config.smtp_host.is_some() {
        Ok(Arc::new(SmtpMailer::new(config)?))
    } else {
        warn!("No SMTP host configured, emails will only be logged");
        Ok(Arc::new(LogMailer))
    }
}
