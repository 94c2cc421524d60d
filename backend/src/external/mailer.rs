//! SMTP delivery of report emails

use std::time::Duration;

use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::error::{AppError, AppResult};

/// A plain-text email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Synchronous message delivery
#[axum::async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> AppResult<()>;
}

/// Settings for an authenticated STARTTLS relay
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
    pub timeout: Duration,
}

/// SMTP relay client
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> AppResult<Self> {
        let from: Mailbox = settings.from_address.parse().map_err(|e| {
            AppError::Configuration(format!(
                "Invalid sender address {}: {}",
                settings.from_address, e
            ))
        })?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
            .map_err(|e| AppError::Configuration(format!("Invalid SMTP relay: {}", e)))?
            .port(settings.port)
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
            .timeout(Some(settings.timeout))
            .build();

        Ok(Self { transport, from })
    }
}

/// Build the MIME message for an email
pub fn build_message(from: &Mailbox, email: &OutgoingEmail) -> AppResult<Message> {
    let to: Mailbox = email
        .to
        .parse()
        .map_err(|e| AppError::Email(format!("Invalid recipient {}: {}", email.to, e)))?;

    Message::builder()
        .from(from.clone())
        .to(to)
        .subject(email.subject.clone())
        .header(ContentType::TEXT_PLAIN)
        .body(email.body.clone())
        .map_err(|e| AppError::Email(format!("Failed to build message: {}", e)))
}

#[axum::async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> AppResult<()> {
        let message = build_message(&self.from, email)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::Email(format!("SMTP send failed: {}", e)))?;

        tracing::info!("Report email sent to {}", email.to);
        Ok(())
    }
}
