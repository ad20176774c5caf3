//! SMTP mail transport via `lettre`.
//!
//! Connects with implicit TLS (port 465) by default, or STARTTLS (587),
//! authenticating with the sender account's username and password.

use async_trait::async_trait;
use chrono::Utc;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, MessageBuilder};
use lettre::transport::smtp::authentication::Credentials as SmtpCredentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{Mailer, OutgoingEmail, Result, TransportError};

/// SMTP server and sender configuration.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// SMTP server hostname.
    pub host: String,
    /// SMTP server port (typically 465 for TLS, 587 for STARTTLS).
    pub port: u16,
    /// Whether to use TLS (true) or STARTTLS (false).
    pub use_tls: bool,
    /// Sender address, also used as the login name.
    pub username: String,
    /// Password or app-specific password.
    pub password: String,
    /// Domain used for generated Message-ID headers.
    pub message_id_domain: String,
}

impl SmtpConfig {
    /// Creates a configuration for a typical TLS setup.
    pub fn tls(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: 465,
            use_tls: true,
            username: username.into(),
            password: password.into(),
            message_id_domain: "localhost".to_string(),
        }
    }

    /// Creates a configuration for a STARTTLS setup.
    pub fn starttls(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            port: 587,
            use_tls: false,
            ..Self::tls(host, username, password)
        }
    }

    pub fn with_message_id_domain(mut self, domain: impl Into<String>) -> Self {
        self.message_id_domain = domain.into();
        self
    }
}

/// Sends digests through an SMTP relay.
pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn message_id(&self) -> String {
        format!("<{}@{}>", uuid::Uuid::new_v4(), self.config.message_id_domain)
    }

    fn build_message(&self, email: &OutgoingEmail, message_id: &str) -> Result<Message> {
        let from: Mailbox = self.config.username.parse().map_err(|e| {
            TransportError::InvalidMessage(format!("invalid from address: {}", e))
        })?;
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| TransportError::InvalidMessage(format!("invalid to address: {}", e)))?;

        MessageBuilder::new()
            .from(from)
            .to(to)
            .subject(&email.subject)
            .date_now()
            .message_id(Some(message_id.to_string()))
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())
            .map_err(|e| TransportError::InvalidMessage(format!("failed to build message: {}", e)))
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        let credentials =
            SmtpCredentials::new(self.config.username.clone(), self.config.password.clone());

        let builder = if self.config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)
        }
        .map_err(|e| TransportError::Connection(format!("SMTP relay error: {}", e)))?;

        Ok(builder
            .credentials(credentials)
            .port(self.config.port)
            .build())
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<String> {
        let message_id = self.message_id();
        let message = self.build_message(email, &message_id)?;
        let mailer = self.transport()?;

        let response = mailer
            .send(message)
            .await
            .map_err(|e| TransportError::Send(format!("SMTP send failed: {}", e)))?;

        tracing::info!(
            message_id = %message_id,
            code = %response.code(),
            sent_at = %Utc::now().to_rfc3339(),
            "Email sent via SMTP"
        );
        Ok(message_id)
    }
}
