//! Mail transport trait definition.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result type alias for mail transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors that can occur while dispatching an email.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The message could not be assembled (bad sender or recipient).
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Could not reach or authenticate with the mail server.
    #[error("connection error: {0}")]
    Connection(String),

    /// The server rejected the message.
    #[error("send failed: {0}")]
    Send(String),
}

/// A plain-text email to be sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingEmail {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain text body.
    pub body: String,
}

impl OutgoingEmail {
    pub fn new(
        to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// Capability that delivers an email.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends the email, returning the message ID.
    async fn send(&self, email: &OutgoingEmail) -> Result<String>;
}

#[async_trait]
impl<M: Mailer + ?Sized> Mailer for std::sync::Arc<M> {
    async fn send(&self, email: &OutgoingEmail) -> Result<String> {
        (**self).send(email).await
    }
}

#[async_trait]
impl<M: Mailer + ?Sized> Mailer for Box<M> {
    async fn send(&self, email: &OutgoingEmail) -> Result<String> {
        (**self).send(email).await
    }
}
