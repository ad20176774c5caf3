//! Email notification of a screening digest.
//!
//! The recipient is checked against a permissive address pattern before any
//! transport is attempted. An invalid or missing address is not an error:
//! the digest is simply not sent. After a successful send the notifier
//! pauses for a settling delay to stay clear of the relay's rate limits.

use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;

use thiserror::Error;

use crate::providers::email::{Mailer, OutgoingEmail, TransportError};

/// Pause observed after each send.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(5);

/// Errors that can occur during notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Recipient failed local validation.
    #[error("invalid recipient address: {0}")]
    AddressInvalid(String),

    /// Dispatch failed.
    #[error("email transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Result type for notification operations.
pub type NotifyResult<T> = Result<T, NotifyError>;

/// Why a notification was not sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoRecipient,
    InvalidAddress,
    EmptyBody,
}

/// What the notifier did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    Sent { message_id: String },
    Skipped(SkipReason),
}

impl NotifyOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }
}

fn address_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^@]+@[^@]+\.[^@]+$").expect("address pattern should compile")
    })
}

/// Checks a recipient: exactly one `@`, non-empty local part, and a domain
/// with a dot that has text on both sides.
pub fn validate_address(address: &str) -> NotifyResult<()> {
    if address_pattern().is_match(address) {
        Ok(())
    } else {
        Err(NotifyError::AddressInvalid(address.to_string()))
    }
}

/// Sends digest emails through a [`Mailer`].
pub struct Notifier<M> {
    mailer: M,
    settle_delay: Duration,
}

impl<M: Mailer> Notifier<M> {
    pub fn new(mailer: M) -> Self {
        Self {
            mailer,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    /// Overrides the post-send pause.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn mailer(&self) -> &M {
        &self.mailer
    }

    /// Sends `body` to `recipient` unless the address is missing or invalid
    /// or the body is empty.
    pub async fn notify(
        &self,
        recipient: Option<&str>,
        subject: &str,
        body: &str,
    ) -> NotifyResult<NotifyOutcome> {
        let recipient = match recipient.map(str::trim) {
            Some(r) if !r.is_empty() => r,
            _ => return Ok(NotifyOutcome::Skipped(SkipReason::NoRecipient)),
        };

        if body.trim().is_empty() {
            tracing::debug!("Empty digest body, nothing to send");
            return Ok(NotifyOutcome::Skipped(SkipReason::EmptyBody));
        }

        if let Err(e) = validate_address(recipient) {
            tracing::warn!(error = %e, "Not sending digest");
            return Ok(NotifyOutcome::Skipped(SkipReason::InvalidAddress));
        }

        let email = OutgoingEmail::new(recipient, subject, body);
        let message_id = self.mailer.send(&email).await?;

        if !self.settle_delay.is_zero() {
            tracing::debug!(delay_secs = self.settle_delay.as_secs_f32(), "Settling after send");
            tokio::time::sleep(self.settle_delay).await;
        }

        Ok(NotifyOutcome::Sent { message_id })
    }
}
