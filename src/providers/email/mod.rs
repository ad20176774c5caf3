//! Mail transport for digest delivery.
//!
//! - [`Mailer`] - capability trait used by the notifier
//! - [`SmtpMailer`] - SMTP with TLS or STARTTLS

mod smtp;
mod traits;

pub use smtp::{SmtpConfig, SmtpMailer};
pub use traits::{Mailer, OutgoingEmail, Result, TransportError};
