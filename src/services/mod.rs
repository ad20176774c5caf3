//! Business services layer.
//!
//! # Architecture
//!
//! ```text
//! CandidateSource -> SimilarityRanker -> DigestBuilder (Denylist) -> Notifier
//!                          ^                                            |
//!                   EmbeddingProvider                                Mailer
//! ```
//!
//! # Services Overview
//!
//! - [`Denylist`]: Case-insensitive keyword exclusion
//! - [`DigestBuilder`]: Capped, filtered, threshold-gated digest of ranked tenders
//! - [`Notifier`]: Address validation and email dispatch
//! - [`ScreeningService`]: Runs the whole pipeline over a [`ScreeningSession`]

mod digest_service;
mod filter;
mod notification_service;
mod screening_service;

pub use digest_service::{
    build, DigestBuilder, DigestConfig, DEFAULT_LOW_CONFIDENCE_THRESHOLD, DEFAULT_TOP_K,
};
pub use filter::{passes, Denylist};
pub use notification_service::{
    validate_address, Notifier, NotifyError, NotifyOutcome, NotifyResult, SkipReason,
    DEFAULT_SETTLE_DELAY,
};
pub use screening_service::{
    EmailTemplate, RunReport, ScreeningError, ScreeningResult, ScreeningService,
    ScreeningSession,
};
