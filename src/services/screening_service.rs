//! The screening pipeline: listing, ranking, digest, notification.
//!
//! A [`ScreeningSession`] is opened once per run and holds the retrieved
//! listing. [`ScreeningService`] ranks the session's candidates against the
//! profile text, builds the digest and optionally mails it.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::{Candidate, Digest};
use crate::embedding::{DistanceError, RankError, SimilarityRanker};
use crate::providers::ai::{EmbeddingError, EmbeddingProvider};
use crate::providers::email::Mailer;
use crate::providers::source::CandidateSource;
use crate::services::{
    DigestBuilder, Notifier, NotifyError, NotifyOutcome, NotifyResult, SkipReason,
};

/// Errors that abort a screening run.
#[derive(Debug, Error)]
pub enum ScreeningError {
    /// The embedding provider failed; the run has no ranking.
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Embeddings could not be compared. Indicates a defect, not bad input.
    #[error("distance computation failed: {0}")]
    Distance(#[from] DistanceError),

    /// The digest could not be mailed.
    #[error("notification failed: {0}")]
    Notify(#[from] NotifyError),
}

impl From<RankError> for ScreeningError {
    fn from(error: RankError) -> Self {
        match error {
            RankError::Embedding(e) => Self::Embedding(e),
            RankError::Distance(e) => Self::Distance(e),
        }
    }
}

impl ScreeningError {
    /// Whether this error points at a programming defect.
    pub fn is_defect(&self) -> bool {
        matches!(self, Self::Distance(_))
    }

    /// Message shown to the user for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::Embedding(e) => format!("The tender evaluation failed: {}", e),
            Self::Distance(e) => format!("Internal error while comparing tenders: {}", e),
            Self::Notify(e) => format!("The results could not be emailed: {}", e),
        }
    }
}

/// Result type for screening operations.
pub type ScreeningResult<T> = Result<T, ScreeningError>;

/// The listing retrieved for one run.
#[derive(Debug, Clone)]
pub struct ScreeningSession {
    candidates: Vec<Candidate>,
    error: Option<String>,
    source: String,
    retrieved_at: DateTime<Utc>,
}

impl ScreeningSession {
    /// Retrieves the listing. A retrieval failure leaves the session empty
    /// with the error message kept for display.
    pub async fn open<S: CandidateSource + ?Sized>(source: &S) -> Self {
        let description = source.describe();
        let (candidates, error) = match source.retrieve().await {
            Ok(candidates) => {
                tracing::info!(source = %description, candidates = candidates.len(), "Retrieved listing");
                (candidates, None)
            }
            Err(e) => {
                tracing::error!(source = %description, error = %e, "Listing retrieval failed");
                (Vec::new(), Some(format!("Access to the tender listing failed: {}", e)))
            }
        };

        Self {
            candidates,
            error,
            source: description,
            retrieved_at: Utc::now(),
        }
    }

    /// A session over an already known listing.
    pub fn from_candidates(candidates: Vec<Candidate>) -> Self {
        Self {
            candidates,
            error: None,
            source: "memory".to_string(),
            retrieved_at: Utc::now(),
        }
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Retrieval error message, if the listing could not be read.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn retrieved_at(&self) -> DateTime<Utc> {
        self.retrieved_at
    }
}

/// Subject and header line of the digest email.
#[derive(Debug, Clone)]
pub struct EmailTemplate {
    pub subject: String,
    pub header: String,
}

impl Default for EmailTemplate {
    fn default() -> Self {
        Self {
            subject: "Newsletter-Auswertung".to_string(),
            header: "The tender listing evaluation found the following:".to_string(),
        }
    }
}

/// Outcome of a complete run.
///
/// A failed send is kept next to the digest it was meant to deliver.
#[derive(Debug)]
pub struct RunReport {
    pub digest: Digest,
    pub notification: NotifyResult<NotifyOutcome>,
}

/// Orchestrates ranking, digest building and notification.
pub struct ScreeningService<P, M> {
    ranker: SimilarityRanker<P>,
    builder: DigestBuilder,
    notifier: Notifier<M>,
    template: EmailTemplate,
}

impl<P: EmbeddingProvider, M: Mailer> ScreeningService<P, M> {
    pub fn new(
        ranker: SimilarityRanker<P>,
        builder: DigestBuilder,
        notifier: Notifier<M>,
        template: EmailTemplate,
    ) -> Self {
        Self {
            ranker,
            builder,
            notifier,
            template,
        }
    }

    pub fn ranker(&self) -> &SimilarityRanker<P> {
        &self.ranker
    }

    pub fn template(&self) -> &EmailTemplate {
        &self.template
    }

    /// Ranks the session's listing against `profile` and builds the digest.
    pub async fn evaluate(
        &self,
        session: &ScreeningSession,
        profile: &str,
    ) -> ScreeningResult<Digest> {
        let ranked = self
            .ranker
            .rank(profile, session.candidates().to_vec())
            .await?;
        Ok(self.builder.build(&ranked))
    }

    /// Mails the digest to `recipient`, if there is one.
    pub async fn notify(
        &self,
        digest: &Digest,
        recipient: Option<&str>,
    ) -> ScreeningResult<NotifyOutcome> {
        Ok(self.send_digest(digest, recipient).await?)
    }

    async fn send_digest(
        &self,
        digest: &Digest,
        recipient: Option<&str>,
    ) -> NotifyResult<NotifyOutcome> {
        if digest.is_empty() {
            return Ok(NotifyOutcome::Skipped(SkipReason::EmptyBody));
        }

        let body = digest.email_body(&self.template.header);
        self.notifier
            .notify(recipient, &self.template.subject, &body)
            .await
    }

    /// Evaluates the session and mails the digest. A degraded session is
    /// not evaluated. Only ranking failures abort the run; a mail failure
    /// is reported in [`RunReport::notification`].
    pub async fn run(
        &self,
        session: &ScreeningSession,
        profile: &str,
        recipient: Option<&str>,
    ) -> ScreeningResult<RunReport> {
        if session.is_degraded() {
            return Ok(RunReport {
                digest: Digest::default(),
                notification: Ok(NotifyOutcome::Skipped(SkipReason::EmptyBody)),
            });
        }

        let digest = self.evaluate(session, profile).await?;
        let notification = self.send_digest(&digest, recipient).await;
        if let Err(ref e) = notification {
            tracing::error!(error = %e, entries = digest.entries.len(), "Digest not delivered");
        }
        Ok(RunReport {
            digest,
            notification,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{Embedding, RankerConfig};
    use crate::providers::ai::EmbeddingResult;
    use crate::providers::email::{OutgoingEmail, TransportError};
    use crate::providers::source::RetrievalError;
    use crate::services::{Denylist, DigestConfig};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    struct MockProvider {
        vectors: HashMap<String, Vec<f32>>,
    }

    #[async_trait]
    impl EmbeddingProvider for MockProvider {
        fn name(&self) -> &str {
            "mock"
        }

        fn model(&self) -> &str {
            "mock"
        }

        async fn embed(&self, text: &str) -> EmbeddingResult<Embedding> {
            self.vectors
                .get(text)
                .cloned()
                .map(Embedding::new)
                .ok_or_else(|| EmbeddingError::Unavailable("quota exhausted".to_string()))
        }
    }

    #[derive(Default)]
    struct MockMailer {
        sent: Mutex<Vec<OutgoingEmail>>,
    }

    #[async_trait]
    impl Mailer for MockMailer {
        async fn send(&self, email: &OutgoingEmail) -> Result<String, TransportError> {
            self.sent.lock().unwrap().push(email.clone());
            Ok("<id@test>".to_string())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl CandidateSource for FailingSource {
        fn describe(&self) -> String {
            "failing".to_string()
        }

        async fn retrieve(&self) -> crate::providers::source::Result<Vec<Candidate>> {
            Err(RetrievalError::Timeout(10))
        }
    }

    fn service(
        vectors: &[(&str, &[f32])],
        mailer: Arc<MockMailer>,
    ) -> ScreeningService<MockProvider, Arc<MockMailer>> {
        let provider = MockProvider {
            vectors: vectors
                .iter()
                .map(|(t, v)| (t.to_string(), v.to_vec()))
                .collect(),
        };
        ScreeningService::new(
            SimilarityRanker::new(provider, RankerConfig::default()),
            DigestBuilder::new(DigestConfig {
                top_k: 2,
                denylist: Denylist::default(),
                low_confidence_threshold: 0.18,
            }),
            Notifier::new(mailer).with_settle_delay(Duration::ZERO),
            EmailTemplate::default(),
        )
    }

    #[tokio::test]
    async fn degraded_session_keeps_message() {
        let session = ScreeningSession::open(&FailingSource).await;
        assert!(session.is_empty());
        assert!(session.is_degraded());
        assert!(session.error().unwrap().contains("not available after 10 seconds"));
    }

    #[tokio::test]
    async fn degraded_session_skips_evaluation() {
        let mailer = Arc::new(MockMailer::default());
        let service = service(&[], Arc::clone(&mailer));
        let session = ScreeningSession::open(&FailingSource).await;

        let report = service.run(&session, "profile", Some("a@b.de")).await.unwrap();
        assert!(report.digest.entries.is_empty());
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn run_mails_digest_with_header() {
        let mailer = Arc::new(MockMailer::default());
        let service = service(
            &[("profile", &[1.0, 0.0]), ("A", &[1.0, 0.0]), ("B", &[0.0, 1.0])],
            Arc::clone(&mailer),
        );
        let session = ScreeningSession::from_candidates(Candidate::enumerate(["A", "B"]));

        let report = service.run(&session, "profile", Some("person@example.org")).await.unwrap();

        assert!(report.notification.as_ref().unwrap().is_sent());
        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent[0].subject, "Newsletter-Auswertung");
        assert!(sent[0]
            .body
            .starts_with("The tender listing evaluation found the following:\n\nTender 0\nA\n"));
    }

    #[tokio::test]
    async fn embedding_failure_is_user_facing() {
        let mailer = Arc::new(MockMailer::default());
        let service = service(&[("profile", &[1.0])], mailer);
        let session = ScreeningSession::from_candidates(Candidate::enumerate(["A"]));

        let err = service.evaluate(&session, "profile").await.unwrap_err();
        assert!(!err.is_defect());
        assert!(err.user_message().contains("quota exhausted"));
    }

    #[tokio::test]
    async fn zero_vector_is_a_defect() {
        let mailer = Arc::new(MockMailer::default());
        let service = service(&[("profile", &[1.0, 0.0]), ("A", &[0.0, 0.0])], mailer);
        let session = ScreeningSession::from_candidates(Candidate::enumerate(["A"]));

        let err = service.evaluate(&session, "profile").await.unwrap_err();
        assert!(err.is_defect());
    }

    #[tokio::test]
    async fn empty_digest_is_not_mailed() {
        let mailer = Arc::new(MockMailer::default());
        let service = service(&[("profile", &[1.0])], Arc::clone(&mailer));
        let session = ScreeningSession::from_candidates(vec![]);

        let report = service.run(&session, "profile", Some("a@b.de")).await.unwrap();
        assert_eq!(
            report.notification.unwrap(),
            NotifyOutcome::Skipped(SkipReason::EmptyBody)
        );
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    struct DownMailer;

    #[async_trait]
    impl Mailer for DownMailer {
        async fn send(&self, _email: &OutgoingEmail) -> Result<String, TransportError> {
            Err(TransportError::Connection("relay down".to_string()))
        }
    }

    #[tokio::test]
    async fn transport_failure_keeps_digest() {
        let provider = MockProvider {
            vectors: [("profile", vec![1.0, 0.0]), ("A", vec![1.0, 0.0])]
                .into_iter()
                .map(|(t, v)| (t.to_string(), v))
                .collect(),
        };
        let service = ScreeningService::new(
            SimilarityRanker::new(provider, RankerConfig::default()),
            DigestBuilder::new(DigestConfig {
                top_k: 1,
                ..DigestConfig::default()
            }),
            Notifier::new(DownMailer).with_settle_delay(Duration::ZERO),
            EmailTemplate::default(),
        );
        let session = ScreeningSession::from_candidates(Candidate::enumerate(["A"]));

        let report = service.run(&session, "profile", Some("a@b.de")).await.unwrap();

        assert_eq!(report.digest.entries.len(), 1);
        assert_eq!(report.digest.entries[0].text, "A");
        assert!(matches!(
            report.notification,
            Err(NotifyError::Transport(TransportError::Connection(_)))
        ));

        let err = service.notify(&report.digest, Some("a@b.de")).await.unwrap_err();
        assert!(err.user_message().starts_with("The results could not be emailed"));
        assert!(!err.is_defect());
    }
}
