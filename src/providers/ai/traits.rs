//! Embedding provider trait and supporting types.

use async_trait::async_trait;
use thiserror::Error;

use crate::embedding::Embedding;

/// Errors that can occur while embedding text.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Rate limited, retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Embedding request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Provider not available: {0}")]
    Unavailable(String),
}

/// Result type for embedding operations.
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// Capability that turns text into a fixed-dimension vector.
///
/// Calls are independent and side-effect free, so callers may issue them
/// concurrently.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Returns the provider's name (e.g., "openai", "ollama").
    fn name(&self) -> &str;

    /// Returns the model identifier being used.
    fn model(&self) -> &str;

    /// Embeds a single text.
    async fn embed(&self, text: &str) -> EmbeddingResult<Embedding>;
}

#[async_trait]
impl<P: EmbeddingProvider + ?Sized> EmbeddingProvider for std::sync::Arc<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn model(&self) -> &str {
        (**self).model()
    }

    async fn embed(&self, text: &str) -> EmbeddingResult<Embedding> {
        (**self).embed(text).await
    }
}

#[async_trait]
impl<P: EmbeddingProvider + ?Sized> EmbeddingProvider for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn model(&self) -> &str {
        (**self).model()
    }

    async fn embed(&self, text: &str) -> EmbeddingResult<Embedding> {
        (**self).embed(text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        let err = EmbeddingError::ApiError {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 500 - boom");
        assert_eq!(
            EmbeddingError::Timeout(30).to_string(),
            "Embedding request timed out after 30 seconds"
        );
    }
}
