//! Ollama embedding provider.
//!
//! Ollama exposes an OpenAI-compatible API, so this is a thin wrapper
//! around OpenAiEmbeddingProvider with Ollama-specific defaults.

use async_trait::async_trait;

use super::openai::OpenAiEmbeddingProvider;
use super::traits::{EmbeddingProvider, EmbeddingResult};
use crate::embedding::Embedding;

/// Default Ollama API URL.
const OLLAMA_DEFAULT_URL: &str = "http://localhost:11434/v1";

/// Provider for embeddings served by a local Ollama instance.
pub struct OllamaEmbeddingProvider {
    inner: OpenAiEmbeddingProvider,
}

impl OllamaEmbeddingProvider {
    /// Creates a new Ollama provider with default localhost URL.
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_url(OLLAMA_DEFAULT_URL, model)
    }

    /// Creates a new Ollama provider with a custom URL.
    pub fn with_url(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            inner: OpenAiEmbeddingProvider::custom(base_url, None, model),
        }
    }

    /// Creates a provider with the nomic-embed-text model.
    pub fn nomic() -> Self {
        Self::new("nomic-embed-text")
    }

    /// Overrides the HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.inner = self.inner.with_client(client);
        self
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbeddingProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    async fn embed(&self, text: &str) -> EmbeddingResult<Embedding> {
        self.inner.embed(text).await
    }
}
