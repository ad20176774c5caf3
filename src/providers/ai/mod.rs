//! Embedding provider implementations.
//!
//! # Supported Providers
//!
//! - **OpenAI-compatible**: Works with OpenAI, vLLM, LM Studio, and other compatible endpoints
//! - **Ollama**: Local embedding models via Ollama
//!
//! # Example
//!
//! ```rust,no_run
//! use tenderwatch::providers::ai::{EmbeddingProvider, OpenAiEmbeddingProvider};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let openai = OpenAiEmbeddingProvider::openai("sk-...", "text-embedding-ada-002");
//! let embedding = openai.embed("Feasibility study for a district heating network").await?;
//! println!("dimension: {}", embedding.dimension());
//! # Ok(())
//! # }
//! ```

mod ollama;
mod openai;
mod traits;

pub use ollama::OllamaEmbeddingProvider;
pub use openai::{OpenAiEmbeddingProvider, DEFAULT_EMBEDDING_MODEL};
pub use traits::{EmbeddingError, EmbeddingProvider, EmbeddingResult};
