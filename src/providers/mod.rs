//! External collaborators of the screening pipeline.
//!
//! - [`ai`] - Embedding providers (OpenAI-compatible, Ollama)
//! - [`email`] - Mail transport (SMTP)
//! - [`source`] - Tender listing retrieval

pub mod ai;
pub mod email;
pub mod source;
