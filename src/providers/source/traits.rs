//! Candidate source trait definition.

use async_trait::async_trait;

use crate::domain::Candidate;

/// Result type alias for retrieval operations.
pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Errors that can occur while retrieving the tender listing.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    /// Network or connection error.
    #[error("listing request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The listing server answered with a non-success status.
    #[error("listing server returned HTTP {0}")]
    Status(u16),

    /// The listing did not become available in time.
    #[error("listing not available after {0} seconds")]
    Timeout(u64),

    /// The page contained no table.
    #[error("no listing table found in page")]
    TableNotFound,

    /// The table lacks the column holding tender descriptions.
    #[error("listing table has no column named {0:?}")]
    MissingColumn(String),

    /// Reading a saved listing failed.
    #[error("failed to read listing: {0}")]
    Io(#[from] std::io::Error),
}

/// Capability that produces the current tender listing in source order.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// Short description used in log output.
    fn describe(&self) -> String;

    /// Retrieves all candidates, numbered in source order.
    async fn retrieve(&self) -> Result<Vec<Candidate>>;
}
