//! Listing read from a local file.
//!
//! Accepts a saved listing page (parsed like the live page) or plain text
//! with one tender per non-empty line.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::table::parse_listing_table;
use super::{CandidateSource, Result};
use crate::domain::Candidate;

pub struct FileListingSource {
    path: PathBuf,
    text_column: String,
}

impl FileListingSource {
    pub fn new(path: impl Into<PathBuf>, text_column: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text_column: text_column.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse(&self, contents: &str) -> Result<Vec<Candidate>> {
        if contents.to_ascii_lowercase().contains("<table") {
            return parse_listing_table(contents, &self.text_column);
        }

        Ok(Candidate::enumerate(
            contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty()),
        ))
    }
}

#[async_trait]
impl CandidateSource for FileListingSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn retrieve(&self) -> Result<Vec<Candidate>> {
        let contents = tokio::fs::read_to_string(&self.path).await?;
        let candidates = self.parse(&contents)?;
        tracing::info!(
            path = %self.path.display(),
            candidates = candidates.len(),
            "Read saved listing"
        );
        Ok(candidates)
    }
}
