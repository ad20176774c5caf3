//! Public tender listing fetched over HTTP.
//!
//! Submits the listing's search form (tender category and page size) and
//! extracts candidates from the result table. The request is bounded by a
//! timeout so an unresponsive listing surfaces as an error instead of
//! stalling the run.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;

use super::table::{parse_listing_table, DEFAULT_TEXT_COLUMN};
use super::{CandidateSource, Result, RetrievalError};
use crate::domain::Candidate;

/// Search page of the public tender listing.
pub const HAD_URL: &str = "https://www.had.de/onlinesuche_einfach.html";

/// Listing retrieval configuration.
#[derive(Debug, Clone)]
pub struct ListingConfig {
    /// Search form URL.
    pub url: String,
    /// Form fields submitted with the search.
    pub form: BTreeMap<String, String>,
    /// Header of the column holding the tender text.
    pub text_column: String,
    /// Bound on the whole request.
    pub timeout: Duration,
}

impl Default for ListingConfig {
    fn default() -> Self {
        // Only the category is known. The results-per-page radio (value 500)
        // has no known field name, so the site's default page size applies
        // until it is added to `form`.
        let form = [("L_CAT", "SQLB")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            url: HAD_URL.to_string(),
            form,
            text_column: DEFAULT_TEXT_COLUMN.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// [`CandidateSource`] backed by the public listing website.
pub struct HadListingSource {
    client: reqwest::Client,
    config: ListingConfig,
}

impl HadListingSource {
    pub fn new(config: ListingConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Overrides the HTTP client (useful for proxies).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn config(&self) -> &ListingConfig {
        &self.config
    }

    fn map_error(&self, error: reqwest::Error) -> RetrievalError {
        if error.is_timeout() {
            RetrievalError::Timeout(self.config.timeout.as_secs())
        } else {
            RetrievalError::Http(error)
        }
    }
}

#[async_trait]
impl CandidateSource for HadListingSource {
    fn describe(&self) -> String {
        self.config.url.clone()
    }

    async fn retrieve(&self) -> Result<Vec<Candidate>> {
        tracing::info!(url = %self.config.url, "Fetching tender listing");

        let response = self
            .client
            .post(&self.config.url)
            .form(&self.config.form)
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RetrievalError::Status(status.as_u16()));
        }

        let html = response.text().await.map_err(|e| self.map_error(e))?;
        parse_listing_table(&html, &self.config.text_column)
    }
}
