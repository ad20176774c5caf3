//! The digest of best-matching tenders produced by one screening run.

use serde::Serialize;
use std::fmt;

use super::{CandidateId, ScoredCandidate};

/// Banner shown when even the best match is a weak one.
pub const LOW_CONFIDENCE_WARNING: &str =
    "This listing probably contains no relevant tenders!";

/// One tender selected for the digest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DigestEntry {
    pub id: CandidateId,
    pub text: String,
    /// `(1 - distance) * 100`.
    pub match_percentage: f64,
}

impl DigestEntry {
    pub fn from_scored(scored: &ScoredCandidate) -> Self {
        Self {
            id: scored.id(),
            text: scored.text().to_string(),
            match_percentage: scored.match_percentage(),
        }
    }

    /// Plain-text block used both on screen and in the email body.
    pub fn block(&self) -> String {
        format!(
            "Tender {}\n{}\nMatch: {:.2} %",
            self.id, self.text, self.match_percentage
        )
    }
}

/// Result of a screening run. Built once, rendered or mailed, then dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Digest {
    /// Low-confidence banner, set when the best match is too distant.
    pub warning: Option<String>,
    /// Selected tenders in ranking order.
    pub entries: Vec<DigestEntry>,
    /// Warning and entry blocks, each followed by a blank line.
    pub raw_body: String,
}

impl Digest {
    /// Whether there is anything worth mailing.
    pub fn is_empty(&self) -> bool {
        self.raw_body.trim().is_empty()
    }

    /// Rendering sequence for the host display: banner first, then entries.
    pub fn render(&self) -> Vec<String> {
        self.warning
            .iter()
            .cloned()
            .chain(self.entries.iter().map(DigestEntry::block))
            .collect()
    }

    /// Email body: header, blank line, then the digest body.
    pub fn email_body(&self, header: &str) -> String {
        format!("{}\n\n{}", header, self.raw_body)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw_body)
    }
}
