//! Keyword denylist applied to candidate texts.
//!
//! A candidate passes when none of the denylist terms occurs in its text,
//! compared case-insensitively.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Lower-cased, trimmed substrings that exclude a candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Denylist {
    terms: Vec<String>,
}

impl Denylist {
    /// Builds a denylist from raw terms. Terms that are empty after
    /// trimming are dropped, since they would match every text.
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for term in terms {
            let term = term.as_ref().trim().to_lowercase();
            if !term.is_empty() && !normalized.contains(&term) {
                normalized.push(term);
            }
        }
        Self { terms: normalized }
    }

    /// Parses a comma-separated line such as `"Bau, Reinigung ,catering"`.
    pub fn parse(line: &str) -> Self {
        Self::new(line.split(','))
    }

    /// Reads a comma-separated denylist file.
    pub fn from_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(Self::parse(&contents))
    }

    /// Combines two denylists.
    pub fn merge(mut self, other: Denylist) -> Self {
        for term in other.terms {
            if !self.terms.contains(&term) {
                self.terms.push(term);
            }
        }
        self
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether `text` contains none of the denylist terms.
    pub fn passes(&self, text: &str) -> bool {
        if self.terms.is_empty() {
            return true;
        }
        let lowered = text.to_lowercase();
        !self.terms.iter().any(|term| lowered.contains(term.as_str()))
    }

    /// The first term found in `text`, if any.
    pub fn matching_term(&self, text: &str) -> Option<&str> {
        let lowered = text.to_lowercase();
        self.terms
            .iter()
            .find(|term| lowered.contains(term.as_str()))
            .map(String::as_str)
    }
}

/// Free-function form of [`Denylist::passes`].
pub fn passes(text: &str, denylist: &Denylist) -> bool {
    denylist.passes(text)
}
