//! Tender candidates and their ranking stages.
//!
//! A [`Candidate`] is read once from the listing source and never changes.
//! The ranker attaches an embedding ([`EmbeddedCandidate`]) and then a
//! distance to the query profile ([`ScoredCandidate`]). A [`RankedResult`]
//! is the ascending-distance ordering of scored candidates.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::embedding::Embedding;

/// Ordinal position of a candidate in the source listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CandidateId(pub usize);

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for CandidateId {
    fn from(ordinal: usize) -> Self {
        Self(ordinal)
    }
}

/// One tender entry from the listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Position in source order.
    pub id: CandidateId,
    /// Free-text tender description.
    pub text: String,
}

impl Candidate {
    /// Creates a candidate at the given source position.
    pub fn new(id: impl Into<CandidateId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }

    /// Builds candidates from texts, numbering them in iteration order.
    pub fn enumerate<I, S>(texts: I) -> Vec<Candidate>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        texts
            .into_iter()
            .enumerate()
            .map(|(ordinal, text)| Candidate::new(ordinal, text))
            .collect()
    }
}

/// A candidate together with the embedding of its text.
#[derive(Debug, Clone)]
pub struct EmbeddedCandidate {
    pub candidate: Candidate,
    pub embedding: Embedding,
}

impl EmbeddedCandidate {
    pub fn new(candidate: Candidate, embedding: Embedding) -> Self {
        Self {
            candidate,
            embedding,
        }
    }
}

/// An embedded candidate annotated with its distance to the query.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub embedded: EmbeddedCandidate,
    distance: f64,
}

impl ScoredCandidate {
    pub(crate) fn new(embedded: EmbeddedCandidate, distance: f64) -> Self {
        Self { embedded, distance }
    }

    pub fn id(&self) -> CandidateId {
        self.embedded.candidate.id
    }

    pub fn text(&self) -> &str {
        &self.embedded.candidate.text
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Match score shown to the user: `(1 - distance) * 100`.
    pub fn match_percentage(&self) -> f64 {
        (1.0 - self.distance) * 100.0
    }
}

/// Scored candidates in ascending distance order, ties by identifier.
#[derive(Debug, Clone, Default)]
pub struct RankedResult {
    items: Vec<ScoredCandidate>,
}

impl RankedResult {
    /// Sorts the scored candidates into ranking order.
    pub fn from_scored(mut items: Vec<ScoredCandidate>) -> Self {
        items.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.id().cmp(&b.id()))
        });
        Self { items }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScoredCandidate> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The best-ranked candidate, if any.
    pub fn best(&self) -> Option<&ScoredCandidate> {
        self.items.first()
    }

    /// Identifiers in ranking order.
    pub fn ids(&self) -> Vec<CandidateId> {
        self.items.iter().map(ScoredCandidate::id).collect()
    }

    /// Drops the distances, keeping the ranked order of embedded candidates.
    pub fn into_embedded(self) -> Vec<EmbeddedCandidate> {
        self.items.into_iter().map(|s| s.embedded).collect()
    }
}

impl<'a> IntoIterator for &'a RankedResult {
    type Item = &'a ScoredCandidate;
    type IntoIter = std::slice::Iter<'a, ScoredCandidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
