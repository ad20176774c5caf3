//! Domain types for tender screening.
//!
//! Candidates flow through the ranking stages defined in [`candidate`] and
//! end up as a [`Digest`].

mod candidate;
mod digest;

pub use candidate::{Candidate, CandidateId, EmbeddedCandidate, RankedResult, ScoredCandidate};
pub use digest::{Digest, DigestEntry, LOW_CONFIDENCE_WARNING};
