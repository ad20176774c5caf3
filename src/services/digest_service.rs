//! Builds the digest of best matches from a ranked result.
//!
//! Only the first `top_k` ranked candidates are considered. A candidate
//! removed by the denylist still uses up one of those slots, so a digest can
//! hold fewer than `top_k` entries. The low-confidence check looks at the
//! best-ranked candidate only, whether or not it survives the denylist.

use crate::domain::{Digest, DigestEntry, RankedResult, LOW_CONFIDENCE_WARNING};
use crate::services::Denylist;

/// Default distance above which the best match counts as weak.
pub const DEFAULT_LOW_CONFIDENCE_THRESHOLD: f64 = 0.18;

/// Default number of ranked candidates considered.
pub const DEFAULT_TOP_K: usize = 3;

/// Digest selection parameters.
#[derive(Debug, Clone)]
pub struct DigestConfig {
    /// Number of best-ranked candidates considered.
    pub top_k: usize,
    /// Denylist applied to each considered candidate.
    pub denylist: Denylist,
    /// Best-match distance above which the warning is set.
    pub low_confidence_threshold: f64,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            denylist: Denylist::default(),
            low_confidence_threshold: DEFAULT_LOW_CONFIDENCE_THRESHOLD,
        }
    }
}

/// Turns ranked candidates into a [`Digest`].
#[derive(Debug, Clone, Default)]
pub struct DigestBuilder {
    config: DigestConfig,
}

impl DigestBuilder {
    pub fn new(config: DigestConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DigestConfig {
        &self.config
    }

    pub fn build(&self, ranked: &RankedResult) -> Digest {
        let mut digest = Digest::default();

        for (rank, scored) in ranked.iter().take(self.config.top_k).enumerate() {
            if rank == 0 && scored.distance() > self.config.low_confidence_threshold {
                tracing::info!(
                    distance = scored.distance(),
                    threshold = self.config.low_confidence_threshold,
                    "Best match below confidence threshold"
                );
                digest.warning = Some(LOW_CONFIDENCE_WARNING.to_string());
                digest.raw_body.push_str(LOW_CONFIDENCE_WARNING);
                digest.raw_body.push_str("\n\n");
            }

            if let Some(term) = self.config.denylist.matching_term(scored.text()) {
                tracing::debug!(id = %scored.id(), term, "Candidate excluded by denylist");
                continue;
            }

            let entry = DigestEntry::from_scored(scored);
            digest.raw_body.push_str(&entry.block());
            digest.raw_body.push_str("\n\n");
            digest.entries.push(entry);
        }

        tracing::debug!(
            considered = ranked.len().min(self.config.top_k),
            entries = digest.entries.len(),
            warning = digest.warning.is_some(),
            "Built digest"
        );
        digest
    }
}

/// Builds a digest without constructing a [`DigestBuilder`].
pub fn build(
    ranked: &RankedResult,
    top_k: usize,
    denylist: &Denylist,
    low_confidence_threshold: f64,
) -> Digest {
    DigestBuilder::new(DigestConfig {
        top_k,
        denylist: denylist.clone(),
        low_confidence_threshold,
    })
    .build(ranked)
}
