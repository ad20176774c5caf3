//! Vector embeddings and similarity ranking.
//!
//! # Architecture
//!
//! - [`Embedding`] - A vector representation of text semantics
//! - [`DistanceMetric`] - Cosine, L1, L2 and Linf distances between embeddings
//! - [`SimilarityRanker`] - Embeds a query and candidates and sorts by distance
//!
//! # Example
//!
//! ```ignore
//! use tenderwatch::embedding::{RankerConfig, SimilarityRanker};
//!
//! let ranker = SimilarityRanker::new(provider, RankerConfig::default());
//! let ranked = ranker.rank(&profile, candidates).await?;
//! ```

mod distance;
mod ranker;
mod vector;

pub use distance::{DistanceError, DistanceMetric, DistanceResult};
pub use ranker::{score, RankError, RankResult, RankerConfig, SimilarityRanker};
pub use vector::Embedding;
