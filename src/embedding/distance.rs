//! Distance metrics between embedding vectors.
//!
//! All metrics return a distance where **lower is more similar**. Arithmetic
//! is carried out in `f64` so scores are stable across metrics and inputs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Contract violations when comparing two vectors.
///
/// These indicate a caller bug (mixed models, a broken provider) rather than
/// a recoverable runtime condition.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DistanceError {
    #[error("dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    /// Cosine distance is undefined for an all-zero vector.
    #[error("cosine distance undefined for a zero vector")]
    ZeroVector,
}

pub type DistanceResult<T> = Result<T, DistanceError>;

/// Distance metric used to compare a candidate embedding with the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DistanceMetric {
    /// Cosine distance: `1 - cos(a, b)`. Range: \[0, 2\].
    #[default]
    #[serde(rename = "cosine")]
    Cosine,
    /// Manhattan distance: sum of absolute differences.
    L1,
    /// Euclidean distance.
    L2,
    /// Chebyshev distance: largest absolute difference.
    Linf,
}

impl DistanceMetric {
    pub const ALL: [DistanceMetric; 4] = [Self::Cosine, Self::L1, Self::L2, Self::Linf];

    /// Name used in settings and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::L1 => "L1",
            Self::L2 => "L2",
            Self::Linf => "Linf",
        }
    }

    /// Computes the distance between `a` and `b`.
    pub fn distance(&self, a: &[f32], b: &[f32]) -> DistanceResult<f64> {
        if a.len() != b.len() {
            return Err(DistanceError::DimensionMismatch {
                left: a.len(),
                right: b.len(),
            });
        }

        let pairs = a.iter().zip(b).map(|(x, y)| (f64::from(*x), f64::from(*y)));

        match self {
            Self::Cosine => cosine(a, b),
            Self::L1 => Ok(pairs.map(|(x, y)| (x - y).abs()).sum()),
            Self::L2 => Ok(pairs.map(|(x, y)| (x - y) * (x - y)).sum::<f64>().sqrt()),
            Self::Linf => Ok(pairs.map(|(x, y)| (x - y).abs()).fold(0.0, f64::max)),
        }
    }
}

fn cosine(a: &[f32], b: &[f32]) -> DistanceResult<f64> {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Err(DistanceError::ZeroVector);
    }

    Ok(1.0 - dot / (norm_a.sqrt() * norm_b.sqrt()))
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown distance metric: {} (expected cosine, L1, L2 or Linf)", s))
    }
}
