//! Similarity ranking of candidates against a query profile.
//!
//! The query is embedded first, then every candidate text. Candidate calls
//! are dispatched concurrently with a bounded pool; results are reassembled
//! in source order before scoring.

use futures::stream::{self, StreamExt, TryStreamExt};
use std::time::Duration;
use thiserror::Error;

use crate::domain::{Candidate, EmbeddedCandidate, RankedResult, ScoredCandidate};
use crate::embedding::{DistanceError, DistanceMetric, DistanceResult, Embedding};
use crate::providers::ai::{EmbeddingError, EmbeddingProvider, EmbeddingResult};

/// Errors from a ranking run.
#[derive(Debug, Error)]
pub enum RankError {
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("distance computation failed: {0}")]
    Distance(#[from] DistanceError),
}

pub type RankResult<T> = Result<T, RankError>;

/// Configuration for the similarity ranker.
#[derive(Debug, Clone)]
pub struct RankerConfig {
    pub metric: DistanceMetric,
    /// Maximum number of embedding calls in flight.
    pub concurrency: usize,
    /// Bound on each embedding call.
    pub timeout: Duration,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            metric: DistanceMetric::Cosine,
            concurrency: 4,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Ranks candidate texts by distance to a query text.
pub struct SimilarityRanker<P> {
    provider: P,
    config: RankerConfig,
}

impl<P: EmbeddingProvider> SimilarityRanker<P> {
    pub fn new(provider: P, config: RankerConfig) -> Self {
        Self { provider, config }
    }

    pub fn with_defaults(provider: P) -> Self {
        Self::new(provider, RankerConfig::default())
    }

    pub fn config(&self) -> &RankerConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Embeds the query and all candidates and ranks them by distance.
    ///
    /// The query is embedded even when there are no candidates.
    pub async fn rank(&self, query: &str, candidates: Vec<Candidate>) -> RankResult<RankedResult> {
        let query_embedding = self.embed_text(query).await?;
        tracing::debug!(
            dimension = query_embedding.dimension(),
            candidates = candidates.len(),
            "Embedded query profile"
        );

        let embedded = self.embed_candidates(candidates).await?;
        let ranked = score(&query_embedding, embedded, self.config.metric)?;

        if let Some(best) = ranked.best() {
            tracing::info!(
                metric = %self.config.metric,
                ranked = ranked.len(),
                best_id = %best.id(),
                best_distance = best.distance(),
                "Ranked candidates"
            );
        }
        Ok(ranked)
    }

    async fn embed_text(&self, text: &str) -> EmbeddingResult<Embedding> {
        tokio::time::timeout(self.config.timeout, self.provider.embed(text))
            .await
            .map_err(|_| EmbeddingError::Timeout(self.config.timeout.as_secs()))?
    }

    async fn embed_candidates(
        &self,
        candidates: Vec<Candidate>,
    ) -> EmbeddingResult<Vec<EmbeddedCandidate>> {
        // `buffered` yields in input order regardless of completion order.
        stream::iter(candidates)
            .map(|candidate| async move {
                let embedding = self.embed_text(&candidate.text).await?;
                Ok::<_, EmbeddingError>(EmbeddedCandidate::new(candidate, embedding))
            })
            .buffered(self.config.concurrency.max(1))
            .try_collect()
            .await
    }
}

/// Scores embedded candidates against a query embedding and sorts them.
pub fn score(
    query: &Embedding,
    embedded: Vec<EmbeddedCandidate>,
    metric: DistanceMetric,
) -> DistanceResult<RankedResult> {
    let scored = embedded
        .into_iter()
        .map(|candidate| {
            let distance = metric.distance(query.as_slice(), candidate.embedding.as_slice())?;
            Ok(ScoredCandidate::new(candidate, distance))
        })
        .collect::<DistanceResult<Vec<_>>>()?;

    Ok(RankedResult::from_scored(scored))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CandidateId;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Looks embeddings up by text, optionally delaying each call.
    struct MockProvider {
        vectors: HashMap<String, Vec<f32>>,
        delays: HashMap<String, Duration>,
        calls: Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl MockProvider {
        fn new(pairs: &[(&str, &[f32])]) -> Self {
            Self {
                vectors: pairs
                    .iter()
                    .map(|(t, v)| (t.to_string(), v.to_vec()))
                    .collect(),
                delays: HashMap::new(),
                calls: Mutex::new(Vec::new()),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }

        fn with_delay(mut self, text: &str, delay: Duration) -> Self {
            self.delays.insert(text.to_string(), delay);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EmbeddingProvider for MockProvider {
        fn name(&self) -> &str {
            "mock"
        }

        fn model(&self) -> &str {
            "mock-model"
        }

        async fn embed(&self, text: &str) -> EmbeddingResult<Embedding> {
            self.calls.lock().unwrap().push(text.to_string());
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            if let Some(delay) = self.delays.get(text) {
                tokio::time::sleep(*delay).await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.vectors
                .get(text)
                .cloned()
                .map(Embedding::new)
                .ok_or_else(|| EmbeddingError::Unavailable(format!("no vector for {}", text)))
        }
    }

    fn candidates(texts: &[&str]) -> Vec<Candidate> {
        Candidate::enumerate(texts.iter().copied())
    }

    #[tokio::test]
    async fn ranks_by_cosine_distance() {
        let provider = MockProvider::new(&[
            ("profile", &[1.0, 0.0]),
            ("A", &[1.0, 0.0]),
            ("B", &[0.0, 1.0]),
            ("C", &[0.9, 0.1]),
        ]);
        let ranker = SimilarityRanker::with_defaults(provider);

        let ranked = ranker.rank("profile", candidates(&["A", "B", "C"])).await.unwrap();

        assert_eq!(ranked.ids(), vec![CandidateId(0), CandidateId(2), CandidateId(1)]);
        let distances: Vec<f64> = ranked.iter().map(|s| s.distance()).collect();
        assert!(distances[0].abs() < 1e-9);
        assert!(distances[1] > 0.0 && distances[1] < 0.01);
        assert!((distances[2] - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn empty_candidates_still_embed_query() {
        let provider = Arc::new(MockProvider::new(&[("profile", &[1.0])]));
        let ranker = SimilarityRanker::with_defaults(Arc::clone(&provider));

        let ranked = ranker.rank("profile", vec![]).await.unwrap();

        assert!(ranked.is_empty());
        assert_eq!(provider.calls(), vec!["profile".to_string()]);
    }

    #[tokio::test]
    async fn concurrent_results_keep_source_order() {
        let provider = Arc::new(
            MockProvider::new(&[
                ("q", &[1.0, 0.0]),
                ("slow", &[0.5, 0.5]),
                ("fast", &[0.5, 0.5]),
                ("mid", &[0.5, 0.5]),
            ])
            .with_delay("slow", Duration::from_millis(40))
            .with_delay("mid", Duration::from_millis(20)),
        );
        let ranker = SimilarityRanker::new(
            Arc::clone(&provider),
            RankerConfig {
                concurrency: 3,
                ..RankerConfig::default()
            },
        );

        let ranked = ranker.rank("q", candidates(&["slow", "fast", "mid"])).await.unwrap();

        // Identical distances, so ranking order falls back to source order.
        assert_eq!(ranked.ids(), vec![CandidateId(0), CandidateId(1), CandidateId(2)]);
        let texts: Vec<&str> = ranked.iter().map(|s| s.text()).collect();
        assert_eq!(texts, vec!["slow", "fast", "mid"]);
        assert!(provider.max_in_flight.load(Ordering::SeqCst) > 1);
    }

    #[tokio::test]
    async fn concurrency_is_bounded() {
        let texts: Vec<String> = (0..8).map(|i| format!("t{}", i)).collect();
        let mut provider = MockProvider::new(&[("q", &[1.0])]);
        for text in &texts {
            provider.vectors.insert(text.clone(), vec![1.0]);
            provider.delays.insert(text.clone(), Duration::from_millis(5));
        }
        let provider = Arc::new(provider);
        let ranker = SimilarityRanker::new(
            Arc::clone(&provider),
            RankerConfig {
                concurrency: 2,
                ..RankerConfig::default()
            },
        );

        ranker.rank("q", Candidate::enumerate(texts)).await.unwrap();

        assert!(provider.max_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn embedding_failure_propagates() {
        let provider = MockProvider::new(&[("q", &[1.0, 0.0]), ("A", &[1.0, 0.0])]);
        let ranker = SimilarityRanker::with_defaults(provider);

        let result = ranker.rank("q", candidates(&["A", "missing"])).await;
        assert!(matches!(result, Err(RankError::Embedding(EmbeddingError::Unavailable(_)))));
    }

    #[tokio::test]
    async fn query_failure_skips_candidates() {
        let provider = Arc::new(MockProvider::new(&[("A", &[1.0])]));
        let ranker = SimilarityRanker::with_defaults(Arc::clone(&provider));

        let result = ranker.rank("q", candidates(&["A"])).await;
        assert!(matches!(result, Err(RankError::Embedding(_))));
        assert_eq!(provider.calls(), vec!["q".to_string()]);
    }

    #[tokio::test]
    async fn slow_embedding_times_out() {
        let provider = MockProvider::new(&[("q", &[1.0])])
            .with_delay("q", Duration::from_millis(200));
        let ranker = SimilarityRanker::new(
            provider,
            RankerConfig {
                timeout: Duration::from_millis(10),
                ..RankerConfig::default()
            },
        );

        let result = ranker.rank("q", vec![]).await;
        assert!(matches!(result, Err(RankError::Embedding(EmbeddingError::Timeout(_)))));
    }

    #[tokio::test]
    async fn dimension_mismatch_is_reported() {
        let provider = MockProvider::new(&[("q", &[1.0, 0.0]), ("A", &[1.0, 0.0, 0.0])]);
        let ranker = SimilarityRanker::with_defaults(provider);

        let result = ranker.rank("q", candidates(&["A"])).await;
        assert!(matches!(
            result,
            Err(RankError::Distance(DistanceError::DimensionMismatch { left: 2, right: 3 }))
        ));
    }

    #[test]
    fn rescoring_ranked_result_is_idempotent() {
        let query = Embedding::new(vec![1.0, 0.0]);
        let embedded = vec![
            EmbeddedCandidate::new(Candidate::new(0, "x"), Embedding::new(vec![0.0, 1.0])),
            EmbeddedCandidate::new(Candidate::new(1, "y"), Embedding::new(vec![1.0, 1.0])),
            EmbeddedCandidate::new(Candidate::new(2, "z"), Embedding::new(vec![1.0, 1.0])),
            EmbeddedCandidate::new(Candidate::new(3, "w"), Embedding::new(vec![1.0, 0.0])),
        ];

        for metric in DistanceMetric::ALL {
            let first = score(&query, embedded.clone(), metric).unwrap();
            let order = first.ids();
            let second = score(&query, first.into_embedded(), metric).unwrap();
            assert_eq!(second.ids(), order, "{metric}");
        }
    }

    #[test]
    fn equal_distances_preserve_source_order() {
        let query = Embedding::new(vec![1.0, 0.0]);
        let embedded = vec![
            EmbeddedCandidate::new(Candidate::new(0, "first"), Embedding::new(vec![0.0, 2.0])),
            EmbeddedCandidate::new(Candidate::new(1, "second"), Embedding::new(vec![0.0, 1.0])),
        ];

        let ranked = score(&query, embedded, DistanceMetric::Cosine).unwrap();
        assert_eq!(ranked.ids(), vec![CandidateId(0), CandidateId(1)]);
    }
}
