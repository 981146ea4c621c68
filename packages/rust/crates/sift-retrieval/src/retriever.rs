//! Hybrid retriever: concurrent dense + sparse legs, weighted RRF, rerank,
//! and the degradation ladder.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{RetrievalConfig, validate_weights};
use crate::deadline::RequestDeadline;
use crate::error::RetrievalError;
use crate::fusion::{FusionWeights, apply_weighted_rrf, rank_dense_only};
use crate::ladder::{DegradationLadder, LadderLeg, classify_failure};
use crate::observability::RetrievalEvent;
use crate::traits::{QueryEmbedder, Reranker, SparseIndex, VectorIndex};
use crate::types::{Candidate, DegradationCause, IndexHit, RetrievalResult, RetrievalTier};

/// One retrieval request. Unset fields resolve from [`RetrievalConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalRequest {
    /// Query text.
    pub query: String,
    /// Restrict candidates to one domain.
    pub domain_filter: Option<String>,
    /// Result count override.
    pub top_k: Option<usize>,
    /// `(dense_weight, sparse_weight)` override.
    pub weights: Option<(f32, f32)>,
    /// Request-level deadline.
    pub deadline: RequestDeadline,
}

impl RetrievalRequest {
    /// Request for `query` with config defaults.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            domain_filter: None,
            top_k: None,
            weights: None,
            deadline: RequestDeadline::none(),
        }
    }

    /// Set the domain filter; blank values mean "all domains".
    #[must_use]
    pub fn domain(mut self, domain: Option<impl Into<String>>) -> Self {
        self.domain_filter = domain
            .map(Into::into)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        self
    }

    /// Set the result count.
    #[must_use]
    pub fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    /// Set stream weights.
    #[must_use]
    pub fn weights(mut self, dense_weight: f32, sparse_weight: f32) -> Self {
        self.weights = Some((dense_weight, sparse_weight));
        self
    }

    /// Attach the request deadline.
    #[must_use]
    pub fn deadline(mut self, deadline: RequestDeadline) -> Self {
        self.deadline = deadline;
        self
    }
}

type LegResult = Result<Vec<IndexHit>, RetrievalError>;

/// Dense + sparse retriever with reranking and graceful degradation.
#[derive(Clone)]
pub struct HybridRetriever {
    embedder: Arc<dyn QueryEmbedder>,
    vector_index: Arc<dyn VectorIndex>,
    sparse_index: Arc<dyn SparseIndex>,
    reranker: Option<Arc<dyn Reranker>>,
    config: RetrievalConfig,
}

impl HybridRetriever {
    /// Build a retriever. `reranker = None` means every call completes at HYBRID at best.
    #[must_use]
    pub fn new(
        embedder: Arc<dyn QueryEmbedder>,
        vector_index: Arc<dyn VectorIndex>,
        sparse_index: Arc<dyn SparseIndex>,
        reranker: Option<Arc<dyn Reranker>>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            embedder,
            vector_index,
            sparse_index,
            reranker,
            config,
        }
    }

    /// Resolved configuration.
    #[must_use]
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Positional form of [`Self::execute`].
    pub async fn retrieve(
        &self,
        query: &str,
        domain_filter: Option<&str>,
        top_k: usize,
        dense_weight: f32,
        sparse_weight: f32,
    ) -> RetrievalResult {
        let request = RetrievalRequest::new(query)
            .domain(domain_filter)
            .top_k(top_k)
            .weights(dense_weight, sparse_weight);
        self.execute(request).await
    }

    /// Run one retrieval call. Never fails: dependency failures move the call
    /// down the ladder and an unusable dense leg yields an empty FAILED result.
    pub async fn execute(&self, request: RetrievalRequest) -> RetrievalResult {
        let started = Instant::now();
        let RetrievalRequest {
            query,
            domain_filter,
            top_k,
            weights,
            deadline,
        } = request;
        let top_k = top_k.unwrap_or(self.config.top_k).max(1);
        let fusion = self.resolve_weights(weights);
        let pool_size = top_k.saturating_mul(self.config.oversample_factor.max(1));

        if deadline.is_expired() {
            tracing::warn!(
                event = RetrievalEvent::TierDowngraded.as_str(),
                from = RetrievalTier::Full.as_str(),
                to = RetrievalTier::Failed.as_str(),
                cause = DegradationCause::DeadlineExceeded.as_str(),
                "request deadline expired before retrieval started"
            );
            return RetrievalResult::failed(
                query,
                domain_filter,
                DegradationCause::DeadlineExceeded,
            );
        }

        let (mut dense, mut sparse) = self
            .run_legs(&query, domain_filter.as_deref(), pool_size, deadline)
            .await;

        let mut filter_relaxed = false;
        if let Some(filter) = domain_filter.as_deref()
            && filter_matched_nothing(&dense, &sparse)
        {
            tracing::info!(
                event = RetrievalEvent::FilterRelaxed.as_str(),
                domain_filter = filter,
                "domain filter matched no candidates; retrying across all domains"
            );
            (dense, sparse) = self.run_legs(&query, None, pool_size, deadline).await;
            filter_relaxed = true;
        }

        let mut ladder = DegradationLadder::new();
        let candidates = match (dense, sparse) {
            (Err(error), _) => {
                record_downgrade(&mut ladder, LadderLeg::Dense, &error);
                Vec::new()
            }
            (Ok(dense_hits), Err(error)) => {
                record_downgrade(&mut ladder, LadderLeg::Sparse, &error);
                let mut ranked = rank_dense_only(dense_hits, fusion.k);
                ranked.truncate(top_k);
                ranked
            }
            (Ok(dense_hits), Ok(sparse_hits)) => {
                let mut fused = apply_weighted_rrf(dense_hits, sparse_hits, fusion);
                fused.truncate(pool_size);
                if fused.is_empty() {
                    fused
                } else {
                    match self.rerank(&query, &fused, deadline).await {
                        Ok(scores) => apply_rerank(fused, &scores, top_k),
                        Err(error) => {
                            record_downgrade(&mut ladder, LadderLeg::Rerank, &error);
                            fused.truncate(top_k);
                            fused
                        }
                    }
                }
            }
        };

        let result = RetrievalResult {
            candidates,
            tier_used: ladder.tier(),
            query,
            domain_filter,
            filter_relaxed,
            degradation: ladder.cause(),
        };
        tracing::debug!(
            event = RetrievalEvent::Completed.as_str(),
            tier = result.tier_used.as_str(),
            candidates = result.candidates.len(),
            filter_relaxed = result.filter_relaxed,
            elapsed_ms = started.elapsed().as_millis(),
            "hybrid retrieval completed"
        );
        result
    }

    fn resolve_weights(&self, requested: Option<(f32, f32)>) -> FusionWeights {
        let (dense, sparse) = match requested {
            Some((dense, sparse)) => match validate_weights(dense, sparse) {
                Ok(()) => (dense, sparse),
                Err(error) => {
                    tracing::warn!(
                        event = RetrievalEvent::WeightsRejected.as_str(),
                        dense_weight = dense,
                        sparse_weight = sparse,
                        error = %error,
                        "invalid request weights; using configured weights"
                    );
                    (self.config.dense_weight, self.config.sparse_weight)
                }
            },
            None => (self.config.dense_weight, self.config.sparse_weight),
        };
        FusionWeights {
            dense,
            sparse,
            k: self.config.rrf_k,
        }
    }

    async fn run_legs(
        &self,
        query: &str,
        domain_filter: Option<&str>,
        limit: usize,
        deadline: RequestDeadline,
    ) -> (LegResult, LegResult) {
        let dense_budget = deadline.clamp(self.config.dense_timeout());
        let sparse_budget = deadline.clamp(self.config.sparse_timeout());

        let dense_leg = with_budget("dense", dense_budget, async {
            let vector = self.embedder.embed(query).await?;
            self.vector_index.search(&vector, domain_filter, limit).await
        });
        let sparse_leg = with_budget(
            "sparse",
            sparse_budget,
            self.sparse_index.search(query, domain_filter, limit),
        );
        let (dense, sparse) = tokio::join!(dense_leg, sparse_leg);

        (
            dense.map(|hits| retain_domain(hits, domain_filter)),
            sparse.map(|hits| retain_domain(hits, domain_filter)),
        )
    }

    async fn rerank(
        &self,
        query: &str,
        fused: &[Candidate],
        deadline: RequestDeadline,
    ) -> Result<Vec<f32>, RetrievalError> {
        let Some(reranker) = self.reranker.as_ref() else {
            return Err(RetrievalError::RerankFailed(
                "no reranker configured".to_string(),
            ));
        };
        if deadline.is_expired() {
            return Err(RetrievalError::DeadlineExceeded("rerank"));
        }
        let passages: Vec<String> = fused.iter().map(|c| c.text.clone()).collect();
        let budget = deadline.clamp(self.config.rerank_timeout());
        let scores = with_budget("rerank", budget, reranker.score(query, &passages)).await?;
        if scores.len() < passages.len() {
            return Err(RetrievalError::RerankShortResponse {
                expected: passages.len(),
                actual: scores.len(),
            });
        }
        if scores.len() > passages.len() || scores.iter().any(|score| !score.is_finite()) {
            return Err(RetrievalError::RerankFailed(format!(
                "malformed rerank response ({} scores for {} passages)",
                scores.len(),
                passages.len()
            )));
        }
        Ok(scores)
    }
}

async fn with_budget<T>(
    operation: &'static str,
    budget: Duration,
    fut: impl Future<Output = Result<T, RetrievalError>>,
) -> Result<T, RetrievalError> {
    match tokio::time::timeout(budget, fut).await {
        Ok(result) => result,
        Err(_) => Err(RetrievalError::Timeout { operation, budget }),
    }
}

fn filter_matched_nothing(dense: &LegResult, sparse: &LegResult) -> bool {
    let Ok(dense_hits) = dense else {
        return false;
    };
    let sparse_empty = match sparse {
        Ok(hits) => hits.is_empty(),
        Err(_) => true,
    };
    dense_hits.is_empty() && sparse_empty
}

fn retain_domain(mut hits: Vec<IndexHit>, domain_filter: Option<&str>) -> Vec<IndexHit> {
    if let Some(filter) = domain_filter {
        hits.retain(|hit| hit.domain == filter);
    }
    hits
}

fn apply_rerank(fused: Vec<Candidate>, scores: &[f32], top_k: usize) -> Vec<Candidate> {
    let mut reranked: Vec<Candidate> = fused
        .into_iter()
        .zip(scores.iter().copied())
        .map(|(mut candidate, score)| {
            candidate.rerank_score = Some(score);
            candidate
        })
        .collect();
    // Stable: equal rerank scores keep their fused order.
    reranked.sort_by(|a, b| {
        b.rerank_score
            .unwrap_or(f32::MIN)
            .total_cmp(&a.rerank_score.unwrap_or(f32::MIN))
    });
    reranked.truncate(top_k);
    reranked
}

fn record_downgrade(ladder: &mut DegradationLadder, leg: LadderLeg, error: &RetrievalError) {
    let from = ladder.tier();
    let cause = classify_failure(leg, error);
    if let Some(to) = ladder.downgrade(cause) {
        tracing::warn!(
            event = RetrievalEvent::TierDowngraded.as_str(),
            leg = leg.as_str(),
            from = from.as_str(),
            to = to.as_str(),
            cause = cause.as_str(),
            error = %error,
            "retrieval dependency failed; degrading"
        );
    }
}
