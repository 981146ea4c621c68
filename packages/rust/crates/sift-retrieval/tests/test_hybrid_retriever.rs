#![allow(missing_docs)]
//! HybridRetriever tiers, ordering, domain relaxation and deadlines, driven by fakes.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sift_retrieval::{
    DegradationCause, HybridRetriever, IndexHit, QueryEmbedder, RequestDeadline,
    RetrievalConfig, RetrievalError, RetrievalRequest, RetrievalResult, RetrievalTier, Reranker,
    SparseIndex, VectorIndex,
};

fn hit(doc_id: &str, domain: &str) -> IndexHit {
    IndexHit {
        doc_id: doc_id.to_string(),
        chunk_id: "0".to_string(),
        score: 0.5,
        text: format!("passage {doc_id}"),
        source: format!("docs/{doc_id}.md"),
        domain: domain.to_string(),
    }
}

fn general(ids: &[&str]) -> Vec<IndexHit> {
    ids.iter().map(|id| hit(id, "general")).collect()
}

#[derive(Clone, Copy)]
enum Behavior {
    Ok,
    Fail,
    Slow,
}

struct FakeEmbedder(Behavior);

#[async_trait]
impl QueryEmbedder for FakeEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, RetrievalError> {
        match self.0 {
            Behavior::Ok => Ok(vec![0.1, 0.2, 0.3]),
            Behavior::Fail => Err(RetrievalError::EmbeddingUnavailable(
                "connection refused".to_string(),
            )),
            Behavior::Slow => {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Ok(vec![0.1])
            }
        }
    }
}

/// Index fake that honours the domain filter and the limit.
struct FakeIndex {
    hits: Vec<IndexHit>,
    behavior: Behavior,
}

impl FakeIndex {
    fn ok(hits: Vec<IndexHit>) -> Arc<Self> {
        Arc::new(Self {
            hits,
            behavior: Behavior::Ok,
        })
    }

    fn with(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            hits: Vec::new(),
            behavior,
        })
    }

    async fn lookup(
        &self,
        domain_filter: Option<&str>,
        limit: usize,
    ) -> Result<Vec<IndexHit>, String> {
        match self.behavior {
            Behavior::Fail => return Err("index offline".to_string()),
            Behavior::Slow => tokio::time::sleep(Duration::from_secs(2)).await,
            Behavior::Ok => {}
        }
        Ok(self
            .hits
            .iter()
            .filter(|hit| domain_filter.is_none_or(|domain| hit.domain == domain))
            .take(limit)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl VectorIndex for FakeIndex {
    async fn search(
        &self,
        _vector: &[f32],
        domain_filter: Option<&str>,
        limit: usize,
    ) -> Result<Vec<IndexHit>, RetrievalError> {
        self.lookup(domain_filter, limit)
            .await
            .map_err(RetrievalError::DenseSearchFailed)
    }
}

#[async_trait]
impl SparseIndex for FakeIndex {
    async fn search(
        &self,
        _text: &str,
        domain_filter: Option<&str>,
        limit: usize,
    ) -> Result<Vec<IndexHit>, RetrievalError> {
        self.lookup(domain_filter, limit)
            .await
            .map_err(RetrievalError::SparseSearchFailed)
    }
}

enum RerankMode {
    /// Score = input position, so the fused order is reversed.
    Reverse,
    Short,
    NotFinite,
    Slow,
}

struct FakeReranker {
    mode: RerankMode,
    seen: Mutex<Vec<usize>>,
}

impl FakeReranker {
    fn new(mode: RerankMode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn batch_sizes(&self) -> Vec<usize> {
        self.seen.lock().map(|seen| seen.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Reranker for FakeReranker {
    async fn score(&self, _query: &str, passages: &[String]) -> Result<Vec<f32>, RetrievalError> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(passages.len());
        }
        let positions: Vec<f32> = (0..passages.len()).map(|i| i as f32).collect();
        match self.mode {
            RerankMode::Reverse => Ok(positions),
            RerankMode::Short => Ok(positions.into_iter().skip(1).collect()),
            RerankMode::NotFinite => Ok(vec![f32::NAN; passages.len()]),
            RerankMode::Slow => {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Ok(positions)
            }
        }
    }
}

fn fast_config() -> RetrievalConfig {
    RetrievalConfig {
        rerank_timeout_ms: 50,
        dense_timeout_ms: 100,
        sparse_timeout_ms: 100,
        ..RetrievalConfig::default()
    }
}

fn retriever(
    embedder: Behavior,
    dense: Arc<FakeIndex>,
    sparse: Arc<FakeIndex>,
    reranker: Option<Arc<FakeReranker>>,
) -> HybridRetriever {
    HybridRetriever::new(
        Arc::new(FakeEmbedder(embedder)),
        dense,
        sparse,
        reranker.map(|r| r as Arc<dyn Reranker>),
        fast_config(),
    )
}

fn standard(reranker: Option<Arc<FakeReranker>>) -> HybridRetriever {
    retriever(
        Behavior::Ok,
        FakeIndex::ok(general(&["A", "B", "C"])),
        FakeIndex::ok(general(&["B", "D", "A"])),
        reranker,
    )
}

fn ids(result: &RetrievalResult) -> Vec<&str> {
    result.candidates.iter().map(|c| c.doc_id.as_str()).collect()
}

fn assert_sorted_for_tier(result: &RetrievalResult) {
    let scores: Vec<f32> = result
        .candidates
        .iter()
        .map(|c| c.score_for(result.tier_used).unwrap_or(f32::NAN))
        .collect();
    assert!(scores.iter().all(|s| s.is_finite()), "missing tier score: {scores:?}");
    assert!(scores.windows(2).all(|pair| pair[0] >= pair[1]), "unsorted: {scores:?}");
}

#[tokio::test]
async fn test_full_tier_orders_by_rerank_score() {
    let reranker = FakeReranker::new(RerankMode::Reverse);
    let retriever = standard(Some(reranker.clone()));

    let result = retriever.retrieve("refund policy", None, 2, 1.0, 1.0).await;

    assert_eq!(result.tier_used, RetrievalTier::Full);
    assert!(result.degradation.is_none());
    // Fused order is B, A, D, C; the reranker reverses it.
    assert_eq!(ids(&result), vec!["C", "D"]);
    assert!(result.candidates.iter().all(|c| c.rerank_score.is_some()));
    assert_sorted_for_tier(&result);
    assert_eq!(reranker.batch_sizes(), vec![4]);
}

#[tokio::test]
async fn test_reranker_sees_oversampled_pool_only() {
    let many: Vec<String> = (0..20).map(|i| format!("doc-{i:02}")).collect();
    let refs: Vec<&str> = many.iter().map(String::as_str).collect();
    let reranker = FakeReranker::new(RerankMode::Reverse);
    let retriever = retriever(
        Behavior::Ok,
        FakeIndex::ok(general(&refs)),
        FakeIndex::ok(general(&refs)),
        Some(reranker.clone()),
    );

    let result = retriever.execute(RetrievalRequest::new("q").top_k(1)).await;

    assert_eq!(result.tier_used, RetrievalTier::Full);
    assert_eq!(result.candidates.len(), 1);
    assert_eq!(reranker.batch_sizes(), vec![4]);
}

#[tokio::test]
async fn test_missing_reranker_completes_at_hybrid() {
    let result = standard(None).retrieve("q", None, 2, 1.0, 1.0).await;

    assert_eq!(result.tier_used, RetrievalTier::Hybrid);
    assert_eq!(result.degradation, Some(DegradationCause::RerankUnavailable));
    assert_eq!(ids(&result), vec!["B", "A"]);
    assert!(result.candidates.iter().all(|c| c.rerank_score.is_none()));
    assert_sorted_for_tier(&result);
}

#[tokio::test]
async fn test_rerank_timeout_falls_back_to_fused_order() {
    let result = standard(Some(FakeReranker::new(RerankMode::Slow)))
        .retrieve("q", None, 3, 1.0, 1.0)
        .await;

    assert_eq!(result.tier_used, RetrievalTier::Hybrid);
    assert_eq!(result.degradation, Some(DegradationCause::RerankTimeout));
    assert_eq!(ids(&result), vec!["B", "A", "D"]);
}

#[tokio::test]
async fn test_short_rerank_response_is_a_rerank_failure() {
    let result = standard(Some(FakeReranker::new(RerankMode::Short)))
        .retrieve("q", None, 3, 1.0, 1.0)
        .await;

    assert_eq!(result.tier_used, RetrievalTier::Hybrid);
    assert_eq!(result.degradation, Some(DegradationCause::RerankShortResponse));
    assert!(result.candidates.iter().all(|c| c.rerank_score.is_none()));
}

#[tokio::test]
async fn test_non_finite_rerank_scores_are_rejected() {
    let result = standard(Some(FakeReranker::new(RerankMode::NotFinite)))
        .retrieve("q", None, 3, 1.0, 1.0)
        .await;

    assert_eq!(result.tier_used, RetrievalTier::Hybrid);
    assert_eq!(result.degradation, Some(DegradationCause::RerankUnavailable));
}

#[tokio::test]
async fn test_sparse_failure_completes_at_dense() {
    let reranker = FakeReranker::new(RerankMode::Reverse);
    let retriever = retriever(
        Behavior::Ok,
        FakeIndex::ok(general(&["A", "B", "C"])),
        FakeIndex::with(Behavior::Fail),
        Some(reranker.clone()),
    );

    let result = retriever.retrieve("q", None, 5, 1.0, 1.0).await;

    assert_eq!(result.tier_used, RetrievalTier::Dense);
    assert_eq!(result.degradation, Some(DegradationCause::SparseUnavailable));
    assert_eq!(ids(&result), vec!["A", "B", "C"]);
    assert!(result.candidates.iter().all(|c| c.sparse_score.is_none()));
    assert_sorted_for_tier(&result);
    assert!(reranker.batch_sizes().is_empty());
}

#[tokio::test]
async fn test_sparse_timeout_is_recorded() {
    let retriever = retriever(
        Behavior::Ok,
        FakeIndex::ok(general(&["A"])),
        FakeIndex::with(Behavior::Slow),
        None,
    );

    let result = retriever.retrieve("q", None, 5, 1.0, 1.0).await;

    assert_eq!(result.tier_used, RetrievalTier::Dense);
    assert_eq!(result.degradation, Some(DegradationCause::SparseTimeout));
}

#[tokio::test]
async fn test_dense_failure_fails_even_when_sparse_succeeds() {
    let retriever = retriever(
        Behavior::Fail,
        FakeIndex::ok(general(&["A"])),
        FakeIndex::ok(general(&["A", "B"])),
        Some(FakeReranker::new(RerankMode::Reverse)),
    );

    let result = retriever.retrieve("q", None, 5, 1.0, 1.0).await;

    assert_eq!(result.tier_used, RetrievalTier::Failed);
    assert_eq!(result.degradation, Some(DegradationCause::DenseUnavailable));
    assert!(result.candidates.is_empty());
}

#[tokio::test]
async fn test_dense_timeout_fails() {
    let retriever = retriever(
        Behavior::Slow,
        FakeIndex::ok(general(&["A"])),
        FakeIndex::ok(general(&["A"])),
        None,
    );

    let result = retriever.retrieve("q", None, 5, 1.0, 1.0).await;

    assert_eq!(result.tier_used, RetrievalTier::Failed);
    assert_eq!(result.degradation, Some(DegradationCause::DenseTimeout));
}

#[tokio::test]
async fn test_everything_down_fails_without_error() {
    let retriever = retriever(
        Behavior::Ok,
        FakeIndex::with(Behavior::Fail),
        FakeIndex::with(Behavior::Fail),
        None,
    );

    let result = retriever.retrieve("q", None, 5, 1.0, 1.0).await;

    assert_eq!(result.tier_used, RetrievalTier::Failed);
    assert!(result.candidates.is_empty());
    assert!(result.is_degraded());
}

#[tokio::test]
async fn test_never_returns_more_than_top_k() {
    let retriever = standard(Some(FakeReranker::new(RerankMode::Reverse)));
    for top_k in 1..=6 {
        let result = retriever.retrieve("q", None, top_k, 1.0, 1.0).await;
        assert!(result.candidates.len() <= top_k);
    }
    let result = retriever.retrieve("q", None, 10, 1.0, 1.0).await;
    assert_eq!(result.candidates.len(), 4);
}

#[tokio::test]
async fn test_domain_filter_keeps_matching_candidates() {
    let mixed = vec![
        hit("A", "billing"),
        hit("B", "shipping"),
        hit("C", "billing"),
    ];
    let retriever = retriever(
        Behavior::Ok,
        FakeIndex::ok(mixed.clone()),
        FakeIndex::ok(mixed),
        None,
    );

    let result = retriever
        .retrieve("invoice", Some("billing"), 5, 1.0, 1.0)
        .await;

    assert!(!result.filter_relaxed);
    assert_eq!(result.domain_filter.as_deref(), Some("billing"));
    assert_eq!(ids(&result), vec!["A", "C"]);
}

#[tokio::test]
async fn test_domain_filter_without_matches_is_relaxed() {
    let retriever = retriever(
        Behavior::Ok,
        FakeIndex::ok(general(&["A", "B"])),
        FakeIndex::ok(general(&["B"])),
        None,
    );

    let result = retriever
        .retrieve("invoice", Some("legal"), 5, 1.0, 1.0)
        .await;

    assert!(result.filter_relaxed);
    assert!(result.is_degraded());
    assert_eq!(ids(&result), vec!["B", "A"]);
}

#[tokio::test]
async fn test_expired_deadline_fails_fast() {
    let reranker = FakeReranker::new(RerankMode::Reverse);
    let retriever = standard(Some(reranker.clone()));
    let request = RetrievalRequest::new("q").deadline(RequestDeadline::after(Duration::ZERO));

    let result = retriever.execute(request).await;

    assert_eq!(result.tier_used, RetrievalTier::Failed);
    assert_eq!(result.degradation, Some(DegradationCause::DeadlineExceeded));
    assert!(reranker.batch_sizes().is_empty());
}

#[tokio::test]
async fn test_invalid_request_weights_use_configured_weights() {
    let result = standard(None).retrieve("q", None, 4, -1.0, f32::NAN).await;

    assert_eq!(result.tier_used, RetrievalTier::Hybrid);
    assert_eq!(ids(&result), vec!["B", "A", "D", "C"]);
}
