//! Retrieval data model: index hits, candidates, tiers and results.

use serde::{Deserialize, Serialize};

/// One ranked hit returned by a dense or sparse index.
///
/// Hits carry the chunk payload so candidates can be built without a second
/// document-store round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexHit {
    /// Document id.
    pub doc_id: String,
    /// Chunk id within the document.
    pub chunk_id: String,
    /// Raw index score (similarity or BM25).
    pub score: f32,
    /// Chunk text.
    #[serde(default)]
    pub text: String,
    /// Source locator (path, URL, table name).
    #[serde(default)]
    pub source: String,
    /// Domain label used by domain filtering.
    #[serde(default)]
    pub domain: String,
}

/// A retrieval candidate. Identity is `(doc_id, chunk_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Document id.
    pub doc_id: String,
    /// Chunk id within the document.
    pub chunk_id: String,
    /// Chunk text.
    pub text: String,
    /// Source locator.
    pub source: String,
    /// Domain label.
    pub domain: String,
    /// Raw score from the dense index, if the candidate appeared there.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dense_score: Option<f32>,
    /// Raw score from the sparse index, if the candidate appeared there.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sparse_score: Option<f32>,
    /// Weighted RRF score.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fused_score: Option<f32>,
    /// Cross-encoder score, set only on the FULL tier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rerank_score: Option<f32>,
}

impl Candidate {
    pub(crate) fn from_hit(hit: IndexHit) -> Self {
        Self {
            doc_id: hit.doc_id,
            chunk_id: hit.chunk_id,
            text: hit.text,
            source: hit.source,
            domain: hit.domain,
            dense_score: None,
            sparse_score: None,
            fused_score: None,
            rerank_score: None,
        }
    }

    /// `(doc_id, chunk_id)` identity key.
    #[must_use]
    pub fn key(&self) -> (&str, &str) {
        (&self.doc_id, &self.chunk_id)
    }

    /// Score that orders this candidate at `tier`.
    #[must_use]
    pub fn score_for(&self, tier: RetrievalTier) -> Option<f32> {
        match tier {
            RetrievalTier::Full => self.rerank_score,
            RetrievalTier::Hybrid | RetrievalTier::Dense => self.fused_score,
            RetrievalTier::Failed => None,
        }
    }
}

/// Degradation level at which a retrieval call completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RetrievalTier {
    /// Dense + sparse + rerank.
    Full,
    /// Rerank unavailable: RRF-fused order.
    Hybrid,
    /// Sparse unavailable: dense-only order.
    Dense,
    /// Dense unavailable: no candidates.
    Failed,
}

impl RetrievalTier {
    /// Stable tier label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Full => "FULL",
            Self::Hybrid => "HYBRID",
            Self::Dense => "DENSE",
            Self::Failed => "FAILED",
        }
    }

    /// Ladder position; higher is more degraded.
    #[must_use]
    pub const fn depth(self) -> u8 {
        match self {
            Self::Full => 0,
            Self::Hybrid => 1,
            Self::Dense => 2,
            Self::Failed => 3,
        }
    }

    /// True for every tier below FULL.
    #[must_use]
    pub const fn is_degraded(self) -> bool {
        !matches!(self, Self::Full)
    }
}

/// Dependency failure that moved a call down the ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradationCause {
    /// No reranker configured or the reranker call failed.
    RerankUnavailable,
    /// Reranker exceeded its budget.
    RerankTimeout,
    /// Reranker returned fewer scores than passages.
    RerankShortResponse,
    /// Sparse leg failed.
    SparseUnavailable,
    /// Sparse leg exceeded its budget.
    SparseTimeout,
    /// Dense leg (embedder or vector index) failed.
    DenseUnavailable,
    /// Dense leg exceeded its budget.
    DenseTimeout,
    /// Request deadline expired before the call could finish.
    DeadlineExceeded,
}

impl DegradationCause {
    /// Stable cause label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RerankUnavailable => "rerank_unavailable",
            Self::RerankTimeout => "rerank_timeout",
            Self::RerankShortResponse => "rerank_short_response",
            Self::SparseUnavailable => "sparse_unavailable",
            Self::SparseTimeout => "sparse_timeout",
            Self::DenseUnavailable => "dense_unavailable",
            Self::DenseTimeout => "dense_timeout",
            Self::DeadlineExceeded => "deadline_exceeded",
        }
    }

    /// Tier a call lands on when this cause fires from FULL.
    #[must_use]
    pub const fn target_tier(self) -> RetrievalTier {
        match self {
            Self::RerankUnavailable | Self::RerankTimeout | Self::RerankShortResponse => {
                RetrievalTier::Hybrid
            }
            Self::SparseUnavailable | Self::SparseTimeout => RetrievalTier::Dense,
            Self::DenseUnavailable | Self::DenseTimeout | Self::DeadlineExceeded => {
                RetrievalTier::Failed
            }
        }
    }
}

/// Outcome of one retrieval call.
///
/// `candidates` are sorted descending by the score implied by `tier_used`
/// and never exceed the requested `top_k`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// Ranked candidates.
    pub candidates: Vec<Candidate>,
    /// Tier the call completed at.
    pub tier_used: RetrievalTier,
    /// Query text.
    pub query: String,
    /// Requested domain filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_filter: Option<String>,
    /// True when the filter matched nothing and the call retried across all domains.
    #[serde(default)]
    pub filter_relaxed: bool,
    /// Why the call left FULL, if it did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degradation: Option<DegradationCause>,
}

impl RetrievalResult {
    /// Empty FAILED result: "no information available".
    #[must_use]
    pub fn failed(
        query: impl Into<String>,
        domain_filter: Option<String>,
        cause: DegradationCause,
    ) -> Self {
        Self {
            candidates: Vec::new(),
            tier_used: RetrievalTier::Failed,
            query: query.into(),
            domain_filter,
            filter_relaxed: false,
            degradation: Some(cause),
        }
    }

    /// True when the call completed below FULL or had to relax its filter.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.tier_used.is_degraded() || self.filter_relaxed
    }
}
