//! Retrieval error types.

use std::time::Duration;

use thiserror::Error;

/// Failure of one retrieval dependency.
///
/// None of these reach the caller of [`crate::HybridRetriever::retrieve`]; they are
/// absorbed by the degradation ladder and recorded on the result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RetrievalError {
    /// Query embedder timed out or could not be reached.
    #[error("embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// Dense (vector) index search failed.
    #[error("dense search failed: {0}")]
    DenseSearchFailed(String),

    /// Sparse (keyword) index search failed.
    #[error("sparse search failed: {0}")]
    SparseSearchFailed(String),

    /// Reranker call failed.
    #[error("rerank failed: {0}")]
    RerankFailed(String),

    /// Reranker returned fewer scores than passages.
    #[error("rerank returned {actual} scores for {expected} passages")]
    RerankShortResponse {
        /// Passages sent.
        expected: usize,
        /// Scores received.
        actual: usize,
    },

    /// A dependency exceeded its time budget.
    #[error("{operation} timed out after {}ms", budget.as_millis())]
    Timeout {
        /// Operation label (`dense`, `sparse`, `rerank`, `embed`).
        operation: &'static str,
        /// Budget that was exceeded.
        budget: Duration,
    },

    /// The request-level deadline had already passed.
    #[error("request deadline exceeded before {0}")]
    DeadlineExceeded(&'static str),
}

impl RetrievalError {
    /// True when the error was caused by a time budget rather than a hard failure.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::DeadlineExceeded(_))
    }
}

/// Invalid retrieval configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid retrieval config: {0}")]
pub struct ConfigError(pub String);
