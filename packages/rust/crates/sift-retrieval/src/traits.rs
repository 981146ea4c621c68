//! Collaborator seams: embedder, indexes and reranker.
//!
//! Implementations live outside the core (HTTP clients in [`crate::clients`],
//! fakes in tests). Errors are mapped to [`RetrievalError`] so the retriever can
//! classify them for the degradation ladder.

use async_trait::async_trait;

use crate::error::RetrievalError;
use crate::types::IndexHit;

/// Text -> dense vector.
#[async_trait]
pub trait QueryEmbedder: Send + Sync {
    /// Embed one query. Fails with [`RetrievalError::EmbeddingUnavailable`] on
    /// timeout or connection errors.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError>;
}

/// Vector index lookup.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Ranked nearest neighbours of `vector`, best first.
    async fn search(
        &self,
        vector: &[f32],
        domain_filter: Option<&str>,
        limit: usize,
    ) -> Result<Vec<IndexHit>, RetrievalError>;
}

/// Keyword (BM25 / sparse) index lookup.
#[async_trait]
pub trait SparseIndex: Send + Sync {
    /// Ranked keyword matches for `text`, best first.
    async fn search(
        &self,
        text: &str,
        domain_filter: Option<&str>,
        limit: usize,
    ) -> Result<Vec<IndexHit>, RetrievalError>;
}

/// Cross-encoder reranker.
#[async_trait]
pub trait Reranker: Send + Sync {
    /// One score per passage, in input order.
    async fn score(&self, query: &str, passages: &[String]) -> Result<Vec<f32>, RetrievalError>;
}
