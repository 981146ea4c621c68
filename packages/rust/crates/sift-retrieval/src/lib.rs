//! sift-retrieval - Hybrid retrieval core.
//!
//! Dense (vector) and sparse (keyword) legs run concurrently, are fused with
//! weighted Reciprocal Rank Fusion, then reranked by a cross-encoder. Each
//! dependency failure moves a call one step down the degradation ladder
//! (`FULL -> HYBRID | DENSE | FAILED`) instead of surfacing an error.
//!
//! # Example
//!
//! ```rust,ignore
//! use sift_retrieval::{HybridRetriever, RetrievalConfig, RetrievalRequest};
//!
//! let retriever = HybridRetriever::new(embedder, vectors, keywords, Some(reranker),
//!     RetrievalConfig::default());
//! let result = retriever.execute(RetrievalRequest::new("refund policy").top_k(3)).await;
//! println!("{} candidates at {}", result.candidates.len(), result.tier_used.as_str());
//! ```

pub mod clients;
mod config;
mod deadline;
mod error;
pub mod fusion;
mod ladder;
mod observability;
mod retriever;
mod traits;
mod types;

pub use clients::{HttpEmbedder, HttpReranker, HttpSearchIndex};
pub use config::{
    DEFAULT_DENSE_TIMEOUT_MS, DEFAULT_DENSE_WEIGHT, DEFAULT_OVERSAMPLE_FACTOR,
    DEFAULT_RERANK_TIMEOUT_MS, DEFAULT_RRF_K, DEFAULT_SPARSE_TIMEOUT_MS, DEFAULT_SPARSE_WEIGHT,
    DEFAULT_TOP_K, RetrievalConfig, validate_weights,
};
pub use deadline::RequestDeadline;
pub use error::{ConfigError, RetrievalError};
pub use fusion::{FusionWeights, StreamSource, apply_weighted_rrf, rank_dense_only, rrf_term};
pub use ladder::{DegradationLadder, LadderLeg, classify_failure};
pub use observability::RetrievalEvent;
pub use retriever::{HybridRetriever, RetrievalRequest};
pub use traits::{QueryEmbedder, Reranker, SparseIndex, VectorIndex};
pub use types::{Candidate, DegradationCause, IndexHit, RetrievalResult, RetrievalTier};
