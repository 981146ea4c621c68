//! Resolved retrieval parameters, passed by value into every call.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default RRF smoothing constant.
pub const DEFAULT_RRF_K: f32 = 60.0;
/// Default dense stream weight.
pub const DEFAULT_DENSE_WEIGHT: f32 = 1.0;
/// Default sparse stream weight.
pub const DEFAULT_SPARSE_WEIGHT: f32 = 1.0;
/// Default final result count.
pub const DEFAULT_TOP_K: usize = 5;
/// Default oversampling multiplier applied before reranking.
pub const DEFAULT_OVERSAMPLE_FACTOR: usize = 4;
/// Default reranker budget.
pub const DEFAULT_RERANK_TIMEOUT_MS: u64 = 100;
/// Default dense leg budget.
pub const DEFAULT_DENSE_TIMEOUT_MS: u64 = 500;
/// Default sparse leg budget.
pub const DEFAULT_SPARSE_TIMEOUT_MS: u64 = 500;

/// Immutable retrieval configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Weight of the dense stream in RRF.
    pub dense_weight: f32,
    /// Weight of the sparse stream in RRF.
    pub sparse_weight: f32,
    /// RRF constant `k`.
    pub rrf_k: f32,
    /// Default number of results when the caller does not pass one.
    pub top_k: usize,
    /// Fused candidates handed to the reranker = `oversample_factor * top_k`.
    pub oversample_factor: usize,
    /// Reranker budget in milliseconds.
    pub rerank_timeout_ms: u64,
    /// Dense leg budget in milliseconds (embedding + vector search).
    pub dense_timeout_ms: u64,
    /// Sparse leg budget in milliseconds.
    pub sparse_timeout_ms: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            dense_weight: DEFAULT_DENSE_WEIGHT,
            sparse_weight: DEFAULT_SPARSE_WEIGHT,
            rrf_k: DEFAULT_RRF_K,
            top_k: DEFAULT_TOP_K,
            oversample_factor: DEFAULT_OVERSAMPLE_FACTOR,
            rerank_timeout_ms: DEFAULT_RERANK_TIMEOUT_MS,
            dense_timeout_ms: DEFAULT_DENSE_TIMEOUT_MS,
            sparse_timeout_ms: DEFAULT_SPARSE_TIMEOUT_MS,
        }
    }
}

impl RetrievalConfig {
    /// Reject weights and sizes the fusion cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] describing the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_weights(self.dense_weight, self.sparse_weight)?;
        if !self.rrf_k.is_finite() || self.rrf_k < 0.0 {
            return Err(ConfigError(format!(
                "rrf_k must be finite and >= 0 (got {})",
                self.rrf_k
            )));
        }
        if self.top_k == 0 {
            return Err(ConfigError("top_k must be >= 1".to_string()));
        }
        if self.oversample_factor == 0 {
            return Err(ConfigError("oversample_factor must be >= 1".to_string()));
        }
        Ok(())
    }

    /// Reranker budget.
    #[must_use]
    pub fn rerank_timeout(&self) -> Duration {
        Duration::from_millis(self.rerank_timeout_ms)
    }

    /// Dense leg budget.
    #[must_use]
    pub fn dense_timeout(&self) -> Duration {
        Duration::from_millis(self.dense_timeout_ms)
    }

    /// Sparse leg budget.
    #[must_use]
    pub fn sparse_timeout(&self) -> Duration {
        Duration::from_millis(self.sparse_timeout_ms)
    }
}

/// Check a dense/sparse weight pair: finite, non-negative, not both zero.
///
/// # Errors
///
/// Returns [`ConfigError`] when the pair is unusable.
pub fn validate_weights(dense_weight: f32, sparse_weight: f32) -> Result<(), ConfigError> {
    for (name, value) in [("dense_weight", dense_weight), ("sparse_weight", sparse_weight)] {
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError(format!(
                "{name} must be finite and >= 0 (got {value})"
            )));
        }
    }
    if dense_weight <= 0.0 && sparse_weight <= 0.0 {
        return Err(ConfigError(
            "at least one of dense_weight / sparse_weight must be > 0".to_string(),
        ));
    }
    Ok(())
}
