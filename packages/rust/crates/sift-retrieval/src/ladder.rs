//! Degradation ladder: FULL -> HYBRID | DENSE | FAILED, one way, once per call.

use crate::error::RetrievalError;
use crate::types::{DegradationCause, RetrievalTier};

/// Dependency boundary a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LadderLeg {
    /// Embedder or vector index.
    Dense,
    /// Keyword index.
    Sparse,
    /// Reranker.
    Rerank,
}

impl LadderLeg {
    /// Stable leg label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dense => "dense",
            Self::Sparse => "sparse",
            Self::Rerank => "rerank",
        }
    }
}

/// Classify a leg failure into the cause recorded on the result.
///
/// A leg cut short by the request deadline counts as that leg timing out.
#[must_use]
pub fn classify_failure(leg: LadderLeg, error: &RetrievalError) -> DegradationCause {
    let timed_out = error.is_timeout();
    match leg {
        LadderLeg::Dense if timed_out => DegradationCause::DenseTimeout,
        LadderLeg::Dense => DegradationCause::DenseUnavailable,
        LadderLeg::Sparse if timed_out => DegradationCause::SparseTimeout,
        LadderLeg::Sparse => DegradationCause::SparseUnavailable,
        LadderLeg::Rerank if timed_out => DegradationCause::RerankTimeout,
        LadderLeg::Rerank if matches!(error, RetrievalError::RerankShortResponse { .. }) => {
            DegradationCause::RerankShortResponse
        }
        LadderLeg::Rerank => DegradationCause::RerankUnavailable,
    }
}

/// Per-call ladder state. Starts at FULL and accepts a single downgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DegradationLadder {
    tier: RetrievalTier,
    cause: Option<DegradationCause>,
}

impl Default for DegradationLadder {
    fn default() -> Self {
        Self::new()
    }
}

impl DegradationLadder {
    /// Fresh ladder at FULL.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tier: RetrievalTier::Full,
            cause: None,
        }
    }

    /// Current tier.
    #[must_use]
    pub const fn tier(&self) -> RetrievalTier {
        self.tier
    }

    /// Cause of the downgrade, if one happened.
    #[must_use]
    pub const fn cause(&self) -> Option<DegradationCause> {
        self.cause
    }

    /// Apply a failure. Returns the new tier when the transition was taken,
    /// `None` when the ladder had already moved (the call finishes where it is).
    pub fn downgrade(&mut self, cause: DegradationCause) -> Option<RetrievalTier> {
        if self.cause.is_some() {
            return None;
        }
        let target = cause.target_tier();
        if target.depth() <= self.tier.depth() {
            return None;
        }
        self.tier = target;
        self.cause = Some(cause);
        Some(target)
    }
}

#[cfg(test)]
#[path = "../tests/unit/ladder.rs"]
mod tests;
