use std::time::Duration;

use super::{DegradationLadder, LadderLeg, classify_failure};
use crate::error::RetrievalError;
use crate::types::{DegradationCause, RetrievalTier};

#[test]
fn ladder_starts_at_full() {
    let ladder = DegradationLadder::new();
    assert_eq!(ladder.tier(), RetrievalTier::Full);
    assert!(ladder.cause().is_none());
}

#[test]
fn ladder_takes_only_one_transition() {
    let mut ladder = DegradationLadder::new();
    assert_eq!(
        ladder.downgrade(DegradationCause::SparseTimeout),
        Some(RetrievalTier::Dense)
    );
    assert_eq!(ladder.downgrade(DegradationCause::DenseUnavailable), None);
    assert_eq!(ladder.downgrade(DegradationCause::RerankTimeout), None);
    assert_eq!(ladder.tier(), RetrievalTier::Dense);
    assert_eq!(ladder.cause(), Some(DegradationCause::SparseTimeout));
}

#[test]
fn rerank_failures_land_on_hybrid() {
    for cause in [
        DegradationCause::RerankUnavailable,
        DegradationCause::RerankTimeout,
        DegradationCause::RerankShortResponse,
    ] {
        let mut ladder = DegradationLadder::new();
        assert_eq!(ladder.downgrade(cause), Some(RetrievalTier::Hybrid));
    }
}

#[test]
fn classify_maps_timeouts_per_leg() {
    let timeout = RetrievalError::Timeout {
        operation: "dense",
        budget: Duration::from_millis(5),
    };
    assert_eq!(
        classify_failure(LadderLeg::Dense, &timeout),
        DegradationCause::DenseTimeout
    );
    assert_eq!(
        classify_failure(LadderLeg::Sparse, &timeout),
        DegradationCause::SparseTimeout
    );
    assert_eq!(
        classify_failure(LadderLeg::Rerank, &timeout),
        DegradationCause::RerankTimeout
    );
}

#[test]
fn classify_distinguishes_short_rerank_and_deadline() {
    let short = RetrievalError::RerankShortResponse {
        expected: 4,
        actual: 2,
    };
    assert_eq!(
        classify_failure(LadderLeg::Rerank, &short),
        DegradationCause::RerankShortResponse
    );
    let expired = RetrievalError::DeadlineExceeded("rerank");
    assert_eq!(
        classify_failure(LadderLeg::Rerank, &expired),
        DegradationCause::RerankTimeout
    );
    let down = RetrievalError::EmbeddingUnavailable("connection refused".to_string());
    assert_eq!(
        classify_failure(LadderLeg::Dense, &down),
        DegradationCause::DenseUnavailable
    );
}
