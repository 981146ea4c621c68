//! Structured event ids for every `tracing` call in the retrieval crate.

/// Closed set of `event = ...` ids emitted by retrieval.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetrievalEvent {
    TierDowngraded,
    FilterRelaxed,
    WeightsRejected,
    RerankRetry,
    Completed,
}

impl RetrievalEvent {
    /// Every event, for registry checks.
    pub const ALL: [Self; 5] = [
        Self::TierDowngraded,
        Self::FilterRelaxed,
        Self::WeightsRejected,
        Self::RerankRetry,
        Self::Completed,
    ];

    /// Stable dotted id, `retrieval.<name>`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TierDowngraded => "retrieval.tier.downgraded",
            Self::FilterRelaxed => "retrieval.filter.relaxed",
            Self::WeightsRejected => "retrieval.weights.rejected",
            Self::RerankRetry => "retrieval.rerank.retry",
            Self::Completed => "retrieval.completed",
        }
    }
}
