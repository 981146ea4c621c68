//! Compute kernel for fusion: the RRF term.

/// RRF term for a 0-based `rank`: `1 / (k + rank + 1)`.
///
/// The +1 makes the formula match the 1-based `1 / (k + rank)` definition.
#[inline]
#[must_use]
pub fn rrf_term(k: f32, rank: usize) -> f32 {
    let rank_f32 = f32::from(u16::try_from(rank).unwrap_or(u16::MAX));
    1.0 / (k + rank_f32 + 1.0)
}

#[cfg(test)]
mod tests {
    use super::rrf_term;

    #[test]
    fn test_rrf_term() {
        assert!((rrf_term(60.0, 0) - (1.0 / 61.0)).abs() < 1e-7);
        assert!((rrf_term(60.0, 2) - (1.0 / 63.0)).abs() < 1e-7);
    }

    #[test]
    fn test_rrf_term_saturates_huge_ranks() {
        assert!(rrf_term(60.0, usize::MAX) > 0.0);
        assert!(rrf_term(60.0, usize::MAX) <= rrf_term(60.0, 1_000));
    }
}
