//! RRF Fusion - Reciprocal Rank Fusion for hybrid retrieval.
//!
//! Layout: `kernels` (RRF term), `rrf` (weighted fusion over candidate identity).

mod kernels;
mod rrf;

pub use kernels::rrf_term;
pub use rrf::{FusionWeights, StreamSource, apply_weighted_rrf, rank_dense_only};
