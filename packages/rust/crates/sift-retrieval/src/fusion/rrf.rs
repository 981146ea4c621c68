//! Weighted Reciprocal Rank Fusion over `(doc_id, chunk_id)` identity.

use std::collections::{HashMap, HashSet};

use crate::types::{Candidate, IndexHit};

use super::kernels::rrf_term;

/// Which index produced a ranked stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSource {
    /// Vector index.
    Dense,
    /// Keyword index.
    Sparse,
}

/// Stream weights and the RRF constant for one fusion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionWeights {
    /// Dense stream weight.
    pub dense: f32,
    /// Sparse stream weight.
    pub sparse: f32,
    /// RRF constant `k`.
    pub k: f32,
}

impl FusionWeights {
    /// Stream whose insertion order breaks score ties. Dense wins equal weights.
    #[must_use]
    pub fn primary(&self) -> StreamSource {
        if self.dense >= self.sparse {
            StreamSource::Dense
        } else {
            StreamSource::Sparse
        }
    }

    fn weight(&self, source: StreamSource) -> f32 {
        match source {
            StreamSource::Dense => self.dense,
            StreamSource::Sparse => self.sparse,
        }
    }
}

/// Fuse dense and sparse rankings with weighted RRF.
///
/// `fused = w_dense / (k + rank_dense) + w_sparse / (k + rank_sparse)` with 1-based
/// ranks; a candidate absent from a stream gets no contribution from it. A hit
/// repeated inside one stream only counts at its best rank.
///
/// Ordering: fused score descending, then first-seen order when walking the
/// higher-weighted stream before the other, then `doc_id` / `chunk_id`.
#[must_use]
pub fn apply_weighted_rrf(
    dense: Vec<IndexHit>,
    sparse: Vec<IndexHit>,
    weights: FusionWeights,
) -> Vec<Candidate> {
    let streams = match weights.primary() {
        StreamSource::Dense => [(StreamSource::Dense, dense), (StreamSource::Sparse, sparse)],
        StreamSource::Sparse => [(StreamSource::Sparse, sparse), (StreamSource::Dense, dense)],
    };

    let mut entries: Vec<Candidate> = Vec::new();
    let mut positions: HashMap<(String, String), usize> = HashMap::new();

    for (source, hits) in streams {
        let weight = weights.weight(source);
        let mut seen: HashSet<(String, String)> = HashSet::with_capacity(hits.len());
        for (rank, hit) in hits.into_iter().enumerate() {
            let key = (hit.doc_id.clone(), hit.chunk_id.clone());
            if !seen.insert(key.clone()) {
                continue;
            }
            let raw_score = hit.score;
            let term = weight * rrf_term(weights.k, rank);
            let idx = *positions.entry(key).or_insert_with(|| {
                entries.push(Candidate::from_hit(hit));
                entries.len() - 1
            });
            let candidate = &mut entries[idx];
            match source {
                StreamSource::Dense => candidate.dense_score = Some(raw_score),
                StreamSource::Sparse => candidate.sparse_score = Some(raw_score),
            }
            *candidate.fused_score.get_or_insert(0.0) += term;
        }
    }

    sort_fused(entries)
}

/// Dense-only ranking for the DENSE tier: unweighted RRF over the dense stream,
/// so candidates still carry a `fused_score` that orders them.
#[must_use]
pub fn rank_dense_only(dense: Vec<IndexHit>, k: f32) -> Vec<Candidate> {
    let mut seen: HashSet<(String, String)> = HashSet::with_capacity(dense.len());
    let mut entries = Vec::with_capacity(dense.len());
    for (rank, hit) in dense.into_iter().enumerate() {
        if !seen.insert((hit.doc_id.clone(), hit.chunk_id.clone())) {
            continue;
        }
        let raw_score = hit.score;
        let mut candidate = Candidate::from_hit(hit);
        candidate.dense_score = Some(raw_score);
        candidate.fused_score = Some(rrf_term(k, rank));
        entries.push(candidate);
    }
    sort_fused(entries)
}

fn sort_fused(entries: Vec<Candidate>) -> Vec<Candidate> {
    let mut ordered: Vec<(usize, Candidate)> = entries.into_iter().enumerate().collect();
    ordered.sort_by(|(a_pos, a), (b_pos, b)| {
        let a_score = a.fused_score.unwrap_or(0.0);
        let b_score = b.fused_score.unwrap_or(0.0);
        b_score
            .total_cmp(&a_score)
            .then_with(|| a_pos.cmp(b_pos))
            .then_with(|| a.doc_id.cmp(&b.doc_id))
            .then_with(|| a.chunk_id.cmp(&b.chunk_id))
    });
    ordered.into_iter().map(|(_, candidate)| candidate).collect()
}
