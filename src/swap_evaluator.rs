use rayon::prelude::*;

use crate::design::Design;
use crate::swap_candidates::SwapCandidate;

/// A candidate together with the pairwise co-occurrence variance of the
/// design that results from applying it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluatedSwap {
    pub candidate: SwapCandidate,
    pub variance: f64,
}

/// Scores every candidate against a hypothetical copy of `design` and returns
/// the one whose resulting design has the least pairwise co-occurrence
/// variance. `None` only for an empty candidate list.
///
/// Scoring reads a shared snapshot and builds a private hypothetical design
/// per candidate, so it fans out across rayon workers. The reduction compares
/// `(variance, enumeration index)` under a total order, which makes the
/// parallel result identical to a sequential first-found-minimum scan.
pub fn best_swap(design: &Design, candidates: &[SwapCandidate]) -> Option<EvaluatedSwap> {
    candidates
        .par_iter()
        .enumerate()
        .map(|(index, candidate)| {
            let variance = design
                .with_swap(candidate)
                .coincidence()
                .pairwise_variance();
            (index, variance)
        })
        .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
        .map(|(index, variance)| EvaluatedSwap {
            candidate: candidates[index],
            variance,
        })
}
