use crate::coincidence_matrix::CoincidenceMatrix;
use crate::design::Design;
use crate::forbidden_pair::ForbiddenPair;

/// Post-hoc verdict on a final design: `satisfied` iff every forbidden pair's
/// co-occurrence count is zero. A contradictory constraint set (one no block
/// structure can satisfy) surfaces here as a non-empty `violated_pairs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub satisfied: bool,
    pub violated_pairs: Vec<ForbiddenPair>,
}

/// Pure check against the design's freshly built coincidence matrix. Used
/// for verification and reporting, never for control flow during repair.
pub fn validate(design: &Design, pairs: &[ForbiddenPair]) -> ValidationReport {
    let coincidence = CoincidenceMatrix::from_design(design);
    let violated_pairs: Vec<ForbiddenPair> = pairs
        .iter()
        .copied()
        .filter(|pair| coincidence.count(pair) > 0)
        .collect();
    ValidationReport {
        satisfied: violated_pairs.is_empty(),
        violated_pairs,
    }
}
