use nalgebra::{DMatrix, DVector};

use crate::design::Design;
use crate::forbidden_pair::ForbiddenPair;

/// Symmetric N×N co-occurrence counts derived from a design: entry (i, j)
/// counts the blocks holding both treatments, the diagonal counts total
/// appearances per treatment.
///
/// Always a derived view. It is rebuilt from whatever design snapshot is
/// under consideration and never acts as the source of truth.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct CoincidenceMatrix {
    pub coincidence: DMatrix<usize>,
}

impl CoincidenceMatrix {
    pub fn from_design(design: &Design) -> Self {
        let n = design.treatments();
        let mut coincidence: DMatrix<usize> = DMatrix::zeros(n, n);
        for block in 0..design.num_blocks() {
            for i in 0..design.block_size() {
                let elem_i = design.treatment(block, i) - 1;
                // Diagonal counts total appearances
                coincidence[(elem_i, elem_i)] += 1;
                for j in (i + 1)..design.block_size() {
                    let elem_j = design.treatment(block, j) - 1;
                    coincidence[(elem_i, elem_j)] += 1;
                    coincidence[(elem_j, elem_i)] += 1;
                }
            }
        }
        Self { coincidence }
    }

    /// Mean replication count (average of the diagonal).
    pub fn r(&self) -> f64 {
        self.coincidence.diagonal().cast::<f64>().mean()
    }

    /// Mean pairwise co-occurrence count.
    pub fn lambda(&self) -> f64 {
        let pairs = self.pair_counts();
        pairs.sum() / pairs.len() as f64
    }

    /// Population variance of the strictly-lower-triangular entries, i.e. of
    /// the pairwise co-occurrence counts with the diagonal excluded. Zero for
    /// a perfectly balanced design; every repair swap is picked to minimize
    /// this.
    pub fn pairwise_variance(&self) -> f64 {
        self.pair_counts().variance()
    }

    /// Number of blocks in which both members of `pair` appear. A pair
    /// referencing a treatment outside the matrix's domain co-occurs nowhere
    /// and counts as zero.
    pub fn count(&self, pair: &ForbiddenPair) -> usize {
        let n = self.coincidence.ncols();
        if [pair.0, pair.1].iter().any(|&t| t < 1 || t > n) {
            return 0;
        }
        self.coincidence[(pair.0 - 1, pair.1 - 1)]
    }

    /// Equal replication and zero pairwise variance: a balanced design.
    pub fn is_balanced(&self) -> bool {
        let diagonal = self.coincidence.diagonal().cast::<f64>();
        diagonal.max() == diagonal.min() && self.pairwise_variance() == 0.0
    }

    fn pair_counts(&self) -> DVector<f64> {
        let n = self.coincidence.ncols();
        let mut counts = Vec::with_capacity(n * (n - 1) / 2);
        for i in 1..n {
            for j in 0..i {
                counts.push(self.coincidence[(i, j)] as f64);
            }
        }
        DVector::from_vec(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_blocks() -> Design {
        Design::from_rows(&[vec![1, 2], vec![3, 4], vec![5, 6]], 6).unwrap()
    }

    #[test]
    fn counts_and_symmetry() {
        let matrix = CoincidenceMatrix::from_design(&three_blocks());
        assert_eq!(matrix.coincidence.nrows(), 6);
        assert_eq!(matrix.coincidence, matrix.coincidence.transpose());
        // each treatment appears once
        for i in 0..6 {
            assert_eq!(matrix.coincidence[(i, i)], 1);
        }
        assert_eq!(matrix.count(&ForbiddenPair(1, 2)), 1);
        assert_eq!(matrix.count(&ForbiddenPair(2, 1)), 1);
        assert_eq!(matrix.count(&ForbiddenPair(1, 3)), 0);
    }

    #[test]
    fn pairwise_variance_excludes_diagonal() {
        let matrix = CoincidenceMatrix::from_design(&three_blocks());
        // 15 pairs, three of them co-occurring once: mean 0.2
        assert!((matrix.lambda() - 0.2).abs() < 1e-12);
        let expected = (3.0 * 0.8 * 0.8 + 12.0 * 0.2 * 0.2) / 15.0;
        assert!((matrix.pairwise_variance() - expected).abs() < 1e-12);
    }

    #[test]
    fn mean_replication() {
        let design = Design::from_rows(&[vec![1, 2], vec![1, 3]], 3).unwrap();
        let matrix = CoincidenceMatrix::from_design(&design);
        assert!((matrix.r() - 4.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn balanced_detection() {
        // unreduced pair design on 3 treatments: every pair exactly once
        let design = Design::from_rows(&[vec![1, 2], vec![1, 3], vec![2, 3]], 3).unwrap();
        assert!(CoincidenceMatrix::from_design(&design).is_balanced());
        assert!(!CoincidenceMatrix::from_design(&three_blocks()).is_balanced());
    }
}
