use nalgebra::DMatrix;

use crate::coincidence_matrix::CoincidenceMatrix;
use crate::error::RepairError;
use crate::forbidden_pair::ForbiddenPair;
use crate::swap_candidates::SwapCandidate;

/// A block design: one row per block, `block_size` distinct 1-based treatment
/// ids per row.
///
/// Designs are values. Nothing mutates a design in place; an applied swap
/// produces a fresh `Design` via [`Design::with_swap`], so evaluation of
/// hypothetical swaps stays side-effect-free.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Design {
    blocks: DMatrix<usize>,
    treatments: usize,
}

impl Design {
    /// Validates and wraps a B×k matrix of treatment ids. All structural
    /// checks happen here, so a `Design` in hand is always well-formed.
    pub fn new(blocks: DMatrix<usize>, treatments: usize) -> Result<Self, RepairError> {
        if blocks.nrows() == 0 || blocks.ncols() == 0 {
            return Err(RepairError::EmptyDesign);
        }
        if blocks.ncols() >= treatments {
            return Err(RepairError::BlockSizeTooLarge {
                block_size: blocks.ncols(),
                treatments,
            });
        }
        for block in 0..blocks.nrows() {
            for i in 0..blocks.ncols() {
                let treatment = blocks[(block, i)];
                if treatment < 1 || treatment > treatments {
                    return Err(RepairError::TreatmentOutOfRange {
                        block,
                        treatment,
                        treatments,
                    });
                }
                if (i + 1..blocks.ncols()).any(|j| blocks[(block, j)] == treatment) {
                    return Err(RepairError::DuplicateTreatment { block });
                }
            }
        }
        Ok(Self { blocks, treatments })
    }

    /// Convenience constructor from row vectors; rejects ragged input.
    pub fn from_rows(rows: &[Vec<usize>], treatments: usize) -> Result<Self, RepairError> {
        if rows.is_empty() || rows[0].is_empty() {
            return Err(RepairError::EmptyDesign);
        }
        let block_size = rows[0].len();
        if rows.iter().any(|row| row.len() != block_size) {
            return Err(RepairError::ParseTable("rows differ in length".into()));
        }
        let blocks = DMatrix::from_fn(rows.len(), block_size, |r, c| rows[r][c]);
        Self::new(blocks, treatments)
    }

    pub fn treatments(&self) -> usize {
        self.treatments
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.nrows()
    }

    pub fn block_size(&self) -> usize {
        self.blocks.ncols()
    }

    pub fn matrix(&self) -> &DMatrix<usize> {
        &self.blocks
    }

    pub fn treatment(&self, block: usize, slot: usize) -> usize {
        self.blocks[(block, slot)]
    }

    pub fn block(&self, block: usize) -> Vec<usize> {
        self.blocks.row(block).iter().copied().collect()
    }

    pub fn block_contains(&self, block: usize, treatment: usize) -> bool {
        self.blocks.row(block).iter().any(|&t| t == treatment)
    }

    /// Checks every pair against this design's treatment domain. Pair ids
    /// outside `1..=treatments` are a structural input error, rejected before
    /// repair begins.
    pub fn check_pairs(&self, pairs: &[ForbiddenPair]) -> Result<(), RepairError> {
        for pair in pairs {
            pair.check_in_range(self.treatments)?;
        }
        Ok(())
    }

    /// True when both members of `pair` sit in `block`.
    pub fn block_violates(&self, block: usize, pair: &ForbiddenPair) -> bool {
        self.block_contains(block, pair.0) && self.block_contains(block, pair.1)
    }

    /// Total count of (pair, block) forbidden co-occurrences in the design.
    pub fn forbidden_occurrences(&self, pairs: &[ForbiddenPair]) -> usize {
        pairs
            .iter()
            .map(|pair| {
                (0..self.num_blocks())
                    .filter(|&block| self.block_violates(block, pair))
                    .count()
            })
            .sum()
    }

    fn position(&self, block: usize, treatment: usize) -> Option<usize> {
        (0..self.block_size()).find(|&slot| self.blocks[(block, slot)] == treatment)
    }

    /// Returns a new design with `swap` applied: `take_out` leaves the source
    /// block for the destination block and `bring_in` moves the other way.
    /// The receiver is untouched.
    ///
    /// The candidate must come from enumeration against this design (as
    /// `find_candidates` produces): `bring_in` absent from the source block
    /// and `take_out` absent from the destination, otherwise the result would
    /// hold a duplicate treatment. Both preconditions are debug-asserted.
    pub fn with_swap(&self, swap: &SwapCandidate) -> Design {
        debug_assert!(!self.block_contains(swap.source_block, swap.bring_in));
        debug_assert!(!self.block_contains(swap.dest_block, swap.take_out));
        let mut blocks = self.blocks.clone();
        if let Some(slot) = self.position(swap.source_block, swap.take_out) {
            blocks[(swap.source_block, slot)] = swap.bring_in;
        }
        if let Some(slot) = self.position(swap.dest_block, swap.bring_in) {
            blocks[(swap.dest_block, slot)] = swap.take_out;
        }
        Design {
            blocks,
            treatments: self.treatments,
        }
    }

    pub fn coincidence(&self) -> CoincidenceMatrix {
        CoincidenceMatrix::from_design(self)
    }

    /// Serializes as a B×k table, one space-separated row per block.
    pub fn to_table_string(&self) -> String {
        let mut out = String::new();
        for block in 0..self.num_blocks() {
            let row: Vec<String> = (0..self.block_size())
                .map(|slot| self.blocks[(block, slot)].to_string())
                .collect();
            out.push_str(&row.join(" "));
            out.push('\n');
        }
        out
    }

    /// Parses the table format written by [`Design::to_table_string`]. The
    /// two functions round-trip: parsing a serialized design yields an equal
    /// design, same blocks in the same order.
    pub fn parse_table(text: &str, treatments: usize) -> Result<Self, RepairError> {
        let mut rows = Vec::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let row = line
                .split_whitespace()
                .map(|token| {
                    token.parse::<usize>().map_err(|_| {
                        RepairError::ParseTable(format!(
                            "line {}: invalid treatment id {token:?}",
                            lineno + 1
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(row);
        }
        Self::from_rows(&rows, treatments)
    }

    /// Canonical presentation for display: each block sorted ascending, then
    /// blocks ordered lexicographically. Does not alter the design itself.
    pub fn as_sorted(&self) -> DMatrix<usize> {
        let mut rows: Vec<Vec<usize>> = (0..self.num_blocks())
            .map(|block| {
                let mut row = self.block(block);
                row.sort_unstable();
                row
            })
            .collect();
        rows.sort_unstable();
        DMatrix::from_fn(self.num_blocks(), self.block_size(), |r, c| rows[r][c])
    }
}
