use log::debug;
use nalgebra::DMatrix;

use crate::design::Design;
use crate::error::RepairError;
use crate::forbidden_pair::ForbiddenPair;

const MAX_RETRIES: usize = 10;

/// Source of the shuffle stream. `Fixed` replays a constant draw so the
/// generator can be exercised deterministically in tests.
#[derive(Debug, Clone, Copy)]
pub enum RandomType {
    Uniform,
    Fixed(f64),
}

impl RandomType {
    fn random(&self) -> f64 {
        match self {
            RandomType::Uniform => rand::random::<f64>(),
            RandomType::Fixed(value) => *value,
        }
    }
}

/// Builds a starting design with approximately balanced treatment frequencies
/// and no forbidden pair inside any block. Stands in for the external
/// optimizer at the system boundary; the repair core treats its output as an
/// opaque initial design.
///
/// Treatments are dealt round-robin from a permuted list; a candidate that
/// would duplicate a block member or complete a forbidden pair is passed
/// over. When a block cannot be finished from the current permutation it is
/// cleared and retried with a fresh shuffle, up to a retry cap.
pub fn generate(
    treatments: usize,
    num_blocks: usize,
    block_size: usize,
    pairs: &[ForbiddenPair],
    random_type: RandomType,
) -> Result<Design, RepairError> {
    if block_size >= treatments {
        return Err(RepairError::BlockSizeTooLarge {
            block_size,
            treatments,
        });
    }
    if num_blocks == 0 || block_size == 0 {
        return Err(RepairError::EmptyDesign);
    }

    let mut order: Vec<usize> = (1..=treatments).collect();
    permute(&mut order, random_type);

    let mut blocks: DMatrix<usize> = DMatrix::zeros(num_blocks, block_size);
    let mut next = 0;
    for block in 0..num_blocks {
        let mut retries = 0;
        let mut filled = 0;
        while filled < block_size {
            if next >= treatments {
                next = 0;
                permute(&mut order, random_type);
            }
            let candidate = order[next];
            let clashes = (0..filled).any(|slot| {
                let existing = blocks[(block, slot)];
                existing == candidate
                    || pairs.iter().any(|pair| pair.matches(candidate, existing))
            });
            if !clashes {
                blocks[(block, filled)] = candidate;
                next += 1;
                filled += 1;
            } else {
                next += 1;
                if next >= treatments {
                    retries += 1;
                    if retries >= MAX_RETRIES {
                        return Err(RepairError::InitialDesignStuck { block, retries });
                    }
                    debug!("block {block} stuck, reshuffling (attempt {retries})");
                    next = 0;
                    permute(&mut order, random_type);
                    for slot in 0..filled {
                        blocks[(block, slot)] = 0;
                    }
                    filled = 0;
                }
            }
        }
    }

    Design::new(blocks, treatments)
}

/* Fike shuffle; see Fike, "A permutation generation method", The Computer
Journal 18-1, Feb 75, 21-22. */
fn permute(values: &mut [usize], random_type: RandomType) {
    for i in 1..values.len() {
        let j = ((1 + i) as f64 * random_type.random()) as usize;
        values.swap(i, j);
    }
}
