use crate::design::Design;
use crate::forbidden_pair::ForbiddenPair;

/// Disjoint partition of block ids by forbidden-pair membership. Legitimate
/// blocks hold no forbidden pair; illegitimate blocks hold at least one.
/// Both lists are in ascending block order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Classification {
    pub legitimate: Vec<usize>,
    pub illegitimate: Vec<usize>,
}

/// Partitions the blocks of `design`. Cheap, and recomputed after every
/// accepted swap since a swap can move a block between the two sides.
pub fn classify(design: &Design, pairs: &[ForbiddenPair]) -> Classification {
    let mut classification = Classification::default();
    for block in 0..design.num_blocks() {
        if pairs.iter().any(|pair| design.block_violates(block, pair)) {
            classification.illegitimate.push(block);
        } else {
            classification.legitimate.push(block);
        }
    }
    classification
}

/// Blocks currently holding both members of `pair`, ascending block id.
pub fn violating_blocks(design: &Design, pair: &ForbiddenPair) -> Vec<usize> {
    (0..design.num_blocks())
        .filter(|&block| design.block_violates(block, pair))
        .collect()
}
