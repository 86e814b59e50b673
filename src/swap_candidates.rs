use std::collections::BTreeSet;

use crate::design::Design;
use crate::forbidden_pair::ForbiddenPair;

/// A proposed exchange: `take_out` leaves `source_block` for `dest_block`,
/// `bring_in` moves the other way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapCandidate {
    pub take_out: usize,
    pub bring_in: usize,
    pub source_block: usize,
    pub dest_block: usize,
}

/// Enumerates every syntactically valid swap for resolving `pair` inside
/// `source_block`.
///
/// A candidate `(x, y, b, r)` survives only when all of these hold:
/// - `y` is not already in `b` and would not form a forbidden pair with any
///   current member of `b` (both enforced through the exclusion set),
/// - `r` holds neither member of the violated pair, so the violation cannot
///   reappear there and `x` cannot collide with a duplicate of itself,
/// - `x` would not form a forbidden pair with what remains of `r` once `y`
///   has left.
///
/// Enumeration order is fixed: the pair's own members as swap-out choices in
/// the order given, destination blocks ascending, destination slots left to
/// right. The evaluator's tie-break leans on this order, which makes the whole
/// repair deterministic.
///
/// An empty result is a value, not a failure: it means this occurrence is
/// currently unrepairable and the orchestrator should record it and move on.
pub fn find_candidates(
    design: &Design,
    pair: &ForbiddenPair,
    source_block: usize,
    legitimate: &[usize],
    all_pairs: &[ForbiddenPair],
) -> Vec<SwapCandidate> {
    let excluded = exclusion_set(design, source_block, all_pairs);
    let mut candidates = Vec::new();
    for take_out in [pair.0, pair.1] {
        for &dest_block in legitimate {
            // a destination holding either member of the violated pair would
            // recreate the violation there
            if design.block_contains(dest_block, pair.0)
                || design.block_contains(dest_block, pair.1)
            {
                continue;
            }
            for slot in 0..design.block_size() {
                let bring_in = design.treatment(dest_block, slot);
                if excluded.contains(&bring_in) {
                    continue;
                }
                if clashes_with_remainder(design, dest_block, slot, take_out, all_pairs) {
                    continue;
                }
                candidates.push(SwapCandidate {
                    take_out,
                    bring_in,
                    source_block,
                    dest_block,
                });
            }
        }
    }
    candidates
}

/// Treatments that may not be swapped into `block`: its current members plus
/// both ends of every forbidden pair touching one of those members.
fn exclusion_set(
    design: &Design,
    block: usize,
    all_pairs: &[ForbiddenPair],
) -> BTreeSet<usize> {
    let mut excluded: BTreeSet<usize> = design.block(block).into_iter().collect();
    for pair in all_pairs {
        if design.block_contains(block, pair.0) || design.block_contains(block, pair.1) {
            excluded.insert(pair.0);
            excluded.insert(pair.1);
        }
    }
    excluded
}

/// Would `incoming` form a forbidden pair with what remains of `block` after
/// the member at `leaving_slot` departs? The exclusion set cannot answer this:
/// it was derived from the source block, not the destination.
fn clashes_with_remainder(
    design: &Design,
    block: usize,
    leaving_slot: usize,
    incoming: usize,
    all_pairs: &[ForbiddenPair],
) -> bool {
    (0..design.block_size()).any(|slot| {
        slot != leaving_slot
            && all_pairs
                .iter()
                .any(|pair| pair.matches(incoming, design.treatment(block, slot)))
    })
}
