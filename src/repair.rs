use std::time::{Duration, Instant};

use derive_builder::Builder;
use log::{debug, info, warn};

use crate::classification::{classify, violating_blocks};
use crate::design::Design;
use crate::forbidden_pair::ForbiddenPair;
use crate::swap_candidates::find_candidates;
use crate::swap_evaluator::{best_swap, EvaluatedSwap};

/// One forbidden-pair occurrence the repair loop could not eliminate, either
/// because no valid swap existed or because the time budget ran out first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unresolved {
    pub pair: ForbiddenPair,
    pub block: usize,
}

/// What a repair run produced: the final design, the swaps applied in order,
/// and every occurrence left unresolved.
#[derive(Debug, Clone)]
pub struct RepairOutcome {
    pub design: Design,
    pub swaps_applied: Vec<EvaluatedSwap>,
    pub unresolved: Vec<Unresolved>,
}

/// A single repair run: a validated starting design, the immutable forbidden
/// pair set, and an optional wall-clock budget.
///
/// Iteration order is fixed and documented rather than canonical: pairs in
/// the order given, violating blocks ascending by id. Different orders yield
/// different, individually valid final designs; for a given order the run is
/// fully deterministic.
#[derive(Builder, Debug)]
#[builder(build_fn(validate = "Self::check_pair_range", error = "anyhow::Error"))]
pub struct RepairTask {
    design: Design,
    forbidden_pairs: Vec<ForbiddenPair>,

    /// When set, repair stops once the budget is spent and the remaining
    /// occurrences are reported as unresolved. A degraded result, not an
    /// error.
    #[builder(default)]
    time_budget: Option<Duration>,
}

impl RepairTaskBuilder {
    /// Pair ids outside the design's treatment domain are a structural input
    /// error and never reach the repair loop.
    fn check_pair_range(&self) -> Result<(), anyhow::Error> {
        if let (Some(design), Some(pairs)) = (&self.design, &self.forbidden_pairs) {
            design.check_pairs(pairs)?;
        }
        Ok(())
    }
}

impl RepairTask {
    /// Runs the repair loop to completion. Each (pair, violating block)
    /// occurrence is attempted exactly once; occurrences already cleared by
    /// an earlier swap are skipped.
    pub fn run(self) -> RepairOutcome {
        let started = Instant::now();
        let mut design = self.design;
        let mut swaps_applied = Vec::new();
        let mut unresolved = Vec::new();
        let mut budget_exhausted = false;

        for pair in &self.forbidden_pairs {
            for block in violating_blocks(&design, pair) {
                // an earlier swap may already have cleared this occurrence
                if !design.block_violates(block, pair) {
                    continue;
                }
                if let Some(budget) = self.time_budget {
                    if started.elapsed() >= budget {
                        if !budget_exhausted {
                            warn!(
                                "time budget {budget:?} spent, reporting remaining occurrences unresolved"
                            );
                            budget_exhausted = true;
                        }
                        unresolved.push(Unresolved { pair: *pair, block });
                        continue;
                    }
                }

                let classification = classify(&design, &self.forbidden_pairs);
                let candidates = find_candidates(
                    &design,
                    pair,
                    block,
                    &classification.legitimate,
                    &self.forbidden_pairs,
                );
                debug!(
                    "pair {pair} in block {block}: {} candidate swaps",
                    candidates.len()
                );
                match best_swap(&design, &candidates) {
                    Some(best) => {
                        let occurrences_before =
                            design.forbidden_occurrences(&self.forbidden_pairs);
                        design = design.with_swap(&best.candidate);
                        debug_assert!(
                            design.forbidden_occurrences(&self.forbidden_pairs)
                                < occurrences_before
                        );
                        debug!(
                            "applied swap {:?}, pairwise variance {:.6}",
                            best.candidate, best.variance
                        );
                        swaps_applied.push(best);
                    }
                    None => {
                        debug!("pair {pair} in block {block} is currently unrepairable");
                        unresolved.push(Unresolved { pair: *pair, block });
                    }
                }
            }
        }

        info!(
            "repair done: {} swaps applied, {} occurrences unresolved",
            swaps_applied.len(),
            unresolved.len()
        );
        RepairOutcome {
            design,
            swaps_applied,
            unresolved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::validate;

    fn run(design: Design, pairs: Vec<ForbiddenPair>) -> RepairOutcome {
        RepairTaskBuilder::default()
            .design(design)
            .forbidden_pairs(pairs)
            .build()
            .unwrap()
            .run()
    }

    fn block_invariants_hold(design: &Design) {
        for block in 0..design.num_blocks() {
            let members = design.block(block);
            assert_eq!(members.len(), design.block_size());
            let mut sorted = members.clone();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted.len(), members.len(), "duplicate in block {block}");
        }
    }

    #[test]
    fn repairs_single_violation() {
        let design = Design::from_rows(&[vec![1, 2], vec![3, 4], vec![5, 6]], 6).unwrap();
        let pairs = vec![ForbiddenPair(1, 2)];
        let outcome = run(design, pairs.clone());
        assert_eq!(outcome.swaps_applied.len(), 1);
        assert!(outcome.unresolved.is_empty());
        assert!(validate(&outcome.design, &pairs).satisfied);
        block_invariants_hold(&outcome.design);
    }

    #[test]
    fn occurrence_count_never_increases() {
        let design = Design::from_rows(
            &[vec![1, 2, 3], vec![4, 5, 6], vec![7, 8, 9], vec![1, 4, 7]],
            9,
        )
        .unwrap();
        let pairs = vec![ForbiddenPair(1, 2), ForbiddenPair(4, 5), ForbiddenPair(1, 7)];
        let mut occurrences = design.forbidden_occurrences(&pairs);
        let outcome = run(design, pairs.clone());
        // replay the applied swaps and watch the count fall monotonically
        let mut replayed =
            Design::from_rows(&[vec![1, 2, 3], vec![4, 5, 6], vec![7, 8, 9], vec![1, 4, 7]], 9)
                .unwrap();
        for swap in &outcome.swaps_applied {
            replayed = replayed.with_swap(&swap.candidate);
            let now = replayed.forbidden_occurrences(&pairs);
            assert!(now < occurrences);
            occurrences = now;
        }
        assert_eq!(replayed, outcome.design);
        block_invariants_hold(&outcome.design);
    }

    #[test]
    fn clean_design_passes_through_unchanged() {
        let design = Design::from_rows(&[vec![1, 2], vec![3, 4], vec![5, 6]], 6).unwrap();
        let pairs = vec![ForbiddenPair(1, 3), ForbiddenPair(2, 5)];
        let outcome = run(design.clone(), pairs.clone());
        assert_eq!(outcome.design, design);
        assert!(outcome.swaps_applied.is_empty());
        assert!(outcome.unresolved.is_empty());
        assert!(validate(&outcome.design, &pairs).satisfied);
    }

    #[test]
    fn unrepairable_occurrence_is_recorded_not_fatal() {
        // both other blocks hold a member of the violated pair
        let design = Design::from_rows(&[vec![1, 2], vec![1, 3], vec![2, 4]], 6).unwrap();
        let pairs = vec![ForbiddenPair(1, 2)];
        let outcome = run(design.clone(), pairs.clone());
        assert_eq!(
            outcome.unresolved,
            vec![Unresolved {
                pair: ForbiddenPair(1, 2),
                block: 0,
            }]
        );
        assert!(outcome.swaps_applied.is_empty());
        assert_eq!(outcome.design, design);
        assert!(!validate(&outcome.design, &pairs).satisfied);
    }

    #[test]
    fn repeated_runs_are_deterministic() {
        let rows = vec![
            vec![1, 2, 3],
            vec![4, 5, 6],
            vec![7, 8, 1],
            vec![2, 5, 8],
            vec![3, 6, 7],
        ];
        let pairs = vec![ForbiddenPair(1, 2), ForbiddenPair(5, 8)];
        let first = run(Design::from_rows(&rows, 8).unwrap(), pairs.clone());
        let second = run(Design::from_rows(&rows, 8).unwrap(), pairs);
        assert_eq!(first.design, second.design);
        assert_eq!(first.swaps_applied, second.swaps_applied);
        assert_eq!(first.unresolved, second.unresolved);
    }

    #[test]
    fn zero_time_budget_defers_everything() {
        let design = Design::from_rows(&[vec![1, 2], vec![3, 4], vec![5, 6]], 6).unwrap();
        let outcome = RepairTaskBuilder::default()
            .design(design.clone())
            .forbidden_pairs(vec![ForbiddenPair(1, 2)])
            .time_budget(Some(Duration::ZERO))
            .build()
            .unwrap()
            .run();
        assert!(outcome.swaps_applied.is_empty());
        assert_eq!(outcome.unresolved.len(), 1);
        assert_eq!(outcome.design, design);
    }

    #[test]
    fn builder_rejects_pairs_outside_the_treatment_domain() {
        let design = Design::from_rows(&[vec![1, 2], vec![3, 4], vec![5, 6]], 6).unwrap();
        for bad in [ForbiddenPair(0, 5), ForbiddenPair(1, 99)] {
            let result = RepairTaskBuilder::default()
                .design(design.clone())
                .forbidden_pairs(vec![bad])
                .build();
            assert!(result.is_err());
        }
    }

    #[test]
    fn builder_requires_a_design() {
        let result = RepairTaskBuilder::default()
            .forbidden_pairs(vec![ForbiddenPair(1, 2)])
            .build();
        assert!(result.is_err());
    }
}
