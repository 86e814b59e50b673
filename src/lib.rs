pub mod classification;
pub mod coincidence_matrix;
pub mod design;
pub mod error;
pub mod forbidden_pair;
pub mod initial_design;
pub mod repair;
pub mod swap_candidates;
pub mod swap_evaluator;
pub mod validator;

pub use coincidence_matrix::CoincidenceMatrix;
pub use design::Design;
pub use error::RepairError;
pub use forbidden_pair::ForbiddenPair;
pub use repair::{RepairOutcome, RepairTask, RepairTaskBuilder, Unresolved};
pub use validator::{validate, ValidationReport};

use anyhow::Error;

/// Repairs a block design so that no forbidden pair shares a block, keeping
/// the result as close to a balanced design as the constraints allow.
///
/// # Arguments
///
/// * `design` - The starting design, typically produced by an external optimizer
/// * `forbidden_pairs` - Pairs of treatments that must never appear together in a block
///
/// # Returns
///
/// A [`RepairOutcome`] holding the final design, the swaps that were applied,
/// and any forbidden-pair occurrences that could not be resolved.
///
/// # Errors
///
/// Returns an error if the repair task cannot be constructed.
pub fn repair_design(
    design: Design,
    forbidden_pairs: Vec<ForbiddenPair>,
) -> Result<RepairOutcome, Error> {
    let task = RepairTaskBuilder::default()
        .design(design)
        .forbidden_pairs(forbidden_pairs)
        .build()?;
    Ok(task.run())
}
