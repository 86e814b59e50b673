use thiserror::Error;

/// Structural input errors. These are fatal: a design that trips one of them
/// never enters the repair loop. Soft conditions (an occurrence with no viable
/// swap, a contradictory constraint set) are reported as values instead, via
/// `RepairOutcome::unresolved` and `ValidationReport`.
#[derive(Debug, Error)]
pub enum RepairError {
    #[error("block size {block_size} must be smaller than the number of treatments {treatments}")]
    BlockSizeTooLarge {
        block_size: usize,
        treatments: usize,
    },

    #[error("block {block} contains a duplicate treatment")]
    DuplicateTreatment { block: usize },

    #[error("block {block} contains treatment {treatment}, outside 1..={treatments}")]
    TreatmentOutOfRange {
        block: usize,
        treatment: usize,
        treatments: usize,
    },

    #[error("design has no blocks or an empty block size")]
    EmptyDesign,

    #[error("malformed design table: {0}")]
    ParseTable(String),

    #[error("malformed forbidden pair: {0}")]
    ParsePair(String),

    #[error("forbidden pair ({a}, {b}) references a treatment outside 1..={treatments}")]
    PairOutOfRange {
        a: usize,
        b: usize,
        treatments: usize,
    },

    #[error("could not fill block {block} without a forbidden pair after {retries} reshuffles")]
    InitialDesignStuck { block: usize, retries: usize },
}
