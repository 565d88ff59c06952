use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PeakRepError {
    #[error("Window list is empty")]
    EmptyWindowList,

    #[error("No replicates configured")]
    NoReplicates,

    #[error("Windows carry no samples")]
    NoSamples,

    #[error("Windows are not sorted by (chromosome, start) at index {0}")]
    UnsortedWindows(usize),

    #[error("Window {index} has {found} sample counts, expected {expected}")]
    SampleCountMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("Sample index {sample} is out of range for {n_samples} samples")]
    SampleOutOfRange { sample: usize, n_samples: usize },

    #[error("Replicate ordinal {0} is missing or duplicated")]
    InvalidReplicateOrdinal(usize),

    #[error("Unknown chromosome: {0}")]
    UnknownChromosome(String),

    #[error("Empty neighborhood at window {index} for scale {scale}")]
    EmptyNeighborhood { index: usize, scale: u32 },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Slot {kind} for replicate {replicate} was already written")]
    SlotAlreadyWritten { kind: &'static str, replicate: usize },

    #[error("Slot {kind} for replicate {replicate} has not been written")]
    SlotUnset { kind: &'static str, replicate: usize },

    #[error("Worker task failed: {0}")]
    WorkerFailure(String),
}
