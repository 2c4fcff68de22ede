//! Error types for bftape

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Raw-mode `,` found nothing left to read.
    #[error("input exhausted at pc {pc}")]
    InputExhausted { pc: usize },

    /// Raw-mode data pointer walked past the end of memory.
    #[error("data pointer {pointer} outside memory of {size} cells")]
    PointerOutOfBounds { pointer: usize, size: usize },

    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("predictor returned an empty batch")]
    EmptyBatch,

    #[error("associative pool has no slots")]
    EmptyPool,

    #[error("{what} index {index} out of bounds (len {len})")]
    IndexOutOfBounds {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
