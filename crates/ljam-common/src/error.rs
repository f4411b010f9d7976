//! Error types for ljam-common.

use thiserror::Error;

/// Common error type for ljam operations.
#[derive(Debug, Error)]
pub enum Error {
    /// An access fell outside the bounds of a view.
    #[error("access out of bounds: offset {offset} + size {size} exceeds view length {len}")]
    OutOfBounds {
        offset: usize,
        size: usize,
        len: usize,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
