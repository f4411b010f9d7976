//! Error types for the archive crate.

use thiserror::Error;

/// Errors that can occur when working with JAM archives.
#[derive(Debug, Error)]
pub enum Error {
    /// Common library error (bounds violations, I/O).
    #[error("{0}")]
    Common(#[from] ljam_common::Error),

    /// The container does not start with the JAM magic.
    #[error("invalid JAM magic: expected 'LJAM', got {actual:?}")]
    InvalidMagic { actual: Vec<u8> },

    /// A record count too large to address.
    #[error("record table with {count} entries cannot be addressed")]
    TableTooLarge { count: u32 },

    /// Folder nesting exceeded the supported depth.
    #[error("folder nesting deeper than {depth} levels")]
    TooDeep { depth: usize },

    /// An entry name that cannot be stored in a 12-byte record.
    #[error("invalid entry name: {0:?}")]
    InvalidName(String),

    /// Container grew past the 32-bit offset range.
    #[error("archive exceeds 4 GiB at offset {0}")]
    TooLarge(usize),
}

/// Result type for archive operations.
pub type Result<T> = std::result::Result<T, Error>;
