//! Error types for extraction.

use thiserror::Error;

/// Errors that can occur while unpacking an archive.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] ljam_common::Error),

    /// Archive parsing error.
    #[error("{0}")]
    Archive(#[from] ljam_archive::Error),

    /// Image decoding error.
    #[error("{0}")]
    Bitmap(#[from] ljam_bmp::Error),

    /// Entry path that would escape the output directory.
    #[error("refusing to write unsafe path: {0:?}")]
    UnsafePath(String),
}

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;
