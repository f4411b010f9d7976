//! Error types for image decoding.

use thiserror::Error;

/// Errors that can occur when decoding JAM images.
#[derive(Debug, Error)]
pub enum Error {
    /// Common library error (bounds violations).
    #[error("{0}")]
    Common(#[from] ljam_common::Error),

    /// Unknown encoding tag in the image header.
    #[error("unsupported image encoding: {0:#04x}")]
    UnsupportedEncoding(u8),

    /// A back-reference pointing before the first pixel byte.
    #[error("back-reference at byte {position} rewinds {rewind} bytes past the start of the image")]
    RewindOutOfRange { position: usize, rewind: usize },

    /// Decoded bitmap would not fit the 32-bit size fields.
    #[error("image too large for a bitmap: {width}x{height}")]
    ImageTooLarge { width: u16, height: u16 },
}

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, Error>;
