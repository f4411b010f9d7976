//! Decoder for the compressed images stored in Lego Racers JAM archives.
//!
//! Entries named `*.BMP` inside a JAM archive are not Windows bitmaps. They
//! carry a small header, an optional BGR palette and a series of blocks
//! compressed with a byte-oriented LZ scheme (literal bytes and
//! back-references selected by control-byte flags).
//!
//! [`decode_bmp`] decompresses such an entry and re-emits it as a standard,
//! uncompressed bitmap file.
//!
//! # Example
//!
//! ```no_run
//! use ljam_bmp::decode_bmp;
//! use ljam_common::ByteView;
//!
//! let image = ByteView::read_file("TITLE.BMP")?;
//! let bitmap = decode_bmp(&image)?;
//! std::fs::write("title.bmp", &bitmap)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod decode;
mod error;
mod header;

pub use decode::{decode_bmp, split_reference, Encoding, ImageHeader, RowLayout};
pub use error::{Error, Result};
pub use header::{BitmapFileHeader, BitmapInfoHeader, HEADERS_SIZE, PIXELS_PER_METRE};

/// Bitmap file signature ("BM").
pub const BMP_MAGIC: &[u8; 2] = b"BM";

/// Extension of JAM image entries.
pub const EXTENSION: &str = "BMP";
