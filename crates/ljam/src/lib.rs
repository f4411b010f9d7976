//! Ljam - Lego Racers JAM archive extraction library.
//!
//! This crate ties the Ljam crates together into an extraction workflow:
//! parse a JAM container, pick files, convert embedded images, and write
//! everything to disk.
//!
//! # Crates
//!
//! - [`ljam_common`] - Bounds-checked byte views and bit flags
//! - [`ljam_archive`] - JAM container parsing and building
//! - [`ljam_bmp`] - JAM image decompression to standard bitmaps
//!
//! # Example
//!
//! ```no_run
//! use ljam::prelude::*;
//!
//! let mut archive = JamArchive::open("GAMEDATA.JAM")?;
//! let mut files = archive.root_mut().flatten_mut();
//!
//! let report = TransformPipeline::default().run(&mut files);
//! println!("Converted {} images", report.transformed);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod extract;
pub mod transform;
pub mod unpack;

pub use ljam_archive as archive;
pub use ljam_bmp as bmp;
pub use ljam_common as common;

pub use error::{Error, Result};
pub use extract::{extract_all, extract_file, output_path, ExtractStats};
pub use transform::{Transform, TransformFailure, TransformPipeline, TransformReport};
pub use unpack::{filter_files, UnpackOptions, UnpackSummary, Unpacker};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{
        ExtractStats, TransformPipeline, TransformReport, UnpackOptions, UnpackSummary, Unpacker,
    };
    pub use ljam_archive::{ArchiveNode, JamArchive, JamBuilder};
    pub use ljam_bmp::decode_bmp;
    pub use ljam_common::{ByteRead, ByteView, ByteViewMut};
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
