//! JAM archive reader for Lego Racers game files.
//!
//! A JAM container is a single file holding a tree of folder tables and the
//! payload bytes they point at:
//!
//! - Offset 0: the magic `LJAM`
//! - Offset 4: the root folder table
//! - Each folder table lists its files (name, offset, size) and then its
//!   sub-folders (name, offset of the sub-folder's own table)
//!
//! Parsing produces an [`ArchiveNode`] tree whose file payloads are zero-copy
//! [`ByteView`](ljam_common::ByteView)s into the container buffer.
//!
//! # Example
//!
//! ```no_run
//! use ljam_archive::JamArchive;
//! use ljam_common::ByteRead;
//!
//! let archive = JamArchive::open("LEGO.JAM")?;
//!
//! for file in archive.files() {
//!     let size = file.payload().map_or(0, |p| p.size());
//!     println!("{}: {} bytes", file.path(), size);
//! }
//! # Ok::<(), ljam_archive::Error>(())
//! ```

mod archive;
mod builder;
mod error;
mod node;
pub mod record;

pub use archive::{parse_tree, JamArchive, MAX_DEPTH, ROOT_OFFSET};
pub use builder::JamBuilder;
pub use error::{Error, Result};
pub use node::{ArchiveNode, SEPARATOR};

/// JAM file magic bytes ("LJAM").
pub const JAM_MAGIC: &[u8; 4] = b"LJAM";
