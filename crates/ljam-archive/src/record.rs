//! Fixed-size index records.
//!
//! Each folder index is laid out as:
//!
//! ```text
//! u32 file_count
//! file_count   x { name: [u8; 12], offset: u32, size: u32 }
//! u32 folder_count
//! folder_count x { name: [u8; 12], offset: u32 }
//! ```
//!
//! All offsets are absolute positions in the container.

use ljam_common::{ByteRead, ByteView};

use crate::{Error, Result};

/// Length of the NUL-padded name field.
pub const NAME_LEN: usize = 12;

/// A file entry in a folder index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Entry name, NUL padding stripped.
    pub name: String,
    /// Absolute offset of the payload.
    pub offset: u32,
    /// Payload size in bytes.
    pub size: u32,
}

impl FileRecord {
    /// Size of a file record on disk.
    pub const SIZE: usize = 0x14;

    /// Read the record starting at `at`.
    pub fn read(view: &ByteView, at: usize) -> Result<Self> {
        Ok(Self {
            name: view.read_fixed_text(at, NAME_LEN)?,
            offset: view.read_u32(at + 0xC)?,
            size: view.read_u32(at + 0x10)?,
        })
    }
}

/// A sub-folder entry in a folder index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderRecord {
    /// Folder name, NUL padding stripped.
    pub name: String,
    /// Absolute offset of the folder's own index.
    pub offset: u32,
}

impl FolderRecord {
    /// Size of a folder record on disk.
    pub const SIZE: usize = 0x10;

    /// Read the record starting at `at`.
    pub fn read(view: &ByteView, at: usize) -> Result<Self> {
        Ok(Self {
            name: view.read_fixed_text(at, NAME_LEN)?,
            offset: view.read_u32(at + 0xC)?,
        })
    }
}

/// Slice out a table of `count` records, checking the whole table up front.
pub(crate) fn record_table(
    data: &ByteView,
    offset: usize,
    count: u32,
    record_size: usize,
) -> Result<ByteView> {
    let len = (count as usize)
        .checked_mul(record_size)
        .ok_or(Error::TableTooLarge { count })?;
    Ok(data.slice(offset, len)?)
}
