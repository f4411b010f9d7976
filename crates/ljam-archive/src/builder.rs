//! JAM archive builder.
//!
//! Lays out folder tables depth first right after the magic, followed by the
//! file payloads in the same order. Mostly useful for producing fixtures.

use byteorder::{ByteOrder, LittleEndian};

use crate::node::SEPARATOR;
use crate::record::{FileRecord, FolderRecord, NAME_LEN};
use crate::{Error, Result, JAM_MAGIC};

#[derive(Debug, Default)]
struct FolderEntry {
    files: Vec<(String, Vec<u8>)>,
    folders: Vec<(String, FolderEntry)>,
}

impl FolderEntry {
    fn folder_mut(&mut self, name: &str) -> &mut FolderEntry {
        let index = match self.folders.iter().position(|(n, _)| n == name) {
            Some(index) => index,
            None => {
                self.folders.push((name.to_string(), FolderEntry::default()));
                self.folders.len() - 1
            }
        };
        &mut self.folders[index].1
    }
}

/// Builds a JAM container in memory.
///
/// # Example
///
/// ```
/// use ljam_archive::{JamArchive, JamBuilder};
/// use ljam_common::ByteView;
///
/// let mut builder = JamBuilder::new();
/// builder.add_file("MENU/TITLE.BMP", vec![0; 16])?;
///
/// let archive = JamArchive::parse(ByteView::from_vec(builder.build()?))?;
/// assert!(archive.find("MENU/TITLE.BMP").is_some());
/// # Ok::<(), ljam_archive::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct JamBuilder {
    root: FolderEntry,
}

impl JamBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file at a `/`-separated path, creating folders as needed.
    ///
    /// Every path component must be non-empty ASCII of at most 12 bytes.
    pub fn add_file(&mut self, path: &str, data: Vec<u8>) -> Result<&mut Self> {
        let mut parts: Vec<&str> = path.split(SEPARATOR).collect();
        let file_name = parts.pop().unwrap_or_default();

        for part in parts.iter().chain(std::iter::once(&file_name)) {
            validate_name(part)?;
        }

        let folder = parts
            .into_iter()
            .fold(&mut self.root, |folder, part| folder.folder_mut(part));
        folder.files.push((file_name.to_string(), data));

        Ok(self)
    }

    /// Serialize the container.
    pub fn build(&self) -> Result<Vec<u8>> {
        let mut out = JAM_MAGIC.to_vec();
        let mut pending = Vec::new();

        write_folder(&self.root, &mut out, &mut pending)?;

        for (patch_at, data) in pending {
            let offset = to_u32(out.len())?;
            LittleEndian::write_u32(&mut out[patch_at..patch_at + 4], offset);
            out.extend_from_slice(data);
        }

        to_u32(out.len())?;
        Ok(out)
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > NAME_LEN || !name.is_ascii() || name.contains('\0') {
        return Err(Error::InvalidName(name.to_string()));
    }
    Ok(())
}

fn to_u32(offset: usize) -> Result<u32> {
    u32::try_from(offset).map_err(|_| Error::TooLarge(offset))
}

fn push_name(out: &mut Vec<u8>, name: &str) {
    let mut field = [0u8; NAME_LEN];
    field[..name.len()].copy_from_slice(name.as_bytes());
    out.extend_from_slice(&field);
}

/// Write a folder table and its descendants, queueing payloads for the
/// data section as (offset field position, bytes).
fn write_folder<'a>(
    folder: &'a FolderEntry,
    out: &mut Vec<u8>,
    pending: &mut Vec<(usize, &'a [u8])>,
) -> Result<()> {
    out.extend_from_slice(&to_u32(folder.files.len())?.to_le_bytes());
    for (name, data) in &folder.files {
        push_name(out, name);
        pending.push((out.len(), data.as_slice()));
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&to_u32(data.len())?.to_le_bytes());
    }

    out.extend_from_slice(&to_u32(folder.folders.len())?.to_le_bytes());
    let table_start = out.len();
    for (name, _) in &folder.folders {
        push_name(out, name);
        out.extend_from_slice(&0u32.to_le_bytes());
    }
    debug_assert_eq!(out.len() - table_start, folder.folders.len() * FolderRecord::SIZE);

    for (i, (_, child)) in folder.folders.iter().enumerate() {
        let patch_at = table_start + i * FolderRecord::SIZE + NAME_LEN;
        let offset = to_u32(out.len())?;
        LittleEndian::write_u32(&mut out[patch_at..patch_at + 4], offset);
        write_folder(child, out, pending)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_archive_layout() {
        let data = JamBuilder::new().build().unwrap();
        assert_eq!(data, b"LJAM\0\0\0\0\0\0\0\0");
    }

    #[test]
    fn test_single_file_layout() {
        let mut builder = JamBuilder::new();
        builder.add_file("A.BIN", vec![0xAA, 0xBB]).unwrap();
        let data = builder.build().unwrap();

        let index_end = 4 + 4 + FileRecord::SIZE + 4;
        assert_eq!(data.len(), index_end + 2);
        assert_eq!(&data[8..13], b"A.BIN");
        assert_eq!(LittleEndian::read_u32(&data[20..24]), index_end as u32);
        assert_eq!(LittleEndian::read_u32(&data[24..28]), 2);
        assert_eq!(&data[index_end..], &[0xAA, 0xBB]);
    }

    #[test]
    fn test_rejects_bad_names() {
        let mut builder = JamBuilder::new();
        assert!(builder.add_file("THIRTEEN.CHAR", Vec::new()).is_err());
        assert!(builder.add_file("MENU//A.BMP", Vec::new()).is_err());
        assert!(builder.add_file("", Vec::new()).is_err());
        assert!(builder.add_file("MENÜ/A.BMP", Vec::new()).is_err());
    }
}
