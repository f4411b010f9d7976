//! JAM archive reader.
//!
//! The index is a tree of folder tables. Each folder table is independent of
//! its siblings, so sub-folders are parsed in parallel (with the `parallel`
//! feature) and joined in index order before the parent returns.

use std::path::Path;
use std::time::Instant;

use ljam_common::{ByteRead, ByteView};
use tracing::debug;

use crate::node::ArchiveNode;
use crate::record::{record_table, FileRecord, FolderRecord};
use crate::{Error, Result, JAM_MAGIC};

/// Offset of the root folder table.
pub const ROOT_OFFSET: usize = 4;

/// Deepest folder nesting accepted before the index is treated as cyclic.
pub const MAX_DEPTH: usize = 64;

/// A parsed JAM archive.
///
/// File payloads are views into the container buffer, so nothing is copied
/// until a payload is transformed or written out.
pub struct JamArchive {
    /// Container bytes
    data: ByteView,
    /// Archive file name
    name: String,
    /// Parsed folder tree
    root: ArchiveNode,
}

impl JamArchive {
    /// Memory-map and parse a JAM file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = ByteView::map_file(path)?;

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        Self::parse_named(data, name)
    }

    /// Parse a container already in memory.
    pub fn parse(data: ByteView) -> Result<Self> {
        Self::parse_named(data, "memory".to_string())
    }

    fn parse_named(data: ByteView, name: String) -> Result<Self> {
        let start = Instant::now();
        let root = parse_tree(&data)?;

        debug!(
            archive = %name,
            files = root.file_count(),
            elapsed = ?start.elapsed(),
            "parsed archive index"
        );

        Ok(Self { data, name, root })
    }

    /// Get the archive name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the container bytes.
    #[inline]
    pub fn data(&self) -> &ByteView {
        &self.data
    }

    /// Get the root folder.
    #[inline]
    pub fn root(&self) -> &ArchiveNode {
        &self.root
    }

    /// Get the root folder mutably, for payload replacement.
    #[inline]
    pub fn root_mut(&mut self) -> &mut ArchiveNode {
        &mut self.root
    }

    /// Take the tree, dropping the archive handle.
    ///
    /// Payloads keep the container buffer alive.
    pub fn into_root(self) -> ArchiveNode {
        self.root
    }

    /// Number of files in the archive.
    #[inline]
    pub fn file_count(&self) -> usize {
        self.root.file_count()
    }

    /// All files, depth first.
    pub fn files(&self) -> Vec<&ArchiveNode> {
        self.root.flatten()
    }

    /// Find a file or folder by path.
    pub fn find(&self, path: &str) -> Option<&ArchiveNode> {
        self.root.find(path)
    }
}

impl std::fmt::Debug for JamArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JamArchive")
            .field("name", &self.name)
            .field("size", &self.data.size())
            .field("files", &self.root.file_count())
            .finish()
    }
}

/// Verify the magic and parse the whole folder tree.
pub fn parse_tree(data: &ByteView) -> Result<ArchiveNode> {
    let magic = data.read_bytes(0, JAM_MAGIC.len()).unwrap_or(data.bytes());
    if magic != JAM_MAGIC {
        return Err(Error::InvalidMagic {
            actual: magic.to_vec(),
        });
    }

    let mut root = ArchiveNode::root();
    let children = parse_folder(data, ROOT_OFFSET, root.path(), 0)?;
    root.set_children(children);
    Ok(root)
}

fn parse_folder(data: &ByteView, offset: usize, path: &str, depth: usize) -> Result<Vec<ArchiveNode>> {
    if depth > MAX_DEPTH {
        return Err(Error::TooDeep { depth: MAX_DEPTH });
    }

    let file_count = data.read_u32(offset)?;
    let file_table = record_table(data, offset + 4, file_count, FileRecord::SIZE)?;

    let mut children = Vec::with_capacity(file_count as usize);
    for at in (0..file_table.size()).step_by(FileRecord::SIZE) {
        let record = FileRecord::read(&file_table, at)?;
        let payload = data.slice(record.offset as usize, record.size as usize)?;
        let path = ArchiveNode::child_path(path, &record.name);
        children.push(ArchiveNode::file(record.name, path, payload));
    }

    let folder_offset = offset + 4 + file_table.size();
    let folder_count = data.read_u32(folder_offset)?;
    let folder_table = record_table(data, folder_offset + 4, folder_count, FolderRecord::SIZE)?;

    let records = (0..folder_table.size())
        .step_by(FolderRecord::SIZE)
        .map(|at| FolderRecord::read(&folder_table, at))
        .collect::<Result<Vec<_>>>()?;

    debug!(
        path,
        offset,
        files = file_count,
        folders = folder_count,
        "parsing folder table"
    );

    let parse_child = |record: FolderRecord| -> Result<ArchiveNode> {
        let child_path = ArchiveNode::child_path(path, &record.name);
        let grandchildren = parse_folder(data, record.offset as usize, &child_path, depth + 1)?;
        Ok(ArchiveNode::folder(record.name, child_path, grandchildren))
    };

    #[cfg(feature = "parallel")]
    let folders = {
        use rayon::prelude::*;
        records
            .into_par_iter()
            .map(parse_child)
            .collect::<Result<Vec<_>>>()?
    };

    #[cfg(not(feature = "parallel"))]
    let folders = records
        .into_iter()
        .map(parse_child)
        .collect::<Result<Vec<_>>>()?;

    children.extend(folders);
    Ok(children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JamBuilder;

    fn sample_archive() -> JamArchive {
        let mut builder = JamBuilder::new();
        builder.add_file("README.TXT", b"hello".to_vec()).unwrap();
        builder.add_file("MENU/TITLE.BMP", vec![1, 2, 3]).unwrap();
        builder.add_file("MENU/FONTS/BIG.BMP", vec![4; 10]).unwrap();
        builder.add_file("MENU/FONTS/SMALL.BMP", vec![5; 2]).unwrap();
        builder.add_file("TRACKS/T1.BIN", Vec::new()).unwrap();

        JamArchive::parse(ByteView::from_vec(builder.build().unwrap())).unwrap()
    }

    #[test]
    fn test_parse_tree() {
        let archive = sample_archive();
        let root = archive.root();

        assert_eq!(root.name(), "");
        assert_eq!(root.path(), "");
        assert!(root.payload().is_none());

        let names: Vec<&str> = root.children().iter().map(|c| c.name()).collect();
        assert_eq!(names, ["README.TXT", "MENU", "TRACKS"]);

        let big = archive.find("MENU/FONTS/BIG.BMP").unwrap();
        assert_eq!(big.path(), "MENU/FONTS/BIG.BMP");
        assert_eq!(big.payload().unwrap().bytes(), &[4; 10]);
    }

    #[test]
    fn test_flatten_reaches_every_file() {
        let archive = sample_archive();
        let mut paths: Vec<&str> = archive.files().iter().map(|f| f.path()).collect();
        paths.sort_unstable();

        assert_eq!(
            paths,
            [
                "MENU/FONTS/BIG.BMP",
                "MENU/FONTS/SMALL.BMP",
                "MENU/TITLE.BMP",
                "README.TXT",
                "TRACKS/T1.BIN",
            ]
        );
        assert_eq!(archive.file_count(), 5);
    }

    #[test]
    fn test_payloads_are_views() {
        let archive = sample_archive();
        let readme = archive.find("README.TXT").unwrap().payload().unwrap();

        assert!(readme.same_buffer(archive.data()));
        assert_eq!(readme.bytes(), b"hello");
    }

    #[test]
    fn test_invalid_magic() {
        let err = JamArchive::parse(ByteView::from_vec(b"PK\x03\x04\0\0\0\0\0\0\0\0".to_vec()))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidMagic { ref actual } if actual == b"PK\x03\x04"));

        let err = JamArchive::parse(ByteView::from_vec(b"LJ".to_vec())).unwrap_err();
        assert!(matches!(err, Error::InvalidMagic { .. }));
    }

    #[test]
    fn test_truncated_index() {
        let mut data = JAM_MAGIC.to_vec();
        data.extend_from_slice(&2u32.to_le_bytes());
        data.extend_from_slice(&[0; FileRecord::SIZE]);

        let err = JamArchive::parse(ByteView::from_vec(data)).unwrap_err();
        assert!(matches!(err, Error::Common(_)));
    }

    #[test]
    fn test_payload_out_of_bounds() {
        let mut data = JAM_MAGIC.to_vec();
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(b"A.BIN\0\0\0\0\0\0\0");
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&0x1000u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());

        let err = JamArchive::parse(ByteView::from_vec(data)).unwrap_err();
        assert!(matches!(err, Error::Common(ljam_common::Error::OutOfBounds { .. })));
    }

    #[test]
    fn test_cyclic_folder_rejected() {
        let mut data = JAM_MAGIC.to_vec();
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(b"LOOP\0\0\0\0\0\0\0\0");
        data.extend_from_slice(&(ROOT_OFFSET as u32).to_le_bytes());

        let err = JamArchive::parse(ByteView::from_vec(data)).unwrap_err();
        assert!(matches!(err, Error::TooDeep { .. }));
    }
}
