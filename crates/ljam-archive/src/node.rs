//! Archive tree nodes.

use ljam_common::{ByteRead, ByteView};

/// Path separator used inside archives.
pub const SEPARATOR: char = '/';

/// A file or folder in a parsed JAM archive.
///
/// Files carry a payload view into the container and have no children.
/// Folders carry children and no payload. The root is a folder with an
/// empty name and path.
#[derive(Debug, Clone)]
pub struct ArchiveNode {
    name: String,
    path: String,
    children: Vec<ArchiveNode>,
    payload: Option<ByteView>,
}

impl ArchiveNode {
    /// Create an empty root folder.
    pub fn root() -> Self {
        Self {
            name: String::new(),
            path: String::new(),
            children: Vec::new(),
            payload: None,
        }
    }

    pub(crate) fn file(name: String, path: String, payload: ByteView) -> Self {
        Self {
            name,
            path,
            children: Vec::new(),
            payload: Some(payload),
        }
    }

    pub(crate) fn folder(name: String, path: String, children: Vec<ArchiveNode>) -> Self {
        Self {
            name,
            path,
            children,
            payload: None,
        }
    }

    pub(crate) fn set_children(&mut self, children: Vec<ArchiveNode>) {
        self.children = children;
    }

    /// Full path of a child named `name` under `parent_path`.
    ///
    /// Children of the root have no leading separator.
    pub fn child_path(parent_path: &str, name: &str) -> String {
        if parent_path.is_empty() {
            name.to_string()
        } else {
            format!("{parent_path}{SEPARATOR}{name}")
        }
    }

    /// Entry name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full path from the root, `/`-separated.
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Child nodes in index order.
    #[inline]
    pub fn children(&self) -> &[ArchiveNode] {
        &self.children
    }

    /// File contents, `None` for folders.
    #[inline]
    pub fn payload(&self) -> Option<&ByteView> {
        self.payload.as_ref()
    }

    /// Check if this node is a file.
    #[inline]
    pub fn is_file(&self) -> bool {
        self.payload.is_some()
    }

    /// Check if this node is a folder.
    #[inline]
    pub fn is_folder(&self) -> bool {
        self.payload.is_none()
    }

    /// Replace a file's payload, returning the previous one.
    ///
    /// Folders have no payload to replace; the call is ignored and returns
    /// `None`.
    pub fn replace_payload(&mut self, payload: ByteView) -> Option<ByteView> {
        if self.is_folder() {
            return None;
        }
        self.payload.replace(payload)
    }

    /// Get the file extension, if any.
    pub fn extension(&self) -> Option<&str> {
        self.name.rsplit_once('.').map(|(_, ext)| ext)
    }

    /// Collect every file below this node, depth first.
    pub fn flatten(&self) -> Vec<&ArchiveNode> {
        let mut files = Vec::new();
        self.collect_files(&mut files);
        files
    }

    /// Collect mutable references to every file below this node.
    pub fn flatten_mut(&mut self) -> Vec<&mut ArchiveNode> {
        let mut files = Vec::new();
        self.collect_files_mut(&mut files);
        files
    }

    fn collect_files<'a>(&'a self, files: &mut Vec<&'a ArchiveNode>) {
        for child in &self.children {
            if child.is_folder() {
                child.collect_files(files);
            } else {
                files.push(child);
            }
        }
    }

    fn collect_files_mut<'a>(&'a mut self, files: &mut Vec<&'a mut ArchiveNode>) {
        for child in &mut self.children {
            if child.is_folder() {
                child.collect_files_mut(files);
            } else {
                files.push(child);
            }
        }
    }

    /// Number of files below this node.
    pub fn file_count(&self) -> usize {
        self.children
            .iter()
            .map(|c| if c.is_file() { 1 } else { c.file_count() })
            .sum()
    }

    /// Total payload bytes below this node.
    pub fn total_size(&self) -> u64 {
        self.flatten()
            .iter()
            .filter_map(|f| f.payload())
            .map(|p| p.size() as u64)
            .sum()
    }

    /// Find a descendant by its path relative to this node.
    pub fn find(&self, path: &str) -> Option<&ArchiveNode> {
        path.split(SEPARATOR)
            .filter(|part| !part.is_empty())
            .try_fold(self, |node, part| {
                node.children.iter().find(|c| c.name == part)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(parent: &str, name: &str, bytes: &[u8]) -> ArchiveNode {
        ArchiveNode::file(
            name.into(),
            ArchiveNode::child_path(parent, name),
            ByteView::from_vec(bytes.to_vec()),
        )
    }

    fn sample_tree() -> ArchiveNode {
        let inner = ArchiveNode::folder(
            "INNER".into(),
            "DATA/INNER".into(),
            vec![file("DATA/INNER", "C.BIN", b"ccc")],
        );
        let data = ArchiveNode::folder(
            "DATA".into(),
            "DATA".into(),
            vec![file("DATA", "B.BMP", b"bb"), inner],
        );
        let empty = ArchiveNode::folder("EMPTY".into(), "EMPTY".into(), Vec::new());

        let mut root = ArchiveNode::root();
        root.set_children(vec![file("", "A.TXT", b"a"), data, empty]);
        root
    }

    #[test]
    fn test_child_path() {
        assert_eq!(ArchiveNode::child_path("", "MENU"), "MENU");
        assert_eq!(ArchiveNode::child_path("MENU", "A.BMP"), "MENU/A.BMP");
    }

    #[test]
    fn test_flatten_skips_folders() {
        let root = sample_tree();
        let paths: Vec<&str> = root.flatten().iter().map(|n| n.path()).collect();

        assert_eq!(paths, ["A.TXT", "DATA/B.BMP", "DATA/INNER/C.BIN"]);
        assert_eq!(root.file_count(), 3);
        assert_eq!(root.total_size(), 6);
    }

    #[test]
    fn test_flatten_mut_replaces_payload() {
        let mut root = sample_tree();
        for node in root.flatten_mut() {
            node.replace_payload(ByteView::from_vec(Vec::new()));
        }
        assert_eq!(root.total_size(), 0);
    }

    #[test]
    fn test_folder_payload_not_replaced() {
        let mut root = sample_tree();
        assert!(root.replace_payload(ByteView::from_vec(vec![1])).is_none());
        assert!(root.is_folder());
    }

    #[test]
    fn test_find() {
        let root = sample_tree();

        let node = root.find("DATA/INNER/C.BIN").unwrap();
        assert_eq!(node.payload().unwrap().bytes(), b"ccc");
        assert_eq!(node.extension(), Some("BIN"));
        assert!(root.find("DATA/INNER").unwrap().is_folder());
        assert!(root.find("DATA/MISSING").is_none());
    }
}
