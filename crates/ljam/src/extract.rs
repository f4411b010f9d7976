//! Parallel extraction of archive files to disk.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use ljam_archive::{ArchiveNode, SEPARATOR};
use ljam_common::ByteRead;
use parking_lot::Mutex;
use rayon::prelude::*;
use tracing::warn;

use crate::{Error, Result};

/// Map an archive path onto a location under `root`.
///
/// Paths that are empty or would leave `root` (`..`, absolute paths, drive
/// prefixes) are refused.
pub fn output_path(root: &Path, archive_path: &str) -> Result<PathBuf> {
    let mut path = root.to_path_buf();

    for part in archive_path.split(SEPARATOR) {
        let mut components = Path::new(part).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => path.push(name),
            _ => return Err(Error::UnsafePath(archive_path.to_string())),
        }
    }

    Ok(path)
}

/// Write a single file under `root`, creating parent directories.
pub fn extract_file(node: &ArchiveNode, root: &Path) -> Result<PathBuf> {
    let path = output_path(root, node.path())?;
    let payload = node.payload().map(|p| p.bytes()).unwrap_or_default();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, payload)?;

    Ok(path)
}

/// Write every file under `output_dir` in parallel.
///
/// A file that fails to write is logged and counted; the rest of the batch
/// carries on. The progress callback receives (completed, total) counts.
pub fn extract_all<P, F>(files: &[&ArchiveNode], output_dir: P, mut progress: F) -> Result<ExtractStats>
where
    P: AsRef<Path>,
    F: FnMut(usize, usize) + Send,
{
    let output_dir = output_dir.as_ref();
    fs::create_dir_all(output_dir)?;

    let total = files.len();
    let written = AtomicUsize::new(0);
    let errors = AtomicUsize::new(0);
    let progress = Mutex::new(&mut progress);

    files.par_iter().for_each(|node| {
        match extract_file(node, output_dir) {
            Ok(_) => {
                written.fetch_add(1, Ordering::Relaxed);
            }
            Err(error) => {
                warn!(path = node.path(), %error, "failed to write file");
                errors.fetch_add(1, Ordering::Relaxed);
            }
        }

        let done = written.load(Ordering::Relaxed) + errors.load(Ordering::Relaxed);
        if done % 64 == 0 || done == total {
            if let Some(mut p) = progress.try_lock() {
                (*p)(done, total);
            }
        }
    });

    progress.lock()(total, total);

    Ok(ExtractStats {
        written: written.load(Ordering::Relaxed),
        errors: errors.load(Ordering::Relaxed),
        total,
    })
}

/// Statistics from an extraction run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
    /// Number of files written.
    pub written: usize,
    /// Number of files that failed to write.
    pub errors: usize,
    /// Total number of files attempted.
    pub total: usize,
}

impl ExtractStats {
    /// Check if every file was written.
    pub fn is_complete(&self) -> bool {
        self.errors == 0 && self.written == self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path() {
        let root = Path::new("out");
        assert_eq!(
            output_path(root, "MENU/TITLE.BMP").unwrap(),
            Path::new("out").join("MENU").join("TITLE.BMP")
        );
        assert_eq!(output_path(root, "A.TXT").unwrap(), root.join("A.TXT"));
    }

    #[test]
    fn test_output_path_rejects_escapes() {
        let root = Path::new("out");
        for path in ["", "..", "MENU/../../ETC", "./A", "/ABS", "MENU//A.BMP", "MENU/"] {
            assert!(
                matches!(output_path(root, path), Err(Error::UnsafePath(_))),
                "{path:?} accepted"
            );
        }
    }

    #[test]
    fn test_stats_complete() {
        let stats = ExtractStats { written: 3, errors: 0, total: 3 };
        assert!(stats.is_complete());

        let stats = ExtractStats { written: 2, errors: 1, total: 3 };
        assert!(!stats.is_complete());
    }
}
