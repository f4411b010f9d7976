//! Per-file payload transforms.
//!
//! A [`TransformPipeline`] is an ordered registry of [`Transform`] variants.
//! Each variant knows which files it applies to and how to rewrite their
//! payload. Files are processed in parallel; a failing transform is logged
//! and reported, and the file keeps its original bytes.

use std::fmt;

use ljam_archive::ArchiveNode;
use ljam_common::ByteView;
use rayon::prelude::*;
use tracing::warn;

use crate::Result;

/// A payload rewrite for one embedded file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Decode compressed JAM images into standard bitmaps.
    Bitmap,
}

impl Transform {
    /// Every known transform, in default registration order.
    pub const ALL: &'static [Transform] = &[Transform::Bitmap];

    /// Short name for reporting.
    pub fn name(self) -> &'static str {
        match self {
            Transform::Bitmap => "bitmap",
        }
    }

    /// Check whether this transform applies to `node`.
    pub fn matches(self, node: &ArchiveNode) -> bool {
        if !node.is_file() {
            return false;
        }

        match self {
            Transform::Bitmap => has_extension(node.path(), ljam_bmp::EXTENSION),
        }
    }

    /// Produce the rewritten payload.
    pub fn apply(self, payload: &ByteView) -> Result<ByteView> {
        match self {
            Transform::Bitmap => Ok(ByteView::from_vec(ljam_bmp::decode_bmp(payload)?)),
        }
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn has_extension(path: &str, extension: &str) -> bool {
    path.rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case(extension))
}

/// A transform that failed on one file.
#[derive(Debug)]
pub struct TransformFailure {
    /// Archive path of the file.
    pub path: String,
    /// The transform that failed.
    pub transform: Transform,
    /// Why it failed.
    pub error: crate::Error,
}

impl fmt::Display for TransformFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} transform failed for {}: {}", self.transform, self.path, self.error)
    }
}

/// Outcome of running a pipeline over a batch of files.
#[derive(Debug, Default)]
pub struct TransformReport {
    /// Number of files whose payload was replaced.
    pub transformed: usize,
    /// Failures, one per failed (file, transform) pair.
    pub failures: Vec<TransformFailure>,
}

impl TransformReport {
    /// Check if every matching transform succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn merge(mut self, other: TransformReport) -> Self {
        self.transformed += other.transformed;
        self.failures.extend(other.failures);
        self
    }
}

/// Ordered registry of transforms applied to extracted files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformPipeline {
    transforms: Vec<Transform>,
}

impl Default for TransformPipeline {
    fn default() -> Self {
        Self {
            transforms: Transform::ALL.to_vec(),
        }
    }
}

impl TransformPipeline {
    /// Create a pipeline with every known transform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pipeline that leaves every file untouched.
    pub fn empty() -> Self {
        Self {
            transforms: Vec::new(),
        }
    }

    /// Append a transform.
    pub fn with(mut self, transform: Transform) -> Self {
        self.transforms.push(transform);
        self
    }

    /// Registered transforms, in application order.
    pub fn transforms(&self) -> &[Transform] {
        &self.transforms
    }

    /// Apply every matching transform to a single file, in order.
    pub fn apply(&self, node: &mut ArchiveNode) -> TransformReport {
        let mut report = TransformReport::default();
        let mut replaced = false;

        for &transform in &self.transforms {
            if !transform.matches(node) {
                continue;
            }
            let Some(payload) = node.payload() else {
                continue;
            };

            match transform.apply(payload) {
                Ok(output) => {
                    node.replace_payload(output);
                    replaced = true;
                }
                Err(error) => {
                    warn!(
                        path = node.path(),
                        transform = transform.name(),
                        %error,
                        "transform failed, keeping original bytes"
                    );
                    report.failures.push(TransformFailure {
                        path: node.path().to_string(),
                        transform,
                        error,
                    });
                }
            }
        }

        report.transformed = usize::from(replaced);
        report
    }

    /// Apply the pipeline to a batch of files in parallel.
    ///
    /// Each task only touches its own file, so no locking is needed.
    pub fn run(&self, files: &mut [&mut ArchiveNode]) -> TransformReport {
        files
            .par_iter_mut()
            .map(|node| self.apply(node))
            .reduce(TransformReport::default, TransformReport::merge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use ljam_archive::{JamArchive, JamBuilder};
    use ljam_common::ByteRead;

    /// A 2x1 8-bit image whose two pixels are `index`.
    fn image(index: u8) -> Vec<u8> {
        vec![
            0x08, 0x00, 0x02, 0x00, 0x01, 0x00, // header
            0x11, 0x22, 0x33, // palette
            0x02, 0x00, 0x02, 0x00, index, index, // block
        ]
    }

    fn archive(files: &[(&str, Vec<u8>)]) -> JamArchive {
        let mut builder = JamBuilder::new();
        for (path, data) in files {
            builder.add_file(path, data.clone()).unwrap();
        }
        JamArchive::parse(ByteView::from_vec(builder.build().unwrap())).unwrap()
    }

    #[test]
    fn test_matches_extension() {
        let archive = archive(&[
            ("MENU/A.BMP", image(0)),
            ("MENU/B.bmp", image(0)),
            ("MENU/C.BMP.BAK", Vec::new()),
            ("MENU/D.TXT", Vec::new()),
        ]);

        let matched: Vec<&str> = archive
            .files()
            .into_iter()
            .filter(|f| Transform::Bitmap.matches(f))
            .map(|f| f.path())
            .collect();
        assert_eq!(matched, ["MENU/A.BMP", "MENU/B.bmp"]);
        assert!(!Transform::Bitmap.matches(archive.find("MENU").unwrap()));
    }

    #[test]
    fn test_run_isolates_failures() {
        let corrupt = vec![0x42, 0x00, 0x02, 0x00, 0x01, 0x00];
        let mut archive = archive(&[
            ("A.BMP", image(0)),
            ("GFX/B.BMP", corrupt.clone()),
            ("GFX/C.BMP", image(0)),
            ("README.TXT", b"keep".to_vec()),
        ]);

        let pipeline = TransformPipeline::new();
        let mut files = archive.root_mut().flatten_mut();
        let report = pipeline.run(&mut files);

        assert_eq!(report.transformed, 2);
        assert_eq!(report.failures.len(), 1);
        let failure = &report.failures[0];
        assert_eq!(failure.path, "GFX/B.BMP");
        assert_eq!(failure.transform, Transform::Bitmap);
        assert!(matches!(
            failure.error,
            Error::Bitmap(ljam_bmp::Error::UnsupportedEncoding(0x42))
        ));

        for path in ["A.BMP", "GFX/C.BMP"] {
            let payload = archive.find(path).unwrap().payload().unwrap();
            assert_eq!(&payload.bytes()[..2], b"BM");
            assert_eq!(payload.size(), 54 + 4 + 4);
        }
        let untouched = archive.find("GFX/B.BMP").unwrap().payload().unwrap();
        assert_eq!(untouched.bytes(), corrupt.as_slice());
        let text = archive.find("README.TXT").unwrap().payload().unwrap();
        assert_eq!(text.bytes(), b"keep");
    }

    #[test]
    fn test_empty_pipeline_is_noop() {
        let mut archive = archive(&[("A.BMP", image(0))]);
        let mut files = archive.root_mut().flatten_mut();

        let report = TransformPipeline::empty().run(&mut files);
        assert_eq!(report.transformed, 0);
        assert!(report.is_clean());
        assert_eq!(archive.find("A.BMP").unwrap().payload().unwrap().bytes(), image(0).as_slice());
    }

    #[test]
    fn test_failure_display() {
        let mut archive = archive(&[("BAD.BMP", vec![0x08])]);
        let report = TransformPipeline::new().apply(archive.root_mut().flatten_mut().remove(0));

        let message = report.failures[0].to_string();
        assert!(message.starts_with("bitmap transform failed for BAD.BMP"));
    }
}
