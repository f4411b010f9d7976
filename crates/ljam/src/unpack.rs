//! End-to-end unpacking: open, parse, filter, transform, extract.

use std::path::Path;
use std::time::Instant;

use glob::{MatchOptions, Pattern};
use ljam_archive::{ArchiveNode, JamArchive};
use tracing::info;

use crate::extract::{extract_all, ExtractStats};
use crate::transform::{TransformPipeline, TransformReport};
use crate::Result;

/// Archive names are upper case in practice but matched case-insensitively.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Options controlling an unpack run.
#[derive(Debug, Clone)]
pub struct UnpackOptions {
    /// Only files whose archive path matches this pattern are processed.
    pub filter: Option<Pattern>,
    /// Run the transform pipeline before writing.
    pub transforms: bool,
}

impl Default for UnpackOptions {
    fn default() -> Self {
        Self {
            filter: None,
            transforms: true,
        }
    }
}

impl UnpackOptions {
    /// Check whether an archive path passes the filter.
    pub fn matches(&self, path: &str) -> bool {
        self.filter
            .as_ref()
            .map_or(true, |pattern| pattern.matches_with(path, MATCH_OPTIONS))
    }
}

/// Files below `root` that pass the filter, depth first.
pub fn filter_files<'a>(root: &'a ArchiveNode, options: &UnpackOptions) -> Vec<&'a ArchiveNode> {
    let mut files = root.flatten();
    files.retain(|f| options.matches(f.path()));
    files
}

/// Outcome of an unpack run.
#[derive(Debug)]
pub struct UnpackSummary {
    /// Files in the archive.
    pub archive_files: usize,
    /// Files selected by the filter.
    pub selected: usize,
    /// Transform results.
    pub transform: TransformReport,
    /// Write results.
    pub extract: ExtractStats,
}

impl UnpackSummary {
    /// Check if every selected file was transformed (where applicable) and
    /// written.
    pub fn is_clean(&self) -> bool {
        self.transform.is_clean() && self.extract.is_complete()
    }
}

/// Runs the unpack phases over one archive.
///
/// # Example
///
/// ```no_run
/// use ljam::{Unpacker, UnpackOptions};
///
/// let summary = Unpacker::new(UnpackOptions::default())
///     .run("GAMEDATA.JAM", "out", |_, _| {})?;
/// println!("{} files written", summary.extract.written);
/// # Ok::<(), ljam::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Unpacker {
    options: UnpackOptions,
    pipeline: TransformPipeline,
}

impl Unpacker {
    /// Create an unpacker with the default transform pipeline.
    pub fn new(options: UnpackOptions) -> Self {
        Self {
            options,
            pipeline: TransformPipeline::default(),
        }
    }

    /// Replace the transform pipeline.
    pub fn with_pipeline(mut self, pipeline: TransformPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Get the options.
    pub fn options(&self) -> &UnpackOptions {
        &self.options
    }

    /// Open `input`, then extract its files under `output_dir`.
    pub fn run<P, Q, F>(&self, input: P, output_dir: Q, progress: F) -> Result<UnpackSummary>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
        F: FnMut(usize, usize) + Send,
    {
        let start = Instant::now();
        let archive = JamArchive::open(input.as_ref())?;
        info!(
            archive = archive.name(),
            files = archive.file_count(),
            elapsed = ?start.elapsed(),
            "parsed archive"
        );

        self.unpack(archive, output_dir, progress)
    }

    /// Extract an already parsed archive under `output_dir`.
    pub fn unpack<Q, F>(&self, mut archive: JamArchive, output_dir: Q, progress: F) -> Result<UnpackSummary>
    where
        Q: AsRef<Path>,
        F: FnMut(usize, usize) + Send,
    {
        let archive_files = archive.file_count();
        let mut files = archive.root_mut().flatten_mut();
        files.retain(|f| self.options.matches(f.path()));
        let selected = files.len();

        let transform = if self.options.transforms {
            let start = Instant::now();
            let report = self.pipeline.run(&mut files);
            info!(
                transformed = report.transformed,
                failed = report.failures.len(),
                elapsed = ?start.elapsed(),
                "transformed files"
            );
            report
        } else {
            TransformReport::default()
        };

        let start = Instant::now();
        let files: Vec<&ArchiveNode> = files.into_iter().map(|f| &*f).collect();
        let extract = extract_all(&files, output_dir, progress)?;
        info!(
            written = extract.written,
            errors = extract.errors,
            elapsed = ?start.elapsed(),
            "extracted files"
        );

        Ok(UnpackSummary {
            archive_files,
            selected,
            transform,
            extract,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ljam_archive::JamBuilder;
    use ljam_common::ByteView;

    fn sample_archive() -> JamArchive {
        let mut builder = JamBuilder::new();
        builder.add_file("MENU/TITLE.BMP", vec![0x08]).unwrap();
        builder.add_file("MENU/FONT.BIN", vec![1]).unwrap();
        builder.add_file("TRACKS/T1.BMP", vec![2]).unwrap();
        JamArchive::parse(ByteView::from_vec(builder.build().unwrap())).unwrap()
    }

    #[test]
    fn test_no_filter_matches_everything() {
        let options = UnpackOptions::default();
        assert!(options.transforms);
        assert!(options.matches("ANY/PATH.BIN"));
    }

    #[test]
    fn test_filter_files() {
        let archive = sample_archive();
        let options = UnpackOptions {
            filter: Some(Pattern::new("*.bmp").unwrap()),
            ..Default::default()
        };

        let paths: Vec<&str> = filter_files(archive.root(), &options)
            .iter()
            .map(|f| f.path())
            .collect();
        assert_eq!(paths, ["MENU/TITLE.BMP", "TRACKS/T1.BMP"]);

        let options = UnpackOptions {
            filter: Some(Pattern::new("MENU/*").unwrap()),
            ..Default::default()
        };
        assert_eq!(filter_files(archive.root(), &options).len(), 2);
    }
}
