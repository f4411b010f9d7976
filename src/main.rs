//! Ljam CLI - Command-line tool for Lego Racers JAM archives.
//!
//! This is the main entry point for the Ljam command-line application.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glob::Pattern;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use ljam::prelude::*;

/// Ljam - Lego Racers JAM archive extraction tool
#[derive(Parser)]
#[command(name = "ljam")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract files from a JAM archive, converting images to bitmaps
    Extract {
        /// Path to the JAM file
        #[arg(short, long, env = "INPUT_JAM")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, env = "OUTPUT_FOLDER")]
        output: PathBuf,

        /// Filter pattern (glob-style, case-insensitive)
        #[arg(short, long)]
        filter: Option<String>,

        /// Write payloads as stored, without converting images
        #[arg(long)]
        raw: bool,
    },

    /// List contents of a JAM archive
    List {
        /// Path to the JAM file
        #[arg(short, long, env = "INPUT_JAM")]
        input: PathBuf,

        /// Filter pattern (glob-style, case-insensitive)
        #[arg(short, long)]
        filter: Option<String>,

        /// Show payload sizes
        #[arg(short, long)]
        detailed: bool,

        /// Print a JSON array instead of plain text
        #[arg(long)]
        json: bool,
    },

    /// Convert a single JAM image file to a standard bitmap
    Convert {
        /// Input JAM image (.BMP)
        #[arg(short, long)]
        input: PathBuf,

        /// Output bitmap file
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// One row of `list --json` output.
#[derive(Serialize)]
struct ListEntry<'a> {
    path: &'a str,
    size: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            input,
            output,
            filter,
            raw,
        } => {
            cmd_extract(&input, &output, filter.as_deref(), raw)?;
        }
        Commands::List {
            input,
            filter,
            detailed,
            json,
        } => {
            cmd_list(&input, filter.as_deref(), detailed, json)?;
        }
        Commands::Convert { input, output } => {
            cmd_convert(&input, &output)?;
        }
    }

    Ok(())
}

fn unpack_options(filter: Option<&str>, transforms: bool) -> Result<UnpackOptions> {
    let filter = filter
        .map(Pattern::new)
        .transpose()
        .context("Invalid filter pattern")?;

    Ok(UnpackOptions { filter, transforms })
}

fn cmd_extract(input: &Path, output: &Path, filter: Option<&str>, raw: bool) -> Result<()> {
    println!("Opening JAM archive: {}", input.display());

    let options = unpack_options(filter, !raw)?;

    let start = Instant::now();
    let archive = JamArchive::open(input).context("Failed to open JAM archive")?;
    println!("Loaded {} files in {:?}", archive.file_count(), start.elapsed());

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    let summary = Unpacker::new(options)
        .unpack(archive, output, |done, total| {
            pb.set_length(total as u64);
            pb.set_position(done as u64);
        })
        .context("Failed to extract archive")?;

    pb.finish_with_message("Done");

    for failure in &summary.transform.failures {
        eprintln!("Kept original bytes: {failure}");
    }

    println!(
        "Extracted {} of {} files in {:?} ({} converted, {} conversion errors, {} write errors)",
        summary.extract.written,
        summary.selected,
        start.elapsed(),
        summary.transform.transformed,
        summary.transform.failures.len(),
        summary.extract.errors
    );

    if !summary.extract.is_complete() {
        anyhow::bail!("{} files could not be written", summary.extract.errors);
    }

    Ok(())
}

fn cmd_list(input: &Path, filter: Option<&str>, detailed: bool, json: bool) -> Result<()> {
    let archive = JamArchive::open(input).context("Failed to open JAM archive")?;
    let options = unpack_options(filter, false)?;
    let files = ljam::filter_files(archive.root(), &options);

    let size = |node: &ArchiveNode| node.payload().map_or(0, |p| p.size());

    if json {
        let entries: Vec<ListEntry> = files
            .iter()
            .map(|&f| ListEntry {
                path: f.path(),
                size: size(f),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for &file in &files {
        if detailed {
            println!("{:>12} {}", size(file), file.path());
        } else {
            println!("{}", file.path());
        }
    }

    println!("\nTotal: {} files", files.len());

    Ok(())
}

fn cmd_convert(input: &Path, output: &Path) -> Result<()> {
    println!("Converting: {} -> {}", input.display(), output.display());

    let data = ByteView::read_file(input).context("Failed to read input file")?;
    let bitmap = decode_bmp(&data).context("Failed to decode JAM image")?;
    fs::write(output, bitmap).context("Failed to write output file")?;

    println!("Conversion complete");

    Ok(())
}
