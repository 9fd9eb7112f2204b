//! Command-line interface module for imgsort.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Run configuration and validation
//! - Pipeline orchestration for each mode
//! - User-facing progress and summary output

use crate::config::{RunConfig, SortConfig};
use crate::error::SortResult;
use crate::output::OutputFormatter;
use crate::pipeline::{RunSummary, SortPlan};
use crate::scanner;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

/// Operating mode of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortMode {
    /// Write a report of the planned result; copy nothing.
    #[value(alias = "dryrun")]
    Preview,
    /// Copy sorted files into the destination.
    Copy,
    /// Copy, verify, then delete the source contents.
    Move,
    /// Sort the source folder in place through a temporary sibling folder.
    #[value(alias = "sort")]
    Resort,
}

impl std::fmt::Display for SortMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SortMode::Preview => "preview",
            SortMode::Copy => "copy",
            SortMode::Move => "move",
            SortMode::Resort => "resort",
        };
        f.write_str(name)
    }
}

impl SortMode {
    fn description(&self) -> &'static str {
        match self {
            SortMode::Preview => "preview, only a report is written",
            SortMode::Copy => "sort images and copy them to the destination folder",
            SortMode::Move => "sort images and move them to the destination folder",
            SortMode::Resort => "sort images in place",
        }
    }
}

/// Sort images into folders named after their resolution.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// What to do with the sorted files
    #[arg(value_enum)]
    pub mode: SortMode,
    /// Folder to sort
    pub source: PathBuf,
    /// Folder to receive sorted files (not used by resort)
    pub destination: Option<PathBuf>,
    /// Configuration file (defaults to .imgsortrc.toml or ~/.config/imgsort/config.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Do not draw progress bars
    #[arg(long)]
    pub no_progress: bool,
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Result of a successful invocation.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// Preview report written to this path.
    Report(PathBuf),
    /// Files sorted and verified.
    Sorted(RunSummary),
}

/// Runs imgsort from parsed arguments.
pub fn run_cli(args: &Args) -> SortResult<RunOutcome> {
    let mut settings = SortConfig::load(args.config.as_deref())?.sort;
    if args.no_progress {
        settings.progress = false;
    }
    let config = RunConfig::new(
        args.mode,
        &args.source,
        args.destination.as_deref(),
        settings,
    )?;
    run(config)
}

/// Runs imgsort with an optional configuration file.
///
/// # Arguments
///
/// * `mode` - The operating mode
/// * `source` - The folder to sort
/// * `destination` - The folder receiving sorted files (ignored for resort)
/// * `config_path` - Optional path to configuration file
///
/// # Examples
///
/// ```no_run
/// use imgsort::cli::{run_cli_with_config, SortMode};
/// use std::path::Path;
///
/// let result = run_cli_with_config(
///     SortMode::Copy,
///     Path::new("/photos/unsorted"),
///     Some(Path::new("/photos/sorted")),
///     None,
/// );
/// if let Err(e) = result {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli_with_config(
    mode: SortMode,
    source: &Path,
    destination: Option<&Path>,
    config_path: Option<&Path>,
) -> SortResult<RunOutcome> {
    let settings = SortConfig::load(config_path)?.sort;
    run(RunConfig::new(mode, source, destination, settings)?)
}

/// Runs the pipeline for a validated configuration.
///
/// Preview stops after planning and writes a report. Every other mode copies,
/// verifies and only then finalizes.
pub fn run(config: RunConfig) -> SortResult<RunOutcome> {
    announce(&config)?;

    let mode = config.mode;
    let progress_enabled = config.settings.progress;
    let plan = SortPlan::prepare(config)?;
    let total = plan.records().len() as u64;

    if mode == SortMode::Preview {
        let report_path = plan.write_report()?;
        OutputFormatter::summary_table(&plan.bucket_counts(), plan.records().len());
        OutputFormatter::preview_notice(&format!(
            "Report written to {}. No files were copied.",
            report_path.display()
        ));
        return Ok(RunOutcome::Report(report_path));
    }

    let bucket_counts = plan.bucket_counts();
    let copying = OutputFormatter::create_progress_bar(total, "Copying", progress_enabled);
    let transferred = plan.transfer(&copying)?;

    let verifying = OutputFormatter::create_progress_bar(total, "Verifying", progress_enabled);
    let verified = transferred.verify(&verifying)?;
    OutputFormatter::success(&format!("{} files verified successfully", verified.summary().total));

    let summary = verified.finalize()?;
    OutputFormatter::summary_table(&bucket_counts, summary.verification.total);
    OutputFormatter::verification_line(&summary.verification);
    OutputFormatter::info(&format!(
        "Sorted files are in {}",
        summary.output_dir.display()
    ));
    Ok(RunOutcome::Sorted(summary))
}

fn announce(config: &RunConfig) -> SortResult<()> {
    OutputFormatter::header("Input parameters");
    OutputFormatter::plain(&format!("Source folder:\t{}", config.source.display()));
    if let Some(destination) = &config.destination {
        OutputFormatter::plain(&format!("Destination folder:\t{}", destination.display()));
    }
    OutputFormatter::plain(&format!(
        "Mode:\t\t{} ({})\n",
        config.mode,
        config.mode.description()
    ));

    for dir in scanner::subdirectories(&config.source)? {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match config.mode {
            SortMode::Preview | SortMode::Copy => OutputFormatter::info(&format!(
                "Folder \"{}\" was found in the source folder, its files are sorted too.",
                name
            )),
            SortMode::Move | SortMode::Resort => OutputFormatter::warning(&format!(
                "Folder \"{}\" was found in the source folder, its files are sorted \
                 and the folder is removed after verification.",
                name
            )),
        }
    }
    Ok(())
}
