//! Output formatting and styling module.
//!
//! Provides a centralized interface for all user-facing output: colored status
//! lines, progress bars for the copy and verification passes, and the per-bucket
//! summary table. Diagnostics go through the `log` facade instead.

use crate::verify::VerificationSummary;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use imgsort::output::OutputFormatter;
    /// OutputFormatter::success("12 files verified");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates a progress bar for `total` files, or a hidden one when
    /// progress output is disabled.
    ///
    /// ```no_run
    /// use imgsort::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(100, "Copying", true);
    /// pb.inc(1);
    /// pb.finish_and_clear();
    /// ```
    pub fn create_progress_bar(total: u64, prefix: &str, enabled: bool) -> ProgressBar {
        if !enabled {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{prefix:>9.bold} {spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb.set_prefix(prefix.to_string());
        pb
    }

    /// Prints a table with the number of files per bucket.
    pub fn summary_table(bucket_counts: &BTreeMap<String, usize>, total_files: usize) {
        Self::header("SUMMARY");

        let max_bucket_len = bucket_counts
            .keys()
            .map(|name| name.len())
            .max()
            .unwrap_or(0)
            .max(6); // At least "Folder" width

        println!(
            "{:<width$} | {}",
            "Folder".bold(),
            "Files".bold(),
            width = max_bucket_len
        );
        println!("{}", "-".repeat(max_bucket_len + 10));

        for (bucket, count) in bucket_counts {
            println!(
                "{:<width$} | {} {}",
                bucket,
                count.to_string().green(),
                plural(*count),
                width = max_bucket_len
            );
        }

        println!("{}", "-".repeat(max_bucket_len + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            plural(total_files),
            width = max_bucket_len
        );
    }

    /// Prints the one-line result of a verified run.
    pub fn verification_line(summary: &VerificationSummary) {
        Self::success(&summary_line(summary));
    }

    /// Prints a preview notice message.
    pub fn preview_notice(message: &str) {
        println!("{}", format!("[PREVIEW] {}", message).yellow());
    }
}

/// `"3 files processed: 2 images, 1 non-image"`.
pub fn summary_line(summary: &VerificationSummary) -> String {
    format!(
        "{} {} processed: {} {}, {} {}",
        summary.total,
        plural(summary.total),
        summary.images,
        if summary.images == 1 { "image" } else { "images" },
        summary.non_images,
        if summary.non_images == 1 {
            "non-image"
        } else {
            "non-images"
        }
    )
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}
