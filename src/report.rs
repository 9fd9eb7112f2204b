//! Preview report rendering.
//!
//! A preview lists, per bucket, the file names the sort would produce, next to
//! the structure of the source tree. The report is the only file a preview
//! writes.

use crate::config::ReportFormat;
use crate::error::{SortError, SortResult};
use crate::planner::disambiguate;
use crate::record::{FileRecord, group_by_bucket};
use crate::scanner::DirectoryStructure;
use serde::Serialize;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

/// Base name of the report file; the extension follows the format.
pub const REPORT_NAME: &str = "Preview report";

const COLLISION_NOTE: &str = "Existing folders are reused. A file whose name is already taken \
in its folder is renamed with a numeric suffix, e.g. \"photo(1).jpg\".";

/// Everything shown in a preview report.
#[derive(Debug, Clone, Serialize)]
pub struct PreviewReport {
    pub generated_at: String,
    pub source: String,
    pub destination: String,
    pub total_files: usize,
    pub images: usize,
    pub non_images: usize,
    /// Bucket -> resulting file names, both sorted.
    pub buckets: BTreeMap<String, Vec<String>>,
    /// Source directory -> file names.
    pub structure: DirectoryStructure,
}

impl PreviewReport {
    /// Builds the report from planned records.
    pub fn new(
        source: &Path,
        destination: &Path,
        records: &[FileRecord],
        structure: DirectoryStructure,
    ) -> Self {
        let buckets = group_by_bucket(records)
            .into_iter()
            .map(|(key, members)| {
                let mut names: Vec<String> =
                    members.iter().map(|r| r.destination_name()).collect();
                names.sort();
                (key.to_string(), names)
            })
            .collect();
        let images = records.iter().filter(|r| r.probe().is_image()).count();

        Self {
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            source: source.display().to_string(),
            destination: destination.display().to_string(),
            total_files: records.len(),
            images,
            non_images: records.len() - images,
            buckets,
            structure,
        }
    }

    /// Renders the report in the requested format.
    pub fn render(&self, format: ReportFormat) -> SortResult<String> {
        match format {
            ReportFormat::Html => Ok(self.render_html()),
            ReportFormat::Text => Ok(self.render_text()),
            ReportFormat::Json => serde_json::to_string_pretty(self).map_err(|e| SortError::Report {
                path: PathBuf::from(&self.destination),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("JSON serialization failed: {}", e),
                ),
            }),
        }
    }

    /// Writes the report into `dir` without replacing an existing report.
    pub fn write_to(&self, dir: &Path, format: ReportFormat) -> SortResult<PathBuf> {
        let content = self.render(format)?;
        let file_name = OsString::from(format!("{}.{}", REPORT_NAME, format.extension()));
        let path = disambiguate(dir, &file_name, |candidate| candidate.exists());

        fs::write(&path, content).map_err(|e| SortError::Report {
            path: path.clone(),
            source: e,
        })?;
        log::info!("preview report written to {}", path.display());
        Ok(path)
    }

    fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Preview generated {}", self.generated_at);
        let _ = writeln!(out, "Source folder: {}", self.source);
        let _ = writeln!(out, "Destination folder: {}", self.destination);
        let _ = writeln!(
            out,
            "{} files: {} images, {} non-images\n",
            self.total_files, self.images, self.non_images
        );
        let _ = writeln!(out, "{}\n", COLLISION_NOTE);

        let _ = writeln!(out, "After sorting the destination folder will contain:");
        write_tree_text(&mut out, &self.buckets);
        let _ = writeln!(out, "\nOriginal structure of the source folder:");
        write_tree_text(&mut out, &self.structure);
        out
    }

    fn render_html(&self) -> String {
        let mut out = String::new();
        out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
        out.push_str("<title>imgsort preview</title>\n");
        out.push_str(
            "<style>body{font-family:sans-serif;margin:2em}\
             h3{margin-bottom:.2em}ul{margin-top:0}</style>\n",
        );
        out.push_str("</head>\n<body>\n<h1>Preview</h1>\n");
        let _ = writeln!(out, "<h2>Source folder: {}</h2>", escape_html(&self.source));
        let _ = writeln!(
            out,
            "<h2>Destination folder: {}</h2>",
            escape_html(&self.destination)
        );
        let _ = writeln!(
            out,
            "<p>Generated {}. {} files: {} images, {} non-images.</p>",
            escape_html(&self.generated_at),
            self.total_files,
            self.images,
            self.non_images
        );
        let _ = writeln!(out, "<p><em>{}</em></p>", escape_html(COLLISION_NOTE));

        out.push_str("<section id=\"result\">\n<h2>After sorting</h2>\n");
        write_tree_html(&mut out, &self.buckets);
        out.push_str("</section>\n<section id=\"original\">\n<h2>Original structure</h2>\n");
        write_tree_html(&mut out, &self.structure);
        out.push_str("</section>\n</body>\n</html>\n");
        out
    }
}

fn write_tree_text(out: &mut String, tree: &BTreeMap<String, Vec<String>>) {
    for (dir, names) in tree {
        let _ = writeln!(out, "{}", dir);
        for name in names {
            let _ = writeln!(out, "\t{}", name);
        }
    }
}

fn write_tree_html(out: &mut String, tree: &BTreeMap<String, Vec<String>>) {
    for (dir, names) in tree {
        let _ = writeln!(out, "<h3>{}</h3>\n<ul>", escape_html(dir));
        for name in names {
            let _ = writeln!(out, "<li>{}</li>", escape_html(name));
        }
        out.push_str("</ul>\n");
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::PlacementPlanner;
    use crate::record::ImageProbe;
    use tempfile::TempDir;

    fn sample_report(destination: &Path) -> PreviewReport {
        let mut records = vec![
            FileRecord::new(
                PathBuf::from("/src/b.png"),
                ImageProbe::Sized {
                    width: 100,
                    height: 100,
                },
                "100x100".to_string(),
                Some("image/png".to_string()),
            ),
            FileRecord::new(
                PathBuf::from("/src/sub/b.png"),
                ImageProbe::Sized {
                    width: 100,
                    height: 100,
                },
                "100x100".to_string(),
                Some("image/png".to_string()),
            ),
            FileRecord::new(
                PathBuf::from("/src/<notes>.txt"),
                ImageProbe::Unclassifiable,
                "Not images".to_string(),
                None,
            ),
        ];
        PlacementPlanner::new(destination).place_all(&mut records);

        let mut structure = DirectoryStructure::new();
        structure.insert(".".to_string(), vec!["<notes>.txt".to_string(), "b.png".to_string()]);
        structure.insert("sub".to_string(), vec!["b.png".to_string()]);
        PreviewReport::new(Path::new("/src"), destination, &records, structure)
    }

    #[test]
    fn test_report_lists_planned_names() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let report = sample_report(temp_dir.path());

        assert_eq!(report.total_files, 3);
        assert_eq!(report.images, 2);
        assert_eq!(report.non_images, 1);
        assert_eq!(report.buckets["100x100"], vec!["b(1).png", "b.png"]);
        assert_eq!(report.buckets["Not images"], vec!["<notes>.txt"]);
    }

    #[test]
    fn test_text_report() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let text = sample_report(temp_dir.path()).render(ReportFormat::Text).unwrap();

        assert!(text.contains("100x100\n\tb(1).png\n\tb.png\n"));
        assert!(text.contains("Original structure of the source folder:"));
        assert!(text.contains("sub\n\tb.png\n"));
    }

    #[test]
    fn test_html_report_escapes_names() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let html = sample_report(temp_dir.path()).render(ReportFormat::Html).unwrap();

        assert!(html.contains("<li>&lt;notes&gt;.txt</li>"));
        assert!(!html.contains("<li><notes>"));
        assert!(html.contains("<h3>Not images</h3>"));
    }

    #[test]
    fn test_json_report() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let json = sample_report(temp_dir.path()).render(ReportFormat::Json).unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["total_files"], 3);
        assert_eq!(value["buckets"]["100x100"][0], "b(1).png");
    }

    #[test]
    fn test_write_does_not_replace_existing_report() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let report = sample_report(temp_dir.path());

        let first = report.write_to(temp_dir.path(), ReportFormat::Text).unwrap();
        let second = report.write_to(temp_dir.path(), ReportFormat::Text).unwrap();
        assert_eq!(first, temp_dir.path().join("Preview report.txt"));
        assert_eq!(second, temp_dir.path().join("Preview report(1).txt"));
    }
}
