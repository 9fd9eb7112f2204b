//! The sort-and-verify pipeline as a sequence of stage types.
//!
//! ```text
//! SortPlan::prepare   scan -> classify -> plan
//!   .write_report()   preview ends here
//!   .transfer()       -> TransferredRun
//!   .verify()         -> VerifiedRun
//!   .finalize()       delete source / rename working directory
//! ```
//!
//! Each stage consumes the previous one, and only [`VerifiedRun`] can delete or
//! rename anything, so a run whose verification failed has no way to reach the
//! destructive steps.

use crate::classifier::Classifier;
use crate::cli::SortMode;
use crate::config::{RunConfig, resolve_existing_prefix};
use crate::error::{SortError, SortResult};
use crate::finalizer::{RootPolicy, delete_source, finalize_rename};
use crate::planner::PlacementPlanner;
use crate::record::{FileRecord, group_by_bucket};
use crate::report::PreviewReport;
use crate::scanner;
use crate::transfer::TransferExecutor;
use crate::verify::{VerificationSummary, verify_records};
use indicatif::ProgressBar;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Scanned, classified and planned files, before anything is written.
#[derive(Debug)]
pub struct SortPlan {
    config: RunConfig,
    working_dir: PathBuf,
    records: Vec<FileRecord>,
}

impl SortPlan {
    /// Scans the source, classifies every file and plans its destination.
    ///
    /// Nothing is written. For resort mode the working directory name is
    /// chosen here but the directory is created only by [`SortPlan::transfer`].
    pub fn prepare(config: RunConfig) -> SortResult<Self> {
        let files = scanner::scan_files(&config.source)?;

        let working_dir = match &config.destination {
            Some(destination) => destination.clone(),
            None => resort_working_dir(&config.source, &config.settings.temp_prefix)?,
        };

        let classifier = Classifier::new(config.settings.fallback_bucket.clone());
        let mut records = classifier.classify_all(&files);
        log::info!(
            "classified {} files into {} buckets",
            records.len(),
            group_by_bucket(&records).len()
        );

        PlacementPlanner::new(&working_dir).place_all(&mut records);
        ensure_buckets_outside_source(&config.source, &records)?;

        Ok(Self {
            config,
            working_dir,
            records,
        })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Directory receiving the copies.
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    /// Number of records per bucket, sorted by bucket key.
    pub fn bucket_counts(&self) -> BTreeMap<String, usize> {
        group_by_bucket(&self.records)
            .into_iter()
            .map(|(key, members)| (key.to_string(), members.len()))
            .collect()
    }

    /// Writes the preview report into the destination, creating it if needed.
    /// The source tree and the buckets are left untouched.
    pub fn write_report(&self) -> SortResult<PathBuf> {
        let structure = scanner::directory_structure(&self.config.source)?;
        create_dir(&self.working_dir)?;

        let report = PreviewReport::new(
            &self.config.source,
            &self.working_dir,
            &self.records,
            structure,
        );
        report.write_to(&self.working_dir, self.config.settings.report_format)
    }

    /// Copies every planned file. The source is not modified.
    pub fn transfer(self, progress: &ProgressBar) -> SortResult<TransferredRun> {
        debug_assert_ne!(self.config.mode, SortMode::Preview);
        create_dir(&self.working_dir)?;

        let mut executor = TransferExecutor::new();
        executor.copy_all(&self.records, progress)?;
        Ok(TransferredRun { plan: self })
    }
}

/// Every file has been copied; nothing has been verified yet.
#[derive(Debug)]
pub struct TransferredRun {
    plan: SortPlan,
}

impl TransferredRun {
    pub fn records(&self) -> &[FileRecord] {
        &self.plan.records
    }

    /// Compares source and destination digests of every file.
    ///
    /// # Errors
    ///
    /// `SortError::ChecksumVerification` if any copy differs from its source.
    pub fn verify(self, progress: &ProgressBar) -> SortResult<VerifiedRun> {
        let summary = verify_records(&self.plan.records, progress)?;
        Ok(VerifiedRun {
            plan: self.plan,
            summary,
        })
    }
}

/// Every copy matched its source.
#[derive(Debug)]
pub struct VerifiedRun {
    plan: SortPlan,
    summary: VerificationSummary,
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub mode: SortMode,
    pub verification: VerificationSummary,
    /// Where the sorted files ended up.
    pub output_dir: PathBuf,
}

impl VerifiedRun {
    pub fn summary(&self) -> VerificationSummary {
        self.summary
    }

    /// Runs the mode's destructive steps: nothing for copy, delete-source for
    /// move, delete-source then rename for resort.
    pub fn finalize(self) -> SortResult<RunSummary> {
        let SortPlan {
            config,
            working_dir,
            ..
        } = self.plan;

        let output_dir = match config.mode {
            SortMode::Preview | SortMode::Copy => working_dir,
            SortMode::Move => {
                delete_source(&config.source, RootPolicy::KeepRoot)
                    .map_err(|e| with_kept_copies(e, &working_dir))?;
                working_dir
            }
            SortMode::Resort => {
                delete_source(&config.source, RootPolicy::RemoveRoot)
                    .map_err(|e| with_kept_copies(e, &working_dir))?;
                finalize_rename(&working_dir, &config.source)?;
                config.source.clone()
            }
        };

        Ok(RunSummary {
            mode: config.mode,
            verification: self.summary,
            output_dir,
        })
    }
}

/// Rejects a plan that would write into the source tree, which happens when
/// the destination holds the source under a bucket name (`/x/100x100` sorted
/// into `/x`). Move mode would otherwise delete the copies with the originals.
fn ensure_buckets_outside_source(source: &Path, records: &[FileRecord]) -> SortResult<()> {
    let buckets: BTreeSet<&Path> = records
        .iter()
        .filter_map(FileRecord::destination_path)
        .filter_map(Path::parent)
        .collect();

    for bucket in buckets {
        if resolve_existing_prefix(bucket).starts_with(source) {
            return Err(SortError::BucketInsideSource {
                source: source.to_path_buf(),
                bucket: bucket.to_path_buf(),
            });
        }
    }
    Ok(())
}

fn with_kept_copies(err: SortError, working_dir: &Path) -> SortError {
    match err {
        SortError::Cleanup { path, source, .. } => SortError::Cleanup {
            path,
            source,
            kept_in: Some(working_dir.to_path_buf()),
        },
        other => other,
    }
}

/// Picks a vacant sibling directory of `source` to stage a resort in.
fn resort_working_dir(source: &Path, prefix: &str) -> SortResult<PathBuf> {
    let (Some(parent), Some(name)) = (source.parent(), source.file_name()) else {
        return Err(SortError::DirectoryCreation {
            path: source.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "cannot resort a folder without a parent folder",
            ),
        });
    };

    let stamp = chrono::Local::now().format("%Y%m%d%H%M%S");
    let base = format!("{}{}-{}", prefix, name.to_string_lossy(), stamp);
    let mut candidate = parent.join(&base);
    let mut n = 1;
    while candidate.exists() {
        candidate = parent.join(format!("{}-{}", base, n));
        n += 1;
    }
    Ok(candidate)
}

fn create_dir(dir: &Path) -> SortResult<()> {
    fs::create_dir_all(dir).map_err(|e| SortError::DirectoryCreation {
        path: dir.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SortSettings;
    use tempfile::TempDir;

    fn source_with_files(root: &Path) -> PathBuf {
        let source = root.join("photos");
        fs::create_dir_all(source.join("sub")).unwrap();
        fs::write(source.join("notes.txt"), "notes").unwrap();
        fs::write(source.join("sub").join("notes.txt"), "other notes").unwrap();
        source
    }

    fn plan(mode: SortMode, source: &Path, destination: Option<&Path>) -> SortPlan {
        let config = RunConfig::new(mode, source, destination, SortSettings::default()).unwrap();
        SortPlan::prepare(config).unwrap()
    }

    #[test]
    fn test_prepare_writes_nothing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = source_with_files(temp_dir.path());
        let destination = temp_dir.path().join("sorted");

        let plan = plan(SortMode::Copy, &source, Some(&destination));
        assert!(!destination.exists());
        assert_eq!(plan.records().len(), 2);
        assert_eq!(plan.bucket_counts()["Not images"], 2);

        let names: Vec<_> = plan.records().iter().map(|r| r.destination_name()).collect();
        assert_eq!(names, vec!["notes.txt", "notes(1).txt"]);
    }

    #[test]
    fn test_resort_working_dir_is_vacant_sibling() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = source_with_files(temp_dir.path());

        let plan = plan(SortMode::Resort, &source, None);
        let working_dir = plan.working_dir();
        assert_eq!(working_dir.parent(), source.canonicalize().unwrap().parent());
        assert!(
            working_dir
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with(".imgsort-photos-")
        );
        assert!(!working_dir.exists());
    }

    #[test]
    fn test_resort_working_dir_skips_taken_names() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = source_with_files(temp_dir.path());

        let first = resort_working_dir(&source, "tmp-").unwrap();
        fs::create_dir(&first).unwrap();
        let second = resort_working_dir(&source, "tmp-").unwrap();
        assert_ne!(first, second);
        assert!(!second.exists());
    }

    #[test]
    fn test_full_copy_run() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = source_with_files(temp_dir.path());
        let destination = temp_dir.path().join("sorted");

        let summary = plan(SortMode::Copy, &source, Some(&destination))
            .transfer(&ProgressBar::hidden())
            .and_then(|run| run.verify(&ProgressBar::hidden()))
            .and_then(VerifiedRun::finalize)
            .unwrap();

        assert_eq!(summary.verification.total, 2);
        assert_eq!(summary.verification.non_images, 2);
        assert_eq!(summary.output_dir, destination);
        assert!(destination.join("Not images").join("notes(1).txt").is_file());
        assert!(source.join("notes.txt").is_file());
    }

    #[test]
    fn test_bucket_named_like_source_is_rejected() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("Not images");
        fs::create_dir(&source).unwrap();
        fs::write(source.join("notes.txt"), "notes").unwrap();

        let config = RunConfig::new(
            SortMode::Move,
            &source,
            Some(temp_dir.path()),
            SortSettings::default(),
        )
        .unwrap();
        let result = SortPlan::prepare(config);
        assert!(matches!(
            result,
            Err(SortError::BucketInsideSource { .. })
        ));
        let entries: Vec<_> = fs::read_dir(&source).unwrap().flatten().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_failed_verification_keeps_source() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = source_with_files(temp_dir.path());
        let destination = temp_dir.path().join("sorted");

        let transferred = plan(SortMode::Move, &source, Some(&destination))
            .transfer(&ProgressBar::hidden())
            .unwrap();
        let copy = transferred.records()[0].destination_path().unwrap().to_path_buf();
        fs::write(&copy, "tampered").unwrap();

        let result = transferred.verify(&ProgressBar::hidden());
        assert!(matches!(
            result,
            Err(SortError::ChecksumVerification { .. })
        ));
        assert!(source.join("notes.txt").is_file());
        assert!(source.join("sub").join("notes.txt").is_file());
    }
}
