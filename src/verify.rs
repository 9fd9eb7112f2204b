//! Post-transfer integrity verification.
//!
//! Every transferred record is hashed at both ends. The run is verified only
//! if every pair matches; a single mismatch fails the whole run.

use crate::checksum::file_digest;
use crate::error::{SortError, SortResult};
use crate::record::FileRecord;
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};

/// Source and destination digests of one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumPair {
    pub source: String,
    pub destination: String,
}

impl ChecksumPair {
    /// Hashes both ends of a copy.
    pub fn compute(source: &Path, destination: &Path) -> SortResult<Self> {
        Ok(Self {
            source: file_digest(source)?,
            destination: file_digest(destination)?,
        })
    }

    pub fn matches(&self) -> bool {
        self.source == self.destination
    }
}

/// Aggregate counts of a verified run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VerificationSummary {
    pub total: usize,
    pub images: usize,
    pub non_images: usize,
}

impl VerificationSummary {
    /// Counts records by classification.
    pub fn of(records: &[FileRecord]) -> Self {
        let images = records.iter().filter(|r| r.probe().is_image()).count();
        Self {
            total: records.len(),
            images,
            non_images: records.len() - images,
        }
    }
}

/// Verifies every record against its copy.
///
/// # Errors
///
/// Returns `SortError::ChecksumVerification` listing every mismatched copy,
/// or `SortError::Checksum` if either end cannot be read.
pub fn verify_records(
    records: &[FileRecord],
    progress: &ProgressBar,
) -> SortResult<VerificationSummary> {
    let mut mismatches: Vec<PathBuf> = Vec::new();

    for record in records {
        let destination = record.destination_path().ok_or_else(|| SortError::Checksum {
            path: record.source_path().to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "file was never placed in the destination",
            ),
        })?;

        progress.set_message(record.destination_name());
        let pair = ChecksumPair::compute(record.source_path(), destination)?;
        if !pair.matches() {
            log::error!(
                "checksum mismatch: {} ({}) vs {} ({})",
                record.source_path().display(),
                pair.source,
                destination.display(),
                pair.destination
            );
            mismatches.push(destination.to_path_buf());
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    if !mismatches.is_empty() {
        return Err(SortError::ChecksumVerification { mismatches });
    }

    let summary = VerificationSummary::of(records);
    log::info!("{} files verified", summary.total);
    Ok(summary)
}
