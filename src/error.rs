//! Error types for the sort-and-verify pipeline.
//!
//! Every fatal condition surfaces as a [`SortError`]. The only failure that is
//! not an error is an image probe that cannot read dimensions, which the
//! classifier turns into the fallback bucket.

use crate::cli::SortMode;
use crate::config::ConfigError;
use std::path::PathBuf;

/// Errors that can abort a sorting run.
#[derive(Debug)]
pub enum SortError {
    /// The source directory does not exist or is not a directory.
    SourceNotFound(PathBuf),
    /// A destination directory is required by the selected mode but none was given.
    DestinationMissing { mode: SortMode },
    /// The destination is the source itself or lies somewhere inside it.
    DestinationInsideSource {
        source: PathBuf,
        destination: PathBuf,
    },
    /// A planned bucket folder is the source itself or lies inside it, e.g. a
    /// source named `100x100` sorted into its own parent.
    BucketInsideSource { source: PathBuf, bucket: PathBuf },
    /// The source tree contains no files at all.
    NoFilesFound(PathBuf),
    /// Walking the source tree failed.
    Scan {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to create the destination, a bucket or the working directory.
    DirectoryCreation {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Copying a file into its bucket failed.
    Transfer {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
    /// A planned destination appeared on disk between planning and copying.
    DestinationOccupied(PathBuf),
    /// A file could not be read while computing its digest.
    Checksum {
        path: PathBuf,
        source: std::io::Error,
    },
    /// At least one copy does not match its source.
    ChecksumVerification { mismatches: Vec<PathBuf> },
    /// Removing the source tree failed. `kept_in` names the folder holding
    /// the verified copies when the failure happened during a run.
    Cleanup {
        path: PathBuf,
        source: std::io::Error,
        kept_in: Option<PathBuf>,
    },
    /// Renaming the working directory over the source failed.
    Rename {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
    /// Writing the preview report failed.
    Report {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Loading the configuration failed.
    Config(ConfigError),
}

impl std::fmt::Display for SortError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SourceNotFound(path) => {
                write!(f, "Source folder doesn't exist: {}", path.display())
            }
            Self::DestinationMissing { mode } => {
                write!(f, "Mode '{}' requires a destination folder", mode)
            }
            Self::DestinationInsideSource {
                source,
                destination,
            } => write!(
                f,
                "Destination folder {} must not be the source folder or lie inside it: {}",
                destination.display(),
                source.display()
            ),
            Self::BucketInsideSource { source, bucket } => write!(
                f,
                "Bucket folder {} would be the source folder or lie inside it: {}. \
                 Choose a destination that does not contain a folder named like the source.",
                bucket.display(),
                source.display()
            ),
            Self::NoFilesFound(path) => {
                write!(f, "There are no files to sort in the folder: {}", path.display())
            }
            Self::Scan { path, source } => {
                write!(f, "Failed to scan {}: {}", path.display(), source)
            }
            Self::DirectoryCreation { path, source } => {
                write!(
                    f,
                    "Failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::Transfer { from, to, source } => write!(
                f,
                "Failed to copy {} to {}: {}",
                from.display(),
                to.display(),
                source
            ),
            Self::DestinationOccupied(path) => write!(
                f,
                "Refusing to overwrite {}: the file appeared after planning",
                path.display()
            ),
            Self::Checksum { path, source } => {
                write!(f, "Failed to checksum {}: {}", path.display(), source)
            }
            Self::ChecksumVerification { mismatches } => {
                write!(
                    f,
                    "Checksum verification completed with an error ({} mismatched file{}). \
                     Deleting of the source files canceled.",
                    mismatches.len(),
                    if mismatches.len() == 1 { "" } else { "s" }
                )
            }
            Self::Cleanup {
                path,
                source,
                kept_in,
            } => {
                write!(
                    f,
                    "Failed to delete {}: {}. Close the folder in other applications, \
                     check its permissions and delete it manually.",
                    path.display(),
                    source
                )?;
                match kept_in {
                    Some(dir) => write!(f, " The sorted copies are complete in {}.", dir.display()),
                    None => write!(f, " The sorted copies are complete."),
                }
            }
            Self::Rename { from, to, source } => write!(
                f,
                "Failed to rename {} to {}: {}. The sorted files are kept in {}.",
                from.display(),
                to.display(),
                source,
                from.display()
            ),
            Self::Report { path, source } => {
                write!(f, "Failed to write report {}: {}", path.display(), source)
            }
            Self::Config(err) => write!(f, "Error loading configuration: {}", err),
        }
    }
}

impl std::error::Error for SortError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Scan { source, .. }
            | Self::DirectoryCreation { source, .. }
            | Self::Transfer { source, .. }
            | Self::Checksum { source, .. }
            | Self::Cleanup { source, .. }
            | Self::Rename { source, .. }
            | Self::Report { source, .. } => Some(source),
            Self::Config(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for SortError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

/// Result type for sorting operations.
pub type SortResult<T> = Result<T, SortError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_message_mentions_cancelled_deletion() {
        let err = SortError::ChecksumVerification {
            mismatches: vec![PathBuf::from("/dst/100x100/a.png")],
        };
        let message = err.to_string();
        assert!(message.contains("1 mismatched file)"));
        assert!(message.contains("Deleting of the source files canceled"));
    }

    #[test]
    fn test_cleanup_message_is_actionable() {
        let err = SortError::Cleanup {
            path: PathBuf::from("/src/locked.png"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            kept_in: None,
        };
        assert!(err.to_string().contains("Close the folder in other applications"));
    }

    #[test]
    fn test_cleanup_message_names_sorted_copies() {
        let err = SortError::Cleanup {
            path: PathBuf::from("/photos/src"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            kept_in: Some(PathBuf::from("/photos/.imgsort-src-20260101120000")),
        };
        assert!(
            err.to_string()
                .ends_with("The sorted copies are complete in /photos/.imgsort-src-20260101120000.")
        );
    }

    #[test]
    fn test_bucket_inside_source_message() {
        let err = SortError::BucketInsideSource {
            source: PathBuf::from("/photos/100x100"),
            bucket: PathBuf::from("/photos/100x100"),
        };
        assert!(err.to_string().starts_with("Bucket folder /photos/100x100"));
    }
}
