/// Copying planned records into the working directory.
///
/// This module performs the only writes of the transfer phase. Bucket
/// directories are created on demand, once each, and every copy is opened with
/// `create_new` so an existing file is never overwritten even if it appeared
/// after planning. The source is only read.
use crate::error::{SortError, SortResult};
use crate::record::FileRecord;
use indicatif::ProgressBar;
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Copies records to their planned destinations.
#[derive(Debug, Default)]
pub struct TransferExecutor {
    created_dirs: HashSet<PathBuf>,
    transferred: usize,
}

impl TransferExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of files copied so far.
    pub fn transferred(&self) -> usize {
        self.transferred
    }

    /// Copies one record to its planned destination.
    ///
    /// # Errors
    ///
    /// * `SortError::DirectoryCreation` if the bucket directory cannot be created
    /// * `SortError::DestinationOccupied` if the destination already exists
    /// * `SortError::Transfer` if the record is unplanned or the copy fails
    pub fn copy_record(&mut self, record: &FileRecord) -> SortResult<()> {
        let destination = record
            .destination_path()
            .ok_or_else(|| SortError::Transfer {
                from: record.source_path().to_path_buf(),
                to: PathBuf::from("unresolved"),
                source: io::Error::new(io::ErrorKind::InvalidInput, "destination was not planned"),
            })?;

        if let Some(bucket_dir) = destination.parent() {
            self.ensure_dir(bucket_dir)?;
        }

        copy_new(record.source_path(), destination)?;
        self.transferred += 1;
        log::debug!(
            "copied {} -> {}",
            record.source_path().display(),
            destination.display()
        );
        Ok(())
    }

    /// Copies every record in order, advancing `progress` per file.
    pub fn copy_all(&mut self, records: &[FileRecord], progress: &ProgressBar) -> SortResult<()> {
        for record in records {
            progress.set_message(record.destination_name());
            self.copy_record(record)?;
            progress.inc(1);
        }
        progress.finish_and_clear();
        log::info!("copied {} files", self.transferred);
        Ok(())
    }

    fn ensure_dir(&mut self, dir: &Path) -> SortResult<()> {
        if self.created_dirs.contains(dir) {
            return Ok(());
        }
        fs::create_dir_all(dir).map_err(|e| SortError::DirectoryCreation {
            path: dir.to_path_buf(),
            source: e,
        })?;
        self.created_dirs.insert(dir.to_path_buf());
        Ok(())
    }
}

/// Copies `from` to a file that must not exist yet.
fn copy_new(from: &Path, to: &Path) -> SortResult<()> {
    let transfer_error = |e: io::Error| SortError::Transfer {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source: e,
    };

    let mut reader = File::open(from).map_err(transfer_error)?;
    let mut writer = match OpenOptions::new().write(true).create_new(true).open(to) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            return Err(SortError::DestinationOccupied(to.to_path_buf()));
        }
        Err(e) => return Err(transfer_error(e)),
    };

    io::copy(&mut reader, &mut writer).map_err(transfer_error)?;
    writer.sync_all().map_err(transfer_error)?;
    Ok(())
}
