//! Inventory of the source tree.
//!
//! Walks a directory recursively and reports every file under it. Directories
//! with no files anywhere below them contribute nothing, both to the file list
//! and to the structure map used by the preview report.

use crate::error::{SortError, SortResult};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Directory (relative to the scanned root, `.` for the root itself) mapped to
/// the sorted names of the files it directly contains.
pub type DirectoryStructure = BTreeMap<String, Vec<String>>;

/// Returns every file under `root`, sorted by path.
///
/// Symbolic links that point at files are treated as files; links to
/// directories are not followed.
///
/// # Errors
///
/// Returns `SortError::NoFilesFound` when the tree has no files at all and
/// `SortError::Scan` when a directory cannot be read.
pub fn scan_files(root: &Path) -> SortResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in walk(root) {
        let entry = entry?;
        if is_file(&entry) {
            files.push(entry.into_path());
        }
    }

    if files.is_empty() {
        return Err(SortError::NoFilesFound(root.to_path_buf()));
    }

    log::info!("found {} files under {}", files.len(), root.display());
    Ok(files)
}

/// Builds the directory -> file names map of `root`, omitting directories
/// without files.
pub fn directory_structure(root: &Path) -> SortResult<DirectoryStructure> {
    let mut structure = DirectoryStructure::new();
    for entry in walk(root) {
        let entry = entry?;
        if !is_file(&entry) {
            continue;
        }
        let parent = entry.path().parent().unwrap_or(root);
        let relative = match parent.strip_prefix(root) {
            Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
            Ok(rel) => rel.to_string_lossy().into_owned(),
            Err(_) => parent.to_string_lossy().into_owned(),
        };
        structure
            .entry(relative)
            .or_default()
            .push(entry.file_name().to_string_lossy().into_owned());
    }

    for names in structure.values_mut() {
        names.sort();
    }
    Ok(structure)
}

/// Lists the immediate subdirectories of `root`, sorted by name.
pub fn subdirectories(root: &Path) -> SortResult<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| walk_error(root, e))?;
        if entry.file_type().is_dir() {
            dirs.push(entry.into_path());
        }
    }
    Ok(dirs)
}

fn walk(root: &Path) -> impl Iterator<Item = SortResult<DirEntry>> + '_ {
    WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .map(move |entry| entry.map_err(|e| walk_error(root, e)))
}

fn is_file(entry: &DirEntry) -> bool {
    let file_type = entry.file_type();
    file_type.is_file() || (file_type.is_symlink() && entry.path().is_file())
}

fn walk_error(root: &Path, err: walkdir::Error) -> SortError {
    let path = err.path().unwrap_or(root).to_path_buf();
    let source = err
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::other("filesystem loop detected"));
    SortError::Scan { path, source }
}
