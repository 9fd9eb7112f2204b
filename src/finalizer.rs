/// Destructive end of a run: deleting the source and swapping directories.
///
/// Nothing here checks checksums itself. These functions are reached only
/// through [`crate::pipeline::VerifiedRun`], which exists only after every copy
/// matched its source.
use crate::error::{SortError, SortResult};
use std::fs;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

/// Whether the source root directory survives deletion of its contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootPolicy {
    /// Remove everything below the root, leave the root itself (move mode).
    KeepRoot,
    /// Remove the root as well, vacating its path (resort mode).
    RemoveRoot,
}

/// Recursively deletes the source tree, clearing read-only flags first.
///
/// # Errors
///
/// Returns `SortError::Cleanup` on the first entry that cannot be made
/// writable or removed. Files already removed stay removed; the destination is
/// never touched.
pub fn delete_source(root: &Path, policy: RootPolicy) -> SortResult<()> {
    let min_depth = match policy {
        RootPolicy::KeepRoot => 1,
        RootPolicy::RemoveRoot => 0,
    };

    // Directories must be writable before their children can be unlinked.
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| cleanup_error(root, e))?;
        if !entry.path_is_symlink() {
            make_writable(entry.path())?;
        }
    }

    for entry in WalkDir::new(root).min_depth(min_depth).contents_first(true) {
        let entry = entry.map_err(|e| cleanup_error(root, e))?;
        let path = entry.path();
        let removed = if entry.file_type().is_dir() {
            fs::remove_dir(path)
        } else {
            fs::remove_file(path)
        };
        removed.map_err(|e| SortError::Cleanup {
            path: path.to_path_buf(),
            source: e,
            kept_in: None,
        })?;
    }

    log::info!("deleted source tree {}", root.display());
    Ok(())
}

/// Renames the working directory onto the now vacant source path.
pub fn finalize_rename(working_dir: &Path, original: &Path) -> SortResult<()> {
    if original.exists() {
        return Err(SortError::Rename {
            from: working_dir.to_path_buf(),
            to: original.to_path_buf(),
            source: io::Error::new(io::ErrorKind::AlreadyExists, "original path is still occupied"),
        });
    }

    fs::rename(working_dir, original).map_err(|e| SortError::Rename {
        from: working_dir.to_path_buf(),
        to: original.to_path_buf(),
        source: e,
    })?;
    log::info!("renamed {} to {}", working_dir.display(), original.display());
    Ok(())
}

/// Clears the read-only attribute of a file or directory.
fn make_writable(path: &Path) -> SortResult<()> {
    let failed = |e| SortError::Cleanup {
        path: path.to_path_buf(),
        source: e,
        kept_in: None,
    };

    let mut permissions = fs::metadata(path).map_err(failed)?.permissions();
    if !permissions.readonly() {
        return Ok(());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        permissions.set_mode(permissions.mode() | 0o200);
    }
    #[cfg(not(unix))]
    #[allow(clippy::permissions_set_readonly_false)]
    permissions.set_readonly(false);

    fs::set_permissions(path, permissions).map_err(failed)
}

fn cleanup_error(root: &Path, err: walkdir::Error) -> SortError {
    let path = err.path().unwrap_or(root).to_path_buf();
    let source = err
        .into_io_error()
        .unwrap_or_else(|| io::Error::other("filesystem loop detected"));
    SortError::Cleanup {
        path,
        source,
        kept_in: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn populate(root: &Path) {
        fs::create_dir_all(root.join("nested").join("deeper")).unwrap();
        fs::write(root.join("a.png"), "a").unwrap();
        fs::write(root.join("nested").join("b.txt"), "b").unwrap();
        fs::write(root.join("nested").join("deeper").join("c.txt"), "c").unwrap();
    }

    fn set_readonly(path: &Path) {
        let mut permissions = fs::metadata(path).unwrap().permissions();
        permissions.set_readonly(true);
        fs::set_permissions(path, permissions).unwrap();
    }

    #[test]
    fn test_delete_keeps_root() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().join("source");
        populate(&root);

        delete_source(&root, RootPolicy::KeepRoot).unwrap();
        assert!(root.is_dir());
        assert_eq!(fs::read_dir(&root).unwrap().count(), 0);
    }

    #[test]
    fn test_delete_removes_root() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().join("source");
        populate(&root);

        delete_source(&root, RootPolicy::RemoveRoot).unwrap();
        assert!(!root.exists());
    }

    #[test]
    fn test_delete_read_only_entries() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().join("source");
        populate(&root);
        set_readonly(&root.join("a.png"));
        set_readonly(&root.join("nested").join("deeper").join("c.txt"));
        set_readonly(&root.join("nested").join("deeper"));

        delete_source(&root, RootPolicy::RemoveRoot).unwrap();
        assert!(!root.exists());
    }

    #[test]
    fn test_finalize_rename() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let working = temp_dir.path().join(".imgsort-photos");
        let original = temp_dir.path().join("photos");
        fs::create_dir_all(working.join("10x10")).unwrap();
        fs::write(working.join("10x10").join("a.png"), "a").unwrap();

        finalize_rename(&working, &original).unwrap();
        assert!(!working.exists());
        assert!(original.join("10x10").join("a.png").is_file());
    }

    #[test]
    fn test_finalize_rename_refuses_occupied_path() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let working = temp_dir.path().join("work");
        let original = temp_dir.path().join("photos");
        fs::create_dir_all(&working).unwrap();
        fs::create_dir_all(&original).unwrap();

        let result = finalize_rename(&working, &original);
        assert!(matches!(result, Err(SortError::Rename { .. })));
        assert!(working.exists());
    }
}
