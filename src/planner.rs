//! Collision-safe placement of classified files.
//!
//! Every record is placed at `{working_dir}/{bucket_key}/{base name}`. When
//! that name is taken, either on disk or by an earlier record of the same run,
//! the candidates `stem(1).ext`, `stem(2).ext`, ... are tried in order and the
//! first free one wins. The result depends only on the destination contents and
//! the order of earlier claims, so planning twice against the same state gives
//! the same names.
//!
//! Claims are compared without regard to case, so `IMG.JPG` and `img.jpg` never
//! share a destination on case-insensitive filesystems.

use crate::record::FileRecord;
use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Assigns destinations inside one working directory.
#[derive(Debug)]
pub struct PlacementPlanner {
    working_dir: PathBuf,
    claimed: HashSet<String>,
}

impl PlacementPlanner {
    /// Creates a planner for `working_dir` with no claims yet.
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            claimed: HashSet::new(),
        }
    }

    /// Plans a single record and returns its destination.
    pub fn place(&mut self, record: &mut FileRecord) -> PathBuf {
        let bucket_dir = self.working_dir.join(record.bucket_key());
        let file_name = record
            .source_path()
            .file_name()
            .unwrap_or_else(|| OsStr::new("unnamed"))
            .to_os_string();

        let claimed = &self.claimed;
        let destination = disambiguate(&bucket_dir, &file_name, |candidate| {
            claimed.contains(&claim_key(candidate)) || candidate.exists()
        });

        if destination.file_name() != Some(file_name.as_os_str()) {
            log::debug!(
                "{} renamed to {} to avoid a collision",
                record.source_path().display(),
                destination.display()
            );
        }

        self.claimed.insert(claim_key(&destination));
        record.assign_destination(destination.clone());
        destination
    }

    /// Plans every record in order.
    pub fn place_all(&mut self, records: &mut [FileRecord]) {
        for record in records.iter_mut() {
            self.place(record);
        }
    }
}

fn claim_key(path: &Path) -> String {
    path.to_string_lossy().to_lowercase()
}

/// Returns the first free path for `file_name` inside `dir`.
///
/// The plain name is tried first, then `stem(1).ext`, `stem(2).ext` and so on
/// until `is_taken` reports a free candidate.
pub fn disambiguate(
    dir: &Path,
    file_name: &OsStr,
    mut is_taken: impl FnMut(&Path) -> bool,
) -> PathBuf {
    let plain = dir.join(file_name);
    if !is_taken(&plain) {
        return plain;
    }

    let mut n = 1;
    loop {
        let candidate = dir.join(numbered_name(file_name, n));
        if !is_taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Inserts `(n)` between the stem and the extension: `a.png` -> `a(1).png`,
/// `README` -> `README(1)`, `.bashrc` -> `.bashrc(1)`.
pub fn numbered_name(file_name: &OsStr, n: u64) -> OsString {
    let path = Path::new(file_name);
    let stem = path.file_stem().unwrap_or(file_name);

    let mut name = stem.to_os_string();
    name.push(format!("({})", n));
    if let Some(extension) = path.extension() {
        name.push(".");
        name.push(extension);
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ImageProbe;
    use std::fs;
    use tempfile::TempDir;

    fn record(source: &str, bucket: &str) -> FileRecord {
        FileRecord::new(
            PathBuf::from(source),
            ImageProbe::Sized {
                width: 100,
                height: 100,
            },
            bucket.to_string(),
            None,
        )
    }

    #[test]
    fn test_numbered_name() {
        assert_eq!(numbered_name(OsStr::new("a.png"), 1), "a(1).png");
        assert_eq!(numbered_name(OsStr::new("archive.tar.gz"), 3), "archive.tar(3).gz");
        assert_eq!(numbered_name(OsStr::new("README"), 2), "README(2)");
        assert_eq!(numbered_name(OsStr::new(".bashrc"), 1), ".bashrc(1)");
    }

    #[test]
    fn test_plain_name_when_free() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut planner = PlacementPlanner::new(temp_dir.path());
        let mut rec = record("/src/a.png", "100x100");

        let destination = planner.place(&mut rec);
        assert_eq!(destination, temp_dir.path().join("100x100").join("a.png"));
        assert_eq!(rec.destination_path(), Some(destination.as_path()));
    }

    #[test]
    fn test_existing_file_is_never_reused() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let bucket = temp_dir.path().join("100x100");
        fs::create_dir(&bucket).unwrap();
        fs::write(bucket.join("a.png"), "existing").unwrap();
        fs::write(bucket.join("a(1).png"), "existing too").unwrap();

        let mut planner = PlacementPlanner::new(temp_dir.path());
        let mut rec = record("/src/a.png", "100x100");
        assert_eq!(planner.place(&mut rec), bucket.join("a(2).png"));
    }

    #[test]
    fn test_same_name_from_different_folders() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut planner = PlacementPlanner::new(temp_dir.path());
        let mut records = vec![
            record("/src/a.png", "100x100"),
            record("/src/trip/a.png", "100x100"),
            record("/src/other/a.png", "100x100"),
            record("/src/text/a.png", "Not images"),
        ];

        planner.place_all(&mut records);
        let names: Vec<_> = records.iter().map(|r| r.destination_name()).collect();
        assert_eq!(names, vec!["a.png", "a(1).png", "a(2).png", "a.png"]);
    }

    #[test]
    fn test_names_differing_only_in_case() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut planner = PlacementPlanner::new(temp_dir.path());
        let mut records = vec![
            record("/src/IMG.JPG", "100x100"),
            record("/src/trip/img.jpg", "100x100"),
            record("/src/other/Img.Jpg", "100x100"),
        ];

        planner.place_all(&mut records);
        let names: Vec<_> = records.iter().map(|r| r.destination_name()).collect();
        assert_eq!(names, vec!["IMG.JPG", "img(1).jpg", "Img(2).Jpg"]);
    }

    #[test]
    fn test_planning_is_repeatable() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let bucket = temp_dir.path().join("100x100");
        fs::create_dir(&bucket).unwrap();
        fs::write(bucket.join("a.png"), "existing").unwrap();

        let plan = || {
            let mut planner = PlacementPlanner::new(temp_dir.path());
            let mut records = vec![record("/src/a.png", "100x100"), record("/src/b/a.png", "100x100")];
            planner.place_all(&mut records);
            records
                .iter()
                .map(|r| r.destination_path().unwrap().to_path_buf())
                .collect::<Vec<_>>()
        };

        let first = plan();
        assert_eq!(first, plan());
        assert_eq!(first, vec![bucket.join("a(1).png"), bucket.join("a(2).png")]);
    }

    #[test]
    fn test_disambiguate_tries_in_ascending_order() {
        let dir = Path::new("/dst/Not images");
        let mut tried = Vec::new();
        let chosen = disambiguate(dir, OsStr::new("c.txt"), |candidate| {
            tried.push(candidate.to_path_buf());
            tried.len() < 4
        });

        assert_eq!(chosen, dir.join("c(3).txt"));
        assert_eq!(
            tried,
            vec![
                dir.join("c.txt"),
                dir.join("c(1).txt"),
                dir.join("c(2).txt"),
                dir.join("c(3).txt"),
            ]
        );
    }
}
