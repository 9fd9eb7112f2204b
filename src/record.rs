//! The per-file aggregate that flows through the pipeline.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Result of probing a file for pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageProbe {
    /// The file is a readable image of the given size.
    Sized { width: u32, height: u32 },
    /// Dimensions could not be read: not an image, unsupported or corrupt.
    Unclassifiable,
}

impl ImageProbe {
    /// Returns `true` if dimensions were read.
    pub fn is_image(&self) -> bool {
        matches!(self, ImageProbe::Sized { .. })
    }

    /// Folder name for this outcome, `fallback` when unclassifiable.
    pub fn bucket_key(&self, fallback: &str) -> String {
        match self {
            ImageProbe::Sized { width, height } => format!("{}x{}", width, height),
            ImageProbe::Unclassifiable => fallback.to_string(),
        }
    }
}

/// One source file: where it is, where it goes and what it was classified as.
#[derive(Debug, Clone)]
pub struct FileRecord {
    source_path: PathBuf,
    probe: ImageProbe,
    bucket_key: String,
    mime_type: Option<String>,
    destination_path: Option<PathBuf>,
}

impl FileRecord {
    /// Creates a classified, not yet placed record.
    pub fn new(
        source_path: PathBuf,
        probe: ImageProbe,
        bucket_key: String,
        mime_type: Option<String>,
    ) -> Self {
        Self {
            source_path,
            probe,
            bucket_key,
            mime_type,
            destination_path: None,
        }
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn probe(&self) -> ImageProbe {
        self.probe
    }

    pub fn bucket_key(&self) -> &str {
        &self.bucket_key
    }

    /// MIME type sniffed from the file header, if recognised.
    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    /// Planned destination, `None` while unresolved.
    pub fn destination_path(&self) -> Option<&Path> {
        self.destination_path.as_deref()
    }

    /// Base name of the planned destination, or of the source while unresolved.
    pub fn destination_name(&self) -> String {
        self.destination_path
            .as_deref()
            .unwrap_or(&self.source_path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Records the planned destination. Placement happens exactly once.
    pub(crate) fn assign_destination(&mut self, destination: PathBuf) {
        debug_assert!(
            self.destination_path.is_none(),
            "{} was placed twice",
            self.source_path.display()
        );
        self.destination_path = Some(destination);
    }
}

/// Groups records by bucket key, keys in sorted order.
pub fn group_by_bucket(records: &[FileRecord]) -> BTreeMap<&str, Vec<&FileRecord>> {
    let mut buckets: BTreeMap<&str, Vec<&FileRecord>> = BTreeMap::new();
    for record in records {
        buckets.entry(record.bucket_key()).or_default().push(record);
    }
    buckets
}
