//! Image classification by pixel resolution.
//!
//! Each file is probed for its dimensions by reading only the image header.
//! Readable images land in a `WIDTHxHEIGHT` bucket; anything else, whether it
//! is a text file, an unsupported format or a truncated image, lands in the
//! single fallback bucket.
//!
//! # Examples
//!
//! ```no_run
//! use imgsort::classifier::Classifier;
//! use std::path::Path;
//!
//! let classifier = Classifier::new("Not images");
//! let record = classifier.classify(Path::new("/photos/sunset.jpg"));
//! println!("{} -> {}", record.source_path().display(), record.bucket_key());
//! ```

use crate::record::{FileRecord, ImageProbe};
use image::ImageReader;
use std::path::Path;

/// Assigns bucket keys to source files.
#[derive(Debug, Clone)]
pub struct Classifier {
    fallback_bucket: String,
}

impl Classifier {
    /// Creates a classifier routing unreadable files to `fallback_bucket`.
    pub fn new(fallback_bucket: impl Into<String>) -> Self {
        Self {
            fallback_bucket: fallback_bucket.into(),
        }
    }

    /// Name of the fallback bucket.
    pub fn fallback_bucket(&self) -> &str {
        &self.fallback_bucket
    }

    /// Probes a file and builds its record. Never fails: any probe error
    /// becomes [`ImageProbe::Unclassifiable`].
    pub fn classify(&self, path: &Path) -> FileRecord {
        let probe = probe_dimensions(path);
        let mime_type = sniff_mime(path);
        let bucket_key = probe.bucket_key(&self.fallback_bucket);

        log::debug!(
            "classified {} as {} ({})",
            path.display(),
            bucket_key,
            mime_type.as_deref().unwrap_or("unknown type")
        );

        FileRecord::new(path.to_path_buf(), probe, bucket_key, mime_type)
    }

    /// Classifies every path in order.
    pub fn classify_all(&self, paths: &[impl AsRef<Path>]) -> Vec<FileRecord> {
        paths.iter().map(|path| self.classify(path.as_ref())).collect()
    }
}

/// Reads the image header and returns its dimensions.
///
/// The format is guessed from content, not from the file extension, so a
/// PNG named `photo.jpg` is still sized correctly and a text file named
/// `photo.png` is unclassifiable.
pub fn probe_dimensions(path: &Path) -> ImageProbe {
    let dimensions = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(image::ImageError::from)
        .and_then(|reader| reader.into_dimensions());

    match dimensions {
        Ok((width, height)) if width > 0 && height > 0 => ImageProbe::Sized { width, height },
        Ok(_) => ImageProbe::Unclassifiable,
        Err(e) => {
            log::trace!("no dimensions for {}: {}", path.display(), e);
            ImageProbe::Unclassifiable
        }
    }
}

/// Detects the MIME type from the file's magic bytes. Informational only.
fn sniff_mime(path: &Path) -> Option<String> {
    infer::get_from_path(path)
        .ok()
        .flatten()
        .map(|kind| kind.mime_type().to_string())
}
