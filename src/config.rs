//! Sorting settings and run configuration.
//!
//! Settings are loaded from TOML configuration files. Lookup order:
//! an explicit `--config` path, `.imgsortrc.toml` in the current directory,
//! `~/.config/imgsort/config.toml`, then built-in defaults.
//!
//! # Configuration File Format
//!
//! ```toml
//! [sort]
//! fallback_bucket = "Not images"
//! report_format = "html"
//! temp_prefix = ".imgsort-"
//! progress = true
//! ```
//!
//! [`RunConfig`] combines those settings with the validated mode and paths. It
//! is built once at startup and handed to every pipeline stage.

use crate::cli::SortMode;
use crate::error::{SortError, SortResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Errors that can occur while loading settings.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// The fallback bucket name cannot be used as a folder name.
    InvalidBucketName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },
    /// IO error while reading configuration.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::InvalidBucketName { name, reason } => {
                write!(f, "Invalid fallback bucket name '{}': {}", name, reason)
            }
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Output format of the preview report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Html,
    Text,
    Json,
}

impl ReportFormat {
    /// File extension used for the report file.
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Html => "html",
            ReportFormat::Text => "txt",
            ReportFormat::Json => "json",
        }
    }
}

/// Top-level layout of the configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SortConfig {
    #[serde(default)]
    pub sort: SortSettings,
}

/// Tunable sorting behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortSettings {
    /// Bucket that receives every file whose dimensions cannot be read.
    #[serde(default = "default_fallback_bucket")]
    pub fallback_bucket: String,

    /// Format of the preview report.
    #[serde(default)]
    pub report_format: ReportFormat,

    /// Prefix of the temporary working directory used by resort mode.
    #[serde(default = "default_temp_prefix")]
    pub temp_prefix: String,

    /// Whether to draw progress bars during transfer and verification.
    #[serde(default = "default_progress")]
    pub progress: bool,
}

/// Name of the bucket for files that are not readable images.
pub const DEFAULT_FALLBACK_BUCKET: &str = "Not images";

fn default_fallback_bucket() -> String {
    DEFAULT_FALLBACK_BUCKET.to_string()
}

fn default_temp_prefix() -> String {
    ".imgsort-".to_string()
}

fn default_progress() -> bool {
    true
}

impl Default for SortSettings {
    fn default() -> Self {
        Self {
            fallback_bucket: default_fallback_bucket(),
            report_format: ReportFormat::default(),
            temp_prefix: default_temp_prefix(),
            progress: default_progress(),
        }
    }
}

impl SortConfig {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but cannot be read,
    /// if any file found is not valid TOML, or if the settings fail validation.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = Self::locate(config_path)?;
        config.validate()?;
        Ok(config)
    }

    fn locate(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(".imgsortrc.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("imgsort")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if file does not exist.
    /// Returns `ConfigError::ConfigInvalid` if TOML parsing fails.
    /// Returns `ConfigError::IoError` if file cannot be read.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Checks that the fallback bucket is a usable single folder name that
    /// cannot be confused with a resolution bucket.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let name = &self.sort.fallback_bucket;
        let reject = |reason: &str| {
            Err(ConfigError::InvalidBucketName {
                name: name.clone(),
                reason: reason.to_string(),
            })
        };

        if name.trim().is_empty() {
            return reject("name is empty");
        }
        if name == "." || name == ".." || name.contains(['/', '\\']) {
            return reject("name must be a single folder name");
        }
        let resolution = Regex::new(r"^\d+x\d+$").expect("static regex is valid");
        if resolution.is_match(name) {
            return reject("name collides with resolution folders");
        }
        if self.sort.temp_prefix.contains(['/', '\\']) {
            return Err(ConfigError::ConfigInvalid(format!(
                "temp_prefix '{}' must not contain path separators",
                self.sort.temp_prefix
            )));
        }
        Ok(())
    }
}

/// Everything a run needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Selected operating mode.
    pub mode: SortMode,
    /// Absolute path of the source directory.
    pub source: PathBuf,
    /// Absolute destination for preview/copy/move; `None` for resort.
    pub destination: Option<PathBuf>,
    /// Settings loaded from the configuration file.
    pub settings: SortSettings,
}

impl RunConfig {
    /// Validates the inputs and builds the run configuration.
    ///
    /// Paths are made absolute against the current directory here and only
    /// here. The source must be an existing directory. Preview, copy and move
    /// need a destination that is neither the source nor inside it; resort
    /// ignores any destination.
    pub fn new(
        mode: SortMode,
        source: &Path,
        destination: Option<&Path>,
        settings: SortSettings,
    ) -> SortResult<Self> {
        let source = absolute(source)?;
        if !source.is_dir() {
            return Err(SortError::SourceNotFound(source));
        }
        let source = source
            .canonicalize()
            .map_err(|_| SortError::SourceNotFound(source.clone()))?;

        let destination = match (mode, destination) {
            (SortMode::Resort, Some(ignored)) => {
                log::warn!(
                    "resort mode works in place, ignoring destination {}",
                    ignored.display()
                );
                None
            }
            (SortMode::Resort, None) => None,
            (mode, None) => return Err(SortError::DestinationMissing { mode }),
            (_, Some(path)) => {
                let destination = resolve_existing_prefix(&absolute(path)?);
                if destination.starts_with(&source) {
                    return Err(SortError::DestinationInsideSource {
                        source,
                        destination,
                    });
                }
                Some(destination)
            }
        };

        Ok(Self {
            mode,
            source,
            destination,
            settings,
        })
    }
}

fn absolute(path: &Path) -> SortResult<PathBuf> {
    std::path::absolute(path).map_err(|e| SortError::Scan {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Canonicalizes the longest existing ancestor of `path` and re-appends the
/// rest, so a destination that does not exist yet still compares correctly
/// against the canonical source.
pub(crate) fn resolve_existing_prefix(path: &Path) -> PathBuf {
    let mut missing = Vec::new();
    let mut current = path.to_path_buf();
    loop {
        if let Ok(canonical) = current.canonicalize() {
            let mut resolved = canonical;
            for part in missing.iter().rev() {
                resolved.push(part);
            }
            return resolved;
        }
        match (current.file_name(), current.parent()) {
            (Some(name), Some(parent)) => {
                missing.push(name.to_os_string());
                current = parent.to_path_buf();
            }
            _ => return lexically_normalize(path),
        }
    }
}

fn lexically_normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}
