//! imgsort - sort images into folders named after their resolution
//!
//! This library scans a folder, probes every file for its pixel dimensions,
//! plans collision-free destinations, copies the files, verifies every copy by
//! SHA-256 and only then deletes or replaces the original folder.

pub mod checksum;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod finalizer;
pub mod output;
pub mod pipeline;
pub mod planner;
pub mod record;
pub mod report;
pub mod scanner;
pub mod transfer;
pub mod verify;

pub use classifier::Classifier;
pub use config::{ConfigError, ReportFormat, RunConfig, SortConfig, SortSettings};
pub use error::{SortError, SortResult};
pub use pipeline::{RunSummary, SortPlan, TransferredRun, VerifiedRun};
pub use planner::PlacementPlanner;
pub use record::{FileRecord, ImageProbe};

pub use cli::{RunOutcome, SortMode, run_cli, run_cli_with_config};
