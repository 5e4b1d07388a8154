use std::path::{Path, PathBuf};

use pluvio_core::CapacityReport;
use thiserror::Error;

/// Platform abstraction for the filesystem probes used during storage resolution.
pub trait VolumeOps: Send + Sync {
    /// Lists the full paths of every entry directly under `root`.
    fn list_entries(&self, root: &Path) -> Result<Vec<PathBuf>, PlatformError>;

    /// Reports whether `path` is the root of a mounted filesystem.
    fn is_mount_point(&self, path: &Path) -> Result<bool, PlatformError>;

    /// Reports whether the current process may write into `path`.
    fn is_writable(&self, path: &Path) -> bool;

    /// Samples total/used/free bytes for the filesystem holding `path`.
    fn capacity(&self, path: &Path) -> Result<CapacityReport, PlatformError>;

    /// Creates `path` and any missing parents; existing directories are not an error.
    fn create_dir_all(&self, path: &Path) -> Result<(), PlatformError>;
}

/// Errors emitted by platform backends.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Underlying I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Caller supplied invalid input.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// No backend exists for this target.
    #[error("unsupported operation: {0}")]
    Unsupported(String),
}
