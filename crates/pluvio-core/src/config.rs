use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{PluvioError, paths::install_root};

/// Mount root scanned for removable volumes when none is configured.
pub const DEFAULT_MOUNT_ROOT: &str = "/media/pi";

/// Free space a removable volume must report before it is used.
pub const DEFAULT_MIN_FREE_MB: u64 = 50;

/// Order in which mount-root entries are considered as candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateOrder {
    /// Lexicographic by entry name, stable across platforms and calls.
    #[default]
    ByName,
    /// Whatever order the directory listing returns.
    Listing,
}

/// How strictly a date string is checked before it becomes a directory path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePolicy {
    /// Three `-` separated segments, each embedded literally.
    #[default]
    Structural,
    /// `YYYY-MM-DD` digits naming a real calendar day.
    Calendar,
}

/// Storage resolution settings, fixed for the lifetime of a resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory whose entries are probed as removable volumes.
    pub mount_root: PathBuf,
    /// Minimum whole megabytes of free space for a volume to be admitted.
    pub min_free_mb: u64,
    /// Unconditional fallback location when no volume is admitted.
    pub backup_path: PathBuf,
    pub candidate_order: CandidateOrder,
    pub date_policy: DatePolicy,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            mount_root: PathBuf::from(DEFAULT_MOUNT_ROOT),
            min_free_mb: DEFAULT_MIN_FREE_MB,
            backup_path: install_root(),
            candidate_order: CandidateOrder::default(),
            date_policy: DatePolicy::default(),
        }
    }
}

impl StorageConfig {
    /// Rejects configurations whose locations are not absolute paths.
    pub fn validate(&self) -> Result<(), PluvioError> {
        if !self.mount_root.is_absolute() {
            return Err(PluvioError::invalid_config(format!(
                "mount root {} must be an absolute path",
                self.mount_root.display()
            )));
        }
        if !self.backup_path.is_absolute() {
            return Err(PluvioError::invalid_config(format!(
                "backup path {} must be an absolute path",
                self.backup_path.display()
            )));
        }
        Ok(())
    }
}
