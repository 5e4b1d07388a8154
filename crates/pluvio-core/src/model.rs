use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::DatePartition;

const BYTES_PER_MB: u64 = 1024 * 1024;
const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// One mount-root entry as observed during a single scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Absolute path of the entry.
    pub path: PathBuf,
    /// Entry is the root of a filesystem distinct from the mount root's.
    pub mounted: bool,
    /// Current process may write into the entry.
    pub writable: bool,
}

impl Candidate {
    /// Returns whether the entry may be handed to the capacity gate.
    pub fn is_usable(&self) -> bool {
        self.mounted && self.writable
    }
}

/// Point-in-time filesystem usage for a single path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityReport {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
}

impl CapacityReport {
    /// Free space in whole megabytes, rounded down.
    pub fn free_mb(&self) -> u64 {
        self.free_bytes / BYTES_PER_MB
    }

    /// Free space in gigabytes, rounded to two decimals.
    pub fn free_gb(&self) -> f64 {
        (self.free_bytes as f64 / BYTES_PER_GB * 100.0).round() / 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseKind {
    Volume,
    Backup,
}

/// Root location chosen for one resolution call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum StorageBase {
    /// An admitted removable volume.
    Volume(PathBuf),
    /// The internal fallback location.
    Backup(PathBuf),
}

impl StorageBase {
    pub fn path(&self) -> &Path {
        match self {
            StorageBase::Volume(path) | StorageBase::Backup(path) => path,
        }
    }

    pub fn kind(&self) -> BaseKind {
        match self {
            StorageBase::Volume(_) => BaseKind::Volume,
            StorageBase::Backup(_) => BaseKind::Backup,
        }
    }
}

/// Outcome of a successful resolution: the base and the provisioned directory under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub base: StorageBase,
    pub partition: DatePartition,
    pub path: PathBuf,
}
