use std::{
    path::PathBuf,
    sync::{Mutex, PoisonError},
};

use tracing::{debug, error, info, warn};

use crate::ResolvePhase;

/// Severity attached to every storage event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
}

/// Observable decisions taken while resolving a storage location.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageEvent {
    /// Resolution moved to a new phase.
    Phase { phase: ResolvePhase },
    /// Mount root could not be listed; no removable volumes are considered.
    MountRootUnavailable { mount_root: PathBuf, reason: String },
    /// One mount-root entry was probed.
    CandidateInspected {
        path: PathBuf,
        mounted: bool,
        writable: bool,
    },
    /// Mount probe failed; the entry is treated as not mounted.
    MountProbeFailed { path: PathBuf, reason: String },
    /// Free space was sampled for a candidate.
    CapacityChecked {
        path: PathBuf,
        free_mb: u64,
        min_free_mb: u64,
    },
    /// Candidate reported less free space than required.
    InsufficientSpace {
        path: PathBuf,
        free_mb: u64,
        min_free_mb: u64,
    },
    /// Free space could not be sampled; the candidate is not admitted.
    CapacityQueryFailed { path: PathBuf, reason: String },
    /// A removable volume was chosen as the storage base.
    VolumeSelected {
        path: PathBuf,
        free_mb: u64,
        free_gb: f64,
    },
    /// No volume was admitted; the internal backup location is used.
    FallbackToBackup { backup_path: PathBuf },
    /// The dated directory exists and is ready for writes.
    PathProvisioned { path: PathBuf },
    /// The dated directory could not be created.
    ProvisionFailed { path: PathBuf, reason: String },
}

impl StorageEvent {
    pub fn severity(&self) -> Severity {
        match self {
            StorageEvent::Phase { .. }
            | StorageEvent::CandidateInspected { .. }
            | StorageEvent::MountProbeFailed { .. }
            | StorageEvent::CapacityChecked { .. } => Severity::Debug,
            StorageEvent::VolumeSelected { .. } | StorageEvent::PathProvisioned { .. } => {
                Severity::Info
            }
            StorageEvent::MountRootUnavailable { .. }
            | StorageEvent::InsufficientSpace { .. }
            | StorageEvent::FallbackToBackup { .. } => Severity::Warning,
            StorageEvent::CapacityQueryFailed { .. } | StorageEvent::ProvisionFailed { .. } => {
                Severity::Error
            }
        }
    }
}

/// Receives storage events; implementations decide where they go.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: StorageEvent);
}

/// Forwards events to `tracing` with structured fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: StorageEvent) {
        match event {
            StorageEvent::Phase { phase } => {
                debug!(phase = phase.as_str(), "resolution phase");
            }
            StorageEvent::MountRootUnavailable { mount_root, reason } => {
                warn!(mount_root = %mount_root.display(), reason = %reason, "cannot scan mount root");
            }
            StorageEvent::CandidateInspected {
                path,
                mounted,
                writable,
            } => {
                debug!(path = %path.display(), mounted, writable, "inspected volume candidate");
            }
            StorageEvent::MountProbeFailed { path, reason } => {
                debug!(path = %path.display(), reason = %reason, "mount probe failed");
            }
            StorageEvent::CapacityChecked {
                path,
                free_mb,
                min_free_mb,
            } => {
                debug!(path = %path.display(), free_mb, min_free_mb, "checked free space");
            }
            StorageEvent::InsufficientSpace {
                path,
                free_mb,
                min_free_mb,
            } => {
                warn!(path = %path.display(), free_mb, min_free_mb, "insufficient space on volume");
            }
            StorageEvent::CapacityQueryFailed { path, reason } => {
                error!(path = %path.display(), reason = %reason, "cannot query free space");
            }
            StorageEvent::VolumeSelected {
                path,
                free_mb,
                free_gb,
            } => {
                let free_gb = format_gb(free_gb);
                info!(
                    path = %path.display(),
                    free_mb,
                    free_gb = %free_gb,
                    "using removable storage"
                );
            }
            StorageEvent::FallbackToBackup { backup_path } => {
                warn!(
                    backup_path = %backup_path.display(),
                    "no mounted volume with enough space; using internal backup"
                );
            }
            StorageEvent::PathProvisioned { path } => {
                info!(path = %path.display(), "storage path ready");
            }
            StorageEvent::ProvisionFailed { path, reason } => {
                error!(path = %path.display(), reason = %reason, "cannot create storage path");
            }
        }
    }
}

/// Renders gigabytes with exactly two decimals.
pub fn format_gb(gigabytes: f64) -> String {
    format!("{gigabytes:.2}")
}

/// Keeps every event in memory, for callers that report decisions after the fact.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<StorageEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the events recorded so far.
    pub fn events(&self) -> Vec<StorageEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns recorded events at or above `severity`.
    pub fn at_least(&self, severity: Severity) -> Vec<StorageEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.severity() >= severity)
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: StorageEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
