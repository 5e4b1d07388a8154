use std::path::Path;

use pluvio_core::CapacityReport;
use pluvio_platform::VolumeOps;

use crate::events::{EventSink, StorageEvent};

/// Result of checking one path against the free-space threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Free space meets the threshold.
    Admitted(CapacityReport),
    /// Free space is below the threshold.
    Insufficient(CapacityReport),
    /// Free space could not be sampled.
    Unavailable,
}

/// Admits a path only when its free whole megabytes reach a minimum.
pub struct CapacityGate<'a> {
    ops: &'a dyn VolumeOps,
    sink: &'a dyn EventSink,
}

impl<'a> CapacityGate<'a> {
    pub fn new(ops: &'a dyn VolumeOps, sink: &'a dyn EventSink) -> Self {
        Self { ops, sink }
    }

    pub fn admit(&self, path: &Path, min_free_mb: u64) -> bool {
        matches!(self.check(path, min_free_mb), Admission::Admitted(_))
    }

    /// Samples capacity for `path` once and classifies it against `min_free_mb`.
    pub fn check(&self, path: &Path, min_free_mb: u64) -> Admission {
        let report = match self.ops.capacity(path) {
            Ok(report) => report,
            Err(err) => {
                self.sink.emit(StorageEvent::CapacityQueryFailed {
                    path: path.to_path_buf(),
                    reason: err.to_string(),
                });
                return Admission::Unavailable;
            }
        };

        let free_mb = report.free_mb();
        self.sink.emit(StorageEvent::CapacityChecked {
            path: path.to_path_buf(),
            free_mb,
            min_free_mb,
        });

        if free_mb >= min_free_mb {
            Admission::Admitted(report)
        } else {
            self.sink.emit(StorageEvent::InsufficientSpace {
                path: path.to_path_buf(),
                free_mb,
                min_free_mb,
            });
            Admission::Insufficient(report)
        }
    }
}
