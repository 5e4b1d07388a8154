use std::{
    path::{Path, PathBuf},
    vec,
};

use pluvio_core::{Candidate, CandidateOrder};
use pluvio_platform::VolumeOps;

use crate::events::{EventSink, StorageEvent};

/// Enumerates mount-root entries as volume candidates.
pub struct VolumeScanner<'a> {
    ops: &'a dyn VolumeOps,
    sink: &'a dyn EventSink,
    order: CandidateOrder,
}

impl<'a> VolumeScanner<'a> {
    pub fn new(ops: &'a dyn VolumeOps, sink: &'a dyn EventSink, order: CandidateOrder) -> Self {
        Self { ops, sink, order }
    }

    /// Lists `mount_root` and returns candidates that are probed as they are pulled.
    ///
    /// An unlistable root yields no candidates and a warning event.
    pub fn scan(&self, mount_root: &Path) -> Candidates<'a> {
        let mut entries = match self.ops.list_entries(mount_root) {
            Ok(entries) => entries,
            Err(err) => {
                self.sink.emit(StorageEvent::MountRootUnavailable {
                    mount_root: mount_root.to_path_buf(),
                    reason: err.to_string(),
                });
                Vec::new()
            }
        };

        if self.order == CandidateOrder::ByName {
            entries.sort();
        }

        Candidates {
            entries: entries.into_iter(),
            ops: self.ops,
            sink: self.sink,
        }
    }
}

/// Lazy candidate sequence produced by [`VolumeScanner::scan`].
pub struct Candidates<'a> {
    entries: vec::IntoIter<PathBuf>,
    ops: &'a dyn VolumeOps,
    sink: &'a dyn EventSink,
}

impl Iterator for Candidates<'_> {
    type Item = Candidate;

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.entries.next()?;

        let mounted = match self.ops.is_mount_point(&path) {
            Ok(mounted) => mounted,
            Err(err) => {
                self.sink.emit(StorageEvent::MountProbeFailed {
                    path: path.clone(),
                    reason: err.to_string(),
                });
                false
            }
        };
        let writable = self.ops.is_writable(&path);

        self.sink.emit(StorageEvent::CandidateInspected {
            path: path.clone(),
            mounted,
            writable,
        });

        Some(Candidate {
            path,
            mounted,
            writable,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}
