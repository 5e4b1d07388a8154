//! In-memory [`VolumeOps`] used by unit tests.

use std::{
    io,
    path::{Path, PathBuf},
    sync::Mutex,
};

use pluvio_core::CapacityReport;
use pluvio_platform::{PlatformError, VolumeOps};

pub const MB: u64 = 1024 * 1024;

struct FakeVolume {
    path: PathBuf,
    mounted: bool,
    writable: bool,
    free_bytes: Option<u64>,
}

#[derive(Default)]
pub struct FakeVolumes {
    volumes: Vec<FakeVolume>,
    strays: Vec<PathBuf>,
    unlistable: bool,
    fail_create: bool,
    created: Mutex<Vec<PathBuf>>,
}

impl FakeVolumes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount root that cannot be listed at all.
    pub fn unlistable() -> Self {
        Self {
            unlistable: true,
            ..Self::default()
        }
    }

    /// Adds a listed entry; `free_mb = None` makes its capacity query fail.
    pub fn volume(mut self, path: &str, mounted: bool, writable: bool, free_mb: Option<u64>) -> Self {
        self.volumes.push(FakeVolume {
            path: PathBuf::from(path),
            mounted,
            writable,
            free_bytes: free_mb.map(|mb| mb * MB),
        });
        self
    }

    /// Adds a mounted, writable entry with an exact free byte count.
    pub fn volume_bytes(mut self, path: &str, free_bytes: u64) -> Self {
        self.volumes.push(FakeVolume {
            path: PathBuf::from(path),
            mounted: true,
            writable: true,
            free_bytes: Some(free_bytes),
        });
        self
    }

    /// Adds an entry that is listed but whose probes all fail.
    pub fn stray_entry(mut self, path: &str) -> Self {
        self.strays.push(PathBuf::from(path));
        self
    }

    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    /// Directories successfully "created" so far.
    pub fn created(&self) -> Vec<PathBuf> {
        self.created
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn find(&self, path: &Path) -> Result<&FakeVolume, PlatformError> {
        self.volumes
            .iter()
            .find(|volume| volume.path == path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such volume").into())
    }
}

impl VolumeOps for FakeVolumes {
    fn list_entries(&self, _root: &Path) -> Result<Vec<PathBuf>, PlatformError> {
        if self.unlistable {
            return Err(io::Error::new(io::ErrorKind::NotFound, "mount root absent").into());
        }
        Ok(self
            .volumes
            .iter()
            .map(|volume| volume.path.clone())
            .chain(self.strays.iter().cloned())
            .collect())
    }

    fn is_mount_point(&self, path: &Path) -> Result<bool, PlatformError> {
        Ok(self.find(path)?.mounted)
    }

    fn is_writable(&self, path: &Path) -> bool {
        self.find(path).map(|volume| volume.writable).unwrap_or(false)
    }

    fn capacity(&self, path: &Path) -> Result<CapacityReport, PlatformError> {
        let free_bytes = self
            .find(path)?
            .free_bytes
            .ok_or_else(|| io::Error::other("device removed"))?;
        Ok(CapacityReport {
            total_bytes: free_bytes * 2,
            used_bytes: free_bytes,
            free_bytes,
        })
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), PlatformError> {
        if self.fail_create {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only filesystem").into());
        }
        self.created
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(path.to_path_buf());
        Ok(())
    }
}
