//! Unix implementation of [`VolumeOps`] backed by `statvfs(3)` and `access(2)`.

#![cfg(unix)]

use std::{
    ffi::CString,
    fs, io,
    os::unix::{ffi::OsStrExt, fs::MetadataExt},
    path::{Path, PathBuf},
};

use pluvio_core::CapacityReport;
use pluvio_platform::{PlatformError, VolumeOps};

/// Volume probes for Linux/BSD/macOS hosts.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnixVolumeOps;

impl UnixVolumeOps {
    pub fn new() -> Self {
        Self
    }
}

impl VolumeOps for UnixVolumeOps {
    fn list_entries(&self, root: &Path) -> Result<Vec<PathBuf>, PlatformError> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(root)? {
            entries.push(entry?.path());
        }
        Ok(entries)
    }

    fn is_mount_point(&self, path: &Path) -> Result<bool, PlatformError> {
        let metadata = fs::symlink_metadata(path)?;
        if metadata.file_type().is_symlink() {
            return Ok(false);
        }

        let parent = fs::symlink_metadata(path.join(".."))?;
        // A different device, or the same inode as `..` (filesystem root), marks a mount.
        Ok(metadata.dev() != parent.dev() || metadata.ino() == parent.ino())
    }

    fn is_writable(&self, path: &Path) -> bool {
        let Ok(c_path) = to_c_path(path) else {
            return false;
        };
        unsafe { libc::access(c_path.as_ptr(), libc::W_OK) == 0 }
    }

    fn capacity(&self, path: &Path) -> Result<CapacityReport, PlatformError> {
        let c_path = to_c_path(path)?;
        let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
        let rc = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
        if rc != 0 {
            return Err(io::Error::last_os_error().into());
        }

        let fragment = stat.f_frsize as u64;
        let blocks = stat.f_blocks as u64;
        let report = CapacityReport {
            total_bytes: blocks.saturating_mul(fragment),
            used_bytes: blocks
                .saturating_sub(stat.f_bfree as u64)
                .saturating_mul(fragment),
            free_bytes: (stat.f_bavail as u64).saturating_mul(fragment),
        };
        tracing::trace!(
            path = %path.display(),
            total = report.total_bytes,
            free = report.free_bytes,
            "statvfs"
        );
        Ok(report)
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), PlatformError> {
        fs::create_dir_all(path)?;
        Ok(())
    }
}

fn to_c_path(path: &Path) -> Result<CString, PlatformError> {
    CString::new(path.as_os_str().as_bytes()).map_err(|_| {
        PlatformError::InvalidInput(format!("path {} contains a NUL byte", path.display()))
    })
}
