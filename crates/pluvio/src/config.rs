use std::{
    fs,
    path::{Path, PathBuf},
};

use pluvio_battery::BatteryConfig;
use pluvio_core::{ErrorCode, PluvioError, StorageConfig};
use serde::{Deserialize, Serialize};

/// Everything the device reads from its JSON configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub storage: StorageConfig,
    pub battery: BatteryConfig,
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub mount_root: Option<PathBuf>,
    pub min_free_mb: Option<u64>,
    pub backup_path: Option<PathBuf>,
}

impl DeviceConfig {
    /// Loads configuration from file.
    pub fn load(path: &Path) -> Result<Self, PluvioError> {
        let content = fs::read_to_string(path).map_err(|err| PluvioError {
            code: ErrorCode::InvalidConfig,
            message: format!("read config file {}", path.display()),
            detail: Some(err.to_string()),
        })?;
        serde_json::from_str(&content).map_err(|err| PluvioError {
            code: ErrorCode::InvalidConfig,
            message: format!("parse config file {}", path.display()),
            detail: Some(err.to_string()),
        })
    }

    /// Loads `path` when given, otherwise starts from defaults, then applies `overrides`.
    pub fn resolve(path: Option<&Path>, overrides: &Overrides) -> Result<Self, PluvioError> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply(overrides);
        config.storage.validate()?;
        Ok(config)
    }

    fn apply(&mut self, overrides: &Overrides) {
        if let Some(mount_root) = &overrides.mount_root {
            self.storage.mount_root = mount_root.clone();
        }
        if let Some(min_free_mb) = overrides.min_free_mb {
            self.storage.min_free_mb = min_free_mb;
        }
        if let Some(backup_path) = &overrides.backup_path {
            self.storage.backup_path = backup_path.clone();
        }
    }
}
