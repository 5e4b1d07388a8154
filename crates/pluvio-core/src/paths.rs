use std::{
    env,
    path::{self, PathBuf},
};

/// Resolves the installation root from environment and the running executable.
///
/// This is also the default internal backup location.
pub fn install_root() -> PathBuf {
    if let Some(override_dir) = env::var_os("PLUVIO_HOME") {
        let dir = PathBuf::from(override_dir);
        return path::absolute(&dir).unwrap_or(dir);
    }

    if let Ok(exe) = env::current_exe()
        && let Some(parent) = exe.parent()
    {
        return parent.to_path_buf();
    }

    env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
