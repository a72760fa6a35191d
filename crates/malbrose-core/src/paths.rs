//! Path resolution utilities.
//!
//! Everything the runner persists lives under
//! `<local-app-data>/<namespace>/`, e.g. `%LOCALAPPDATA%\MalbrosePOS` on
//! Windows or `~/.local/share/MalbrosePOS` on Linux.

use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// Default application namespace directory.
pub const APP_NAMESPACE: &str = "MalbrosePOS";

/// File name of the runner configuration.
pub const CONFIG_FILE_NAME: &str = "runner.json5";

/// The platform's per-user local application-data directory.
pub fn local_data_dir() -> Result<PathBuf, ConfigError> {
    dirs::data_local_dir().ok_or(ConfigError::NoDataDir)
}

/// Get the namespaced application directory (`<local-app-data>/<namespace>`).
pub fn app_dir(namespace: &str) -> Result<PathBuf, ConfigError> {
    Ok(local_data_dir()?.join(namespace))
}

/// Get the default config file path (`<local-app-data>/MalbrosePOS/runner.json5`).
pub fn config_file() -> Result<PathBuf, ConfigError> {
    Ok(app_dir(APP_NAMESPACE)?.join(CONFIG_FILE_NAME))
}

/// Create `dir` (and parents) if it does not exist yet.
pub fn ensure_dir(dir: &Path) -> Result<(), ConfigError> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// True if `name` is usable as a single path component (no separators, not `.`/`..`).
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && Path::new(name).components().count() == 1
}
