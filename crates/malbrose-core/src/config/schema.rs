//! Configuration schema definitions.

use crate::paths::APP_NAMESPACE;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main runner configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Application identity.
    #[serde(default)]
    pub app: AppConfig,

    /// Secure storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// DLL search path settings (Windows only; ignored elsewhere).
    #[serde(default)]
    pub loader: LoaderConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Application identity section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Directory name under the local app-data dir, also used as the
    /// credential user name and keyring service.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Channel name the UI layer addresses the bridge by.
    #[serde(default = "default_channel")]
    pub channel: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            channel: default_channel(),
        }
    }
}

fn default_namespace() -> String {
    APP_NAMESPACE.to_string()
}

fn default_channel() -> String {
    "com.malbrose.pos/secure_storage".to_string()
}

/// Secure storage section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// Explicit data directory. When unset, `<local-app-data>/<namespace>` is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// File name of the single-slot encryption key file.
    #[serde(default = "default_slot_file")]
    pub slot_file: String,

    /// Description bound into protected blobs.
    #[serde(default = "default_protection_description")]
    pub protection_description: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            slot_file: default_slot_file(),
            protection_description: default_protection_description(),
        }
    }
}

fn default_slot_file() -> String {
    "secure_storage.bin".to_string()
}

fn default_protection_description() -> String {
    format!("{APP_NAMESPACE}_EncryptionKey")
}

/// DLL search path section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoaderConfig {
    /// Sub-directories of the executable's directory to add to the DLL search
    /// path, in priority order. Missing directories are skipped.
    #[serde(default = "default_search_subdirs")]
    pub search_subdirs: Vec<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            search_subdirs: default_search_subdirs(),
        }
    }
}

fn default_search_subdirs() -> Vec<String> {
    vec!["ucrt".to_string()]
}

/// Logging section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
