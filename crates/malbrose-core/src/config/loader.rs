//! Configuration loading and persistence.

use super::Config;
use crate::env;
use crate::error::ConfigError;
use crate::paths;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = paths::config_file()?;
        Self::load(&path)
    }

    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        json5::from_str(content).map_err(|e| ConfigError::Json5(e.to_string()))
    }

    /// Save configuration to a file path.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_json5()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write atomically
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Serialize to JSON5 string.
    pub fn to_json5(&self) -> Result<String, ConfigError> {
        // json5 doesn't have a serializer; plain JSON is valid JSON5
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply `MALBROSE_*` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(env::get_var);
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(env::DATA_DIR_VAR) {
            debug!(data_dir = %dir, "data dir overridden from environment");
            self.storage.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(json) = lookup(env::LOG_JSON_VAR) {
            self.logging.json = env::parse_bool(&json);
        }
        if let Some(level) = lookup(env::LOG_LEVEL_VAR) {
            self.logging.level = level.trim().to_lowercase();
        }
    }

    /// Validate the configuration, collecting all errors before returning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if !paths::is_plain_file_name(&self.app.namespace) {
            errors.push(format!(
                "app.namespace must be a single directory name, got '{}'",
                self.app.namespace
            ));
        }

        if self.app.channel.trim().is_empty() {
            errors.push("app.channel must not be empty".to_string());
        }

        if !paths::is_plain_file_name(&self.storage.slot_file) {
            errors.push(format!(
                "storage.slot_file must be a plain file name, got '{}'",
                self.storage.slot_file
            ));
        }

        for subdir in &self.loader.search_subdirs {
            let p = Path::new(subdir);
            if subdir.trim().is_empty() || p.is_absolute() || subdir.contains("..") {
                errors.push(format!(
                    "loader.search_subdirs entries must be relative sub-directories, got '{}'",
                    subdir
                ));
            }
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(format!(
                "logging.level must be one of {}, got '{}'",
                LOG_LEVELS.join("|"),
                self.logging.level
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors.join("; ")))
        }
    }

    /// Directory holding the slot file.
    pub fn storage_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.storage.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => paths::app_dir(&self.app.namespace),
        }
    }

    /// Full path of the single-slot encryption key file.
    pub fn slot_path(&self) -> Result<PathBuf, ConfigError> {
        Ok(self.storage_dir()?.join(&self.storage.slot_file))
    }
}

/// Resolve the effective configuration for a run.
///
/// An explicit `path` must exist. Without one, the default config file is
/// used when present and built-in defaults otherwise. Environment overrides
/// are applied last, then the result is validated.
pub fn resolve(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => Config::load(p)?,
        None => match Config::load_default() {
            Ok(config) => config,
            Err(ConfigError::NotFound(p)) => {
                debug!(path = %p.display(), "no config file, using defaults");
                Config::default()
            }
            Err(ConfigError::NoDataDir) => Config::default(),
            Err(e) => return Err(e),
        },
    };

    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}
