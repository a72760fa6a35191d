//! Config file and environment override integration tests.

use malbrose_core::config::{self, Config};
use malbrose_core::ConfigError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
fn test_config_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("runner.json5");

    let mut config = Config::default();
    config.storage.data_dir = Some(dir.path().join("data"));
    config.loader.search_subdirs = vec!["ucrt".into(), "plugins".into()];
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_explicit_config_must_exist() {
    let result = config::resolve(Some(Path::new("/nonexistent/runner.json5")));
    assert!(matches!(result, Err(ConfigError::NotFound(_))));
}

#[test]
fn test_resolve_rejects_invalid_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("runner.json5");
    std::fs::write(&path, r#"{ storage: { slot_file: "../escape.bin" } }"#).unwrap();

    let result = config::resolve(Some(&path));
    assert!(matches!(result, Err(ConfigError::Validation(_))));
}

#[test]
fn test_overrides_redirect_slot_file() {
    let dir = TempDir::new().unwrap();
    let vars: HashMap<&str, String> = [
        ("MALBROSE_DATA_DIR", dir.path().display().to_string()),
        ("MALBROSE_LOG_LEVEL", "DEBUG".to_string()),
        ("MALBROSE_LOG_JSON", "true".to_string()),
    ]
    .into_iter()
    .collect();

    let mut config = Config::default();
    config.apply_overrides_from(|name| vars.get(name).cloned());
    config.validate().unwrap();

    assert_eq!(
        config.slot_path().unwrap(),
        PathBuf::from(dir.path()).join("secure_storage.bin")
    );
    assert_eq!(config.logging.level, "debug");
    assert!(config.logging.json);
}
