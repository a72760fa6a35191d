//! Shared fixtures for the integration tests.

use malbrose_core::Config;
use malbrose_secure_storage::{KeyProtector, MemoryCredentialStore, SecureStorageBridge, SlotFile};
use std::path::Path;

/// Config whose storage lives under `dir`.
pub fn config_in(dir: &Path) -> Config {
    let mut config = Config::default();
    config.storage.data_dir = Some(dir.to_path_buf());
    config
}

/// Bridge with in-process backends and the slot file from `config`.
pub fn memory_bridge(config: &Config, protector: KeyProtector) -> SecureStorageBridge {
    let slot = config.slot_path().unwrap();
    SecureStorageBridge::new(
        Box::new(protector),
        Box::new(MemoryCredentialStore::new()),
        SlotFile::new(slot),
    )
}

/// Parse every reply line written by the channel.
pub fn reply_lines(output: &[u8]) -> Vec<serde_json::Value> {
    std::str::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}
