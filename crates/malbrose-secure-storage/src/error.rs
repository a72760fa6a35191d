//! Error types for secure storage operations.

use malbrose_core::ConfigError;
use thiserror::Error;

/// Errors raised by protectors, credential stores, and the slot file.
///
/// These never cross the wire as-is; the bridge folds them into the fixed
/// [`crate::ErrorCode`] set.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Secret not found: {0}")]
    NotFound(String),

    #[error("Protection failed: {0}")]
    ProtectFailed(String),

    #[error("Unprotect failed: {0}")]
    UnprotectFailed(String),

    #[error("Credential store error: {0}")]
    Backend(String),

    #[error("Invalid credential key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Convenience result alias for secure storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
