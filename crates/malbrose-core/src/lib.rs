//! # malbrose-core
//!
//! Shared functionality for the Malbrose POS native runner:
//!
//! - **Configuration**: JSON5 runner config with defaults, validation, and env overrides
//! - **Paths**: per-user local application-data resolution
//! - **Secrets**: a zeroizing string wrapper that never prints its contents

pub mod config;
pub mod env;
pub mod error;
pub mod paths;
pub mod secret;

pub use config::Config;
pub use error::ConfigError;
pub use secret::SecretString;
