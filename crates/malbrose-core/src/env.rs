//! Environment variable handling.

use std::env;

/// Overrides the configured config file path.
pub const CONFIG_VAR: &str = "MALBROSE_CONFIG";

/// Overrides the storage data directory.
pub const DATA_DIR_VAR: &str = "MALBROSE_DATA_DIR";

/// Switches log output to JSON when truthy.
pub const LOG_JSON_VAR: &str = "MALBROSE_LOG_JSON";

/// Overrides the default log level.
pub const LOG_LEVEL_VAR: &str = "MALBROSE_LOG_LEVEL";

/// Get an environment variable, returning None if not set or empty.
pub fn get_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

/// Interpret a raw value as a boolean flag.
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
