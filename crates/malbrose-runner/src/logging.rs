//! Tracing subscriber setup.
//!
//! Logs always go to stderr; stdout is reserved for channel replies.

use malbrose_core::config::LoggingConfig;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directive for a verbosity level.
pub fn default_directive(level: &str, verbose: u8) -> String {
    let level = match verbose {
        0 => level,
        1 => "debug",
        _ => "trace",
    };
    format!("malbrose={level}")
}

/// Install the global subscriber. `RUST_LOG` wins over config and `-v`.
pub fn init(config: &LoggingConfig, verbose: u8) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(&config.level, verbose)));

    let json = config.json;
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().with_writer(std::io::stderr)))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))
}
