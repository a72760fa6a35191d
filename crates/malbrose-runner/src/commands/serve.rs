//! Serve the secure storage channel over stdio.

use std::process::ExitCode;

use malbrose_core::Config;
use malbrose_secure_storage::SecureStorageBridge;
use tokio::io::BufReader;
use tracing::{info, warn};

use crate::channel::{self, Shutdown};

/// Run until stdin closes or Ctrl-C.
pub async fn run(config: &Config) -> anyhow::Result<ExitCode> {
    let bridge = SecureStorageBridge::from_config(config)?;
    info!(
        channel = %config.app.channel,
        slot = %bridge.slot().path().display(),
        "serving secure storage channel"
    );

    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl-C, serving until EOF");
            std::future::pending::<()>().await;
        }
    };

    match channel::serve_until(&bridge, stdin, stdout, interrupt).await? {
        Shutdown::InputClosed(stats) => {
            info!(
                requests = stats.requests,
                failures = stats.failures,
                "input closed, shutting down"
            );
            Ok(ExitCode::SUCCESS)
        }
        Shutdown::Interrupted => {
            info!("interrupted, shutting down");
            // The stdin read runs on a blocking thread the runtime would wait
            // for on drop; every reply is already flushed.
            std::process::exit(0)
        }
    }
}
