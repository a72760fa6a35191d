//! Malbrose POS native runner.
//!
//! Hosts the secure storage bridge for the UI layer and prepares the
//! process environment (DLL search path) before anything else loads.

pub mod channel;
pub mod commands;
pub mod loader;
pub mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::debug;

/// Malbrose POS native runner
#[derive(Parser)]
#[command(name = "malbrose-runner")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to config file
    #[arg(short, long, env = malbrose_core::env::CONFIG_VAR)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Serve the secure storage channel over stdin/stdout
    Serve,

    /// Send a single request and print the reply
    Call(commands::call::CallArgs),

    /// Show resolved storage and loader paths
    Paths,

    /// Inspect or create the runner configuration
    Config(commands::config::ConfigArgs),

    /// Show version information
    Version,
}

/// Run the CLI with the given arguments.
pub async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let command = match cli.command {
        Commands::Version => {
            println!("malbrose-runner {}", env!("CARGO_PKG_VERSION"));
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Config(args) => return commands::config::run(cli.config.as_deref(), args),
        other => other,
    };

    let config = malbrose_core::config::resolve(cli.config.as_deref())?;
    logging::init(&config.logging, cli.verbose)?;
    debug!(channel = %config.app.channel, "configuration loaded");

    let search_path = loader::DllSearchPath::from_current_exe(&config.loader)?;
    search_path.install()?;

    match command {
        Commands::Serve => commands::serve::run(&config).await,
        Commands::Call(args) => commands::call::run(&config, args),
        Commands::Paths => commands::paths::run(&config, &search_path),
        Commands::Version | Commands::Config(_) => Ok(ExitCode::SUCCESS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_version() {
        let cli = Cli::try_parse_from(["malbrose-runner", "version"]).unwrap();
        assert!(matches!(cli.command, Commands::Version));
    }

    #[test]
    fn test_parse_serve_with_flags() {
        let cli = Cli::try_parse_from([
            "malbrose-runner",
            "-vv",
            "--config",
            "/etc/pos/runner.json5",
            "serve",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/pos/runner.json5")));
        assert!(matches!(cli.command, Commands::Serve));
    }

    #[test]
    fn test_parse_call() {
        let cli = Cli::try_parse_from([
            "malbrose-runner",
            "call",
            "getCredential",
            "--args",
            r#"{"key":"k"}"#,
        ])
        .unwrap();
        match cli.command {
            Commands::Call(args) => {
                assert_eq!(args.method, "getCredential");
                assert_eq!(args.args.as_deref(), Some(r#"{"key":"k"}"#));
            }
            _ => panic!("Expected Call command"),
        }
    }

    #[test]
    fn test_parse_call_without_args() {
        let cli = Cli::try_parse_from(["malbrose-runner", "call", "getEncryptionKey"]).unwrap();
        match cli.command {
            Commands::Call(args) => assert!(args.args.is_none()),
            _ => panic!("Expected Call command"),
        }
    }

    #[test]
    fn test_parse_config_init_force() {
        let cli = Cli::try_parse_from(["malbrose-runner", "config", "init", "--force"]).unwrap();
        match cli.command {
            Commands::Config(args) => assert!(matches!(
                args.command,
                commands::config::ConfigCommand::Init { force: true }
            )),
            _ => panic!("Expected Config command"),
        }
    }

    #[test]
    fn test_parse_unknown_subcommand() {
        assert!(Cli::try_parse_from(["malbrose-runner", "frobnicate"]).is_err());
    }
}
