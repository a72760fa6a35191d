//! Configuration management commands.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Args;
use malbrose_core::config::{self, Config};
use malbrose_core::paths;

/// Config command arguments.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(clap::Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration (file, defaults, and env overrides)
    Show,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show configuration file path
    Path,
}

/// Run the config command. `path` is the `--config` override, if any.
pub fn run(path: Option<&Path>, args: ConfigArgs) -> anyhow::Result<ExitCode> {
    match args.command {
        ConfigCommand::Show => {
            let config = config::resolve(path)?;
            println!("{}", config.to_json5()?);
        }

        ConfigCommand::Init { force } => {
            let target = target_path(path)?;
            init(&target, force)?;
            println!("Wrote {}", target.display());
        }

        ConfigCommand::Path => println!("{}", target_path(path)?.display()),
    }
    Ok(ExitCode::SUCCESS)
}

fn target_path(path: Option<&Path>) -> anyhow::Result<PathBuf> {
    match path {
        Some(p) => Ok(p.to_path_buf()),
        None => Ok(paths::config_file()?),
    }
}

fn init(target: &Path, force: bool) -> anyhow::Result<()> {
    if target.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {} (use --force to overwrite)",
            target.display()
        );
    }
    Config::default().save(target)?;
    Ok(())
}
