//! Malbrose POS runner entry point.

use std::process::ExitCode;

use clap::Parser;
use malbrose_runner::{run, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    run(cli).await
}
