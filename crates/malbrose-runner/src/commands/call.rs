//! One-shot request against the bridge.

use std::process::ExitCode;

use anyhow::Context;
use clap::Args;
use malbrose_core::Config;
use malbrose_secure_storage::{MethodCall, SecureStorageBridge};
use serde_json::Value;

/// Call command arguments.
#[derive(Args)]
pub struct CallArgs {
    /// Method name, e.g. getCredential
    pub method: String,

    /// Arguments as a JSON object
    #[arg(short, long)]
    pub args: Option<String>,
}

/// Run the call command. Exits non-zero unless the reply is a success.
pub fn run(config: &Config, args: CallArgs) -> anyhow::Result<ExitCode> {
    let call = build_call(args)?;
    let bridge = SecureStorageBridge::from_config(config)?;
    let reply = bridge.handle(&call);
    println!("{}", reply.to_line(None)?);

    Ok(if reply.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn build_call(args: CallArgs) -> anyhow::Result<MethodCall> {
    let arguments = args
        .args
        .as_deref()
        .map(serde_json::from_str::<Value>)
        .transpose()
        .context("--args must be valid JSON")?;
    Ok(MethodCall::new(args.method, arguments))
}
