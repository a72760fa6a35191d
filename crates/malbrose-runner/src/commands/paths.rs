//! Show resolved paths.

use std::process::ExitCode;

use malbrose_core::{paths, Config};
use malbrose_secure_storage::platform::platform_name;

use crate::loader::DllSearchPath;

pub fn run(config: &Config, search_path: &DllSearchPath) -> anyhow::Result<ExitCode> {
    println!("Platform:     {}", platform_name());
    println!("Data dir:     {}", config.storage_dir()?.display());
    println!("Slot file:    {}", config.slot_path()?.display());
    match paths::config_file() {
        Ok(path) => println!("Config file:  {}", path.display()),
        Err(e) => println!("Config file:  unavailable ({e})"),
    }
    println!("App dir:      {}", search_path.app_dir().display());
    for dir in search_path.search_paths() {
        println!("Search path:  {}", dir.display());
    }
    Ok(ExitCode::SUCCESS)
}
