pub mod config;
pub mod serve;
pub mod status;

use anyhow::Result;
use llamashim_core::Config;
use std::path::{Path, PathBuf};

/// Resolve the config file: explicit path, else the default location.
pub fn config_file(path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(path.to_path_buf()),
        None => Config::config_path(),
    }
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    Config::load_from(&config_file(path)?)
}
