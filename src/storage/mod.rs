//! Storage Layer
//!
//! Platform directories for configuration and models, plus the output
//! directory that receives uploads, crops and exports.

pub mod outputs;

use anyhow::Result;
use std::path::PathBuf;

pub use outputs::OutputDir;

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("in", "aadhaarshield", "AadhaarShield")
        .ok_or_else(|| anyhow::anyhow!("Could not determine application directories"))
}

/// Get the application data directory
pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = project_dirs()?.data_dir().to_path_buf();
    std::fs::create_dir_all(&data_dir)?;

    Ok(data_dir)
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = project_dirs()?.config_dir().to_path_buf();
    std::fs::create_dir_all(&config_dir)?;

    Ok(config_dir)
}

/// Path of the persisted `config.toml`
pub fn config_file_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.toml"))
}
