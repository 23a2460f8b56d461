use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tailcode_shared::config::Config;
use tracing::{debug, info};

const APP_DIR: &str = "tailcode";
const CONFIG_FILE: &str = "config.yaml";

/// Candidate config files, most specific first.
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join("config").join(CONFIG_FILE));
        paths.push(cwd.join(CONFIG_FILE));
    }
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join(APP_DIR).join(CONFIG_FILE));
    }
    paths
}

/// Where `tc discover` writes by default.
pub fn default_config_path() -> Result<PathBuf> {
    let dir = dirs::config_dir().context("Failed to get config directory")?;
    Ok(dir.join(APP_DIR).join(CONFIG_FILE))
}

pub fn parse(contents: &str) -> Result<Config> {
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    let value: serde_yaml::Value =
        serde_yaml::from_str(contents).context("Failed to parse config file")?;
    if value.is_null() {
        return Ok(Config::default());
    }
    serde_yaml::from_value(value).context("Failed to parse config file")
}

pub fn load_from(path: &Path) -> Result<Config> {
    info!("Loading config from {}", path.display());
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    parse(&contents).with_context(|| format!("Invalid config in {}", path.display()))
}

/// Load the explicit `path`, or the first file found on the search path.
/// A missing file means an empty default config.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let found = match path {
        Some(path) => Some(path.to_path_buf()),
        None => search_paths().into_iter().find(|p| p.exists()),
    };

    match found {
        Some(path) if path.exists() => load_from(&path),
        Some(path) => {
            debug!("Config file {} does not exist, using defaults", path.display());
            Ok(Config::default())
        }
        None => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
    }
}
