//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod process;

use std::path::{Path, PathBuf};

use tracing::debug;

use rcpt_core::RcptConfig;

/// Default configuration file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rcpt")
        .join("config.json")
}

/// The config file in effect: `--config` if given, else the default path.
pub fn config_file(config_path: Option<&str>) -> PathBuf {
    config_path
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path)
}

/// Load the configuration in effect. A missing default file yields defaults;
/// a missing explicit `--config` file is an error.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<RcptConfig> {
    let path = config_file(config_path);

    if config_path.is_none() && !path.exists() {
        debug!("No config file at {}, using defaults", path.display());
        return Ok(RcptConfig::default());
    }

    read_config(&path)
}

pub fn read_config(path: &Path) -> anyhow::Result<RcptConfig> {
    debug!("Loading configuration from {}", path.display());
    RcptConfig::from_file(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))
}
