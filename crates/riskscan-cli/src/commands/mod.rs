//! Subcommand implementations.

pub mod batch;
pub mod config;
pub mod inspect;
pub mod process;
pub mod template;

use std::path::{Path, PathBuf};

use tracing::debug;

use riskscan_core::RiskscanConfig;

/// Platform config location, e.g. `~/.config/riskscan/config.json`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("riskscan")
        .join("config.json")
}

/// Config file in effect: `--config` when given, otherwise the platform path.
pub fn config_path(explicit: Option<&str>) -> PathBuf {
    explicit.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Load the configuration. An explicit path must exist; the platform file is
/// optional and defaults apply without it.
pub fn load_config(explicit: Option<&str>) -> anyhow::Result<RiskscanConfig> {
    if let Some(path) = explicit {
        let path = Path::new(path);
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        return Ok(RiskscanConfig::from_file(path)?);
    }

    let path = default_config_path();
    if path.exists() {
        debug!("Loading config from {}", path.display());
        Ok(RiskscanConfig::from_file(&path)?)
    } else {
        Ok(RiskscanConfig::default())
    }
}
