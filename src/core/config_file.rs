//! Load and save `keyrelay.toml`.

use crate::models::config::ConfigFile;
use crate::util::fs as app_fs;
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

/// Read the config, falling back to defaults when the file does not exist.
pub fn load(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::default());
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let config: ConfigFile =
        toml::from_str(&content).with_context(|| format!("parse config {}", path.display()))?;
    validate(&config).with_context(|| format!("invalid config {}", path.display()))?;
    Ok(config)
}

pub fn save(path: &Path, config: &ConfigFile) -> Result<()> {
    let content = toml::to_string_pretty(config).context("serialize config")?;
    app_fs::write_atomic(path, content.as_bytes())
        .with_context(|| format!("save config {}", path.display()))
}

fn validate(config: &ConfigFile) -> Result<()> {
    let [lo, hi] = config.access.failure_delay_ms;
    if lo > hi {
        bail!("access.failure_delay_ms: lower bound {} exceeds upper bound {}", lo, hi);
    }
    if config.server.text_limit == 0 {
        bail!("server.text_limit must be positive");
    }
    Ok(())
}
