//! Data root resolution and file layout.

use crate::constants;
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub config_toml: PathBuf,
    pub auth: PathBuf,
    pub cert: PathBuf,
    pub key: PathBuf,
    pub macros_toml: PathBuf,
    pub texts: PathBuf,
    pub texts_lock: PathBuf,
}

impl AppPaths {
    /// Resolve the data root from CLI arg, env var, or the nearest ancestor holding a config.
    pub fn resolve(root_arg: Option<PathBuf>) -> Result<Self> {
        if let Some(root) = root_arg {
            return Ok(Self::from_root(root));
        }
        if let Ok(root) = env::var(constants::ROOT_ENV) {
            if !root.is_empty() {
                return Ok(Self::from_root(PathBuf::from(root)));
            }
        }
        if let Some(found) = find_data_root()? {
            return Ok(Self::from_root(found));
        }
        Ok(Self::from_root(PathBuf::from(constants::DEFAULT_ROOT)))
    }

    pub fn from_root(root: PathBuf) -> Self {
        Self {
            config_toml: root.join("keyrelay.toml"),
            auth: root.join("auth.txt"),
            cert: root.join("cert.pem"),
            key: root.join("key.pem"),
            macros_toml: root.join("macros.toml"),
            texts: root.join("texts"),
            texts_lock: root.join("texts.lock"),
            root,
        }
    }
}

fn find_data_root() -> Result<Option<PathBuf>> {
    let cwd = env::current_dir().context("resolve current directory")?;
    Ok(cwd
        .ancestors()
        .find(|dir| looks_like_root(dir))
        .map(Path::to_path_buf))
}

fn looks_like_root(path: &Path) -> bool {
    path.join("keyrelay.toml").is_file()
}

impl std::fmt::Display for AppPaths {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "keyrelay@{}", self.root.display())
    }
}
