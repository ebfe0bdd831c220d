//! `keyrelay.toml` model.

use crate::constants;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConfigFile {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub access: AccessSection,
    #[serde(default)]
    pub apis: ApisSection,
    #[serde(default)]
    pub macros: MacrosSection,
    #[serde(default)]
    pub driver: DriverSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSection {
    #[serde(default = "default_addr")]
    pub addr: String,
    /// Bytes accepted by the type and clip endpoints.
    #[serde(default = "default_text_limit")]
    pub text_limit: usize,
    /// Bytes accepted for a saved text set.
    #[serde(default = "default_texts_limit")]
    pub texts_limit: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            text_limit: default_text_limit(),
            texts_limit: default_texts_limit(),
        }
    }
}

/// Which peers may talk to the server at all.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ClientScope {
    /// Only peers on a subnet of one of this host's interfaces.
    #[default]
    Local,
    All,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessSection {
    #[serde(default)]
    pub clients: ClientScope,
    #[serde(default)]
    pub multi_client: bool,
    #[serde(default = "default_failure_delay")]
    pub failure_delay_ms: [u64; 2],
}

impl Default for AccessSection {
    fn default() -> Self {
        Self {
            clients: ClientScope::default(),
            multi_client: false,
            failure_delay_ms: default_failure_delay(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ApisSection {
    /// Comma separated capability names. Empty or absent enables nothing.
    #[serde(default)]
    pub enabled: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MacrosSection {
    #[serde(default = "default_pause_ms")]
    pub pause_ms: u64,
}

impl Default for MacrosSection {
    fn default() -> Self {
        Self {
            pause_ms: default_pause_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum DriverKind {
    #[default]
    DryRun,
    Xdotool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DriverSection {
    #[serde(default)]
    pub kind: DriverKind,
}

fn default_addr() -> String {
    constants::DEFAULT_ADDR.to_string()
}

fn default_text_limit() -> usize {
    constants::DEFAULT_TEXT_LIMIT
}

fn default_texts_limit() -> usize {
    constants::DEFAULT_TEXTS_LIMIT
}

fn default_failure_delay() -> [u64; 2] {
    constants::DEFAULT_FAILURE_DELAY_MS
}

fn default_pause_ms() -> u64 {
    constants::DEFAULT_MACRO_PAUSE_MS
}
