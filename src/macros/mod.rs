//! Macro language: parsing, compilation, and execution.
//!
//! Macros are defined in `macros.toml`:
//!
//! ```toml
//! [macros]
//! greet = '"Hello" [tap enter]'
//! save-all = '(editor [tap s ctrl shift])'
//! ```

pub mod interpreter;
pub mod parse;
pub mod step;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub use interpreter::{Interpreter, RunSummary};
pub use step::Step;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Macro {
    pub name: String,
    pub steps: Vec<Step>,
}

impl Macro {
    pub fn compile(name: &str, source: &str) -> Result<Self> {
        let exprs = parse::parse(source).with_context(|| format!("macro {}", name))?;
        Ok(Self {
            name: name.to_string(),
            steps: step::compile(&exprs),
        })
    }
}

/// All macros of one file; replaced wholesale on reload.
#[derive(Debug, Clone, Default)]
pub struct MacroSet {
    macros: BTreeMap<String, Macro>,
}

#[derive(Debug, Default, Deserialize)]
struct MacroFile {
    #[serde(default)]
    macros: BTreeMap<String, String>,
}

impl MacroSet {
    /// Load and compile every macro.
    ///
    /// A missing file is an empty set; any syntax error fails the load.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(file = %path.display(), "no macro file");
            return Ok(Self::default());
        }
        let content =
            fs::read_to_string(path).with_context(|| format!("read macros {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("load macros {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let file: MacroFile = toml::from_str(content).context("parse macro file")?;
        let mut macros = BTreeMap::new();
        for (name, source) in &file.macros {
            macros.insert(name.clone(), Macro::compile(name, source)?);
        }
        Ok(Self { macros })
    }

    pub fn get(&self, name: &str) -> Option<&Macro> {
        self.macros.get(name)
    }

    /// Names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.macros.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Macro> {
        self.macros.values()
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("macros.toml");
        fs::write(
            &path,
            "[macros]\ngreet = '\"Hello\" [tap enter]'\nclick = '{left click}'\n",
        )
        .unwrap();
        let set = MacroSet::load(&path).unwrap();
        assert_eq!(set.names(), vec!["click", "greet"]);
        assert_eq!(set.get("greet").unwrap().steps.len(), 2);
        assert!(set.get("nope").is_none());
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let set = MacroSet::load(&dir.path().join("macros.toml")).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_syntax_error_names_macro() {
        let err = MacroSet::from_toml("[macros]\nbroken = '[tap enter'\n").unwrap_err();
        assert!(format!("{:#}", err).contains("macro broken"));
    }

    #[test]
    fn test_malformed_steps_still_load() {
        let set = MacroSet::from_toml("[macros]\nodd = '[] a'\n").unwrap();
        let steps = &set.get("odd").unwrap().steps;
        assert!(matches!(steps[0], Step::Malformed(_)));
        assert_eq!(steps[1], Step::Tap("a".to_string()));
    }
}
