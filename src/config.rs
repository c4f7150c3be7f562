// src/config.rs

//! Bootstrap configuration
//!
//! Optional TOML file supplying defaults for the directories, ignore
//! patterns, and conflict policies a run uses. Command-line flags always
//! win over config values; config values win over built-in defaults.
//!
//! ```toml
//! package_dir = "/home/u/dotfiles"
//! target_dir = "/home/u"
//! backup_dir = "/home/u/.dot-backup"
//! ignore = ["*.swp", "README*"]
//!
//! [policies]
//! on_file_exists = "backup"
//! ```

use crate::error::{Error, Result};
use crate::ignore::IgnoreSet;
use crate::resolver::ResolutionPolicies;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// User configuration, all fields optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub package_dir: Option<PathBuf>,
    pub target_dir: Option<PathBuf>,
    pub backup_dir: Option<PathBuf>,
    /// Extra ignore globs, added on top of the built-in defaults
    pub ignore: Vec<String>,
    pub policies: ResolutionPolicies,
}

impl Config {
    /// Parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::from(e).context(format!("reading config {}", path.display()))
        })?;
        toml::from_str(&text)
            .map_err(|e| Error::Parse(format!("config {}: {e}", path.display())))
    }

    /// Load from an explicit path, or from the default location if one
    /// exists, or fall back to built-in defaults
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// `~/.config/dot/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("dot").join("config.toml"))
    }

    /// The built-in ignore set extended with configured globs
    pub fn ignore_set(&self) -> Result<IgnoreSet> {
        let mut set = IgnoreSet::default();
        for glob in &self.ignore {
            set.add(glob)?;
        }
        Ok(set)
    }
}
