// src/manifest.rs

//! Installed-state manifest
//!
//! Persists what is managed at `<target_root>/.dot-manifest.json` as
//! pretty-printed JSON with an RFC-3339 `updated_at` stamp. The planning
//! core never reads or writes this file; the CLI layer composes it with
//! plans. Writes are atomic: the content goes to a `.tmp` sibling which
//! is renamed over the final path, and the temp file is removed if the
//! rename fails.

use crate::cancel::CancelToken;
use crate::error::{Result, ResultExt};
use crate::filesystem::Filesystem;
use crate::path::TargetPath;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Manifest file name under the target root
pub const MANIFEST_FILE: &str = ".dot-manifest.json";

/// One materialized link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub source: PathBuf,
    pub target: PathBuf,
}

/// A managed package and the links it owns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageRecord {
    pub name: String,
    pub installed_at: DateTime<Utc>,
    pub links: Vec<LinkRecord>,
}

/// Everything currently managed in a target directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub updated_at: DateTime<Utc>,
    pub packages: BTreeMap<String, PackageRecord>,
}

impl Manifest {
    /// A manifest with nothing managed
    pub fn empty() -> Self {
        Self {
            updated_at: Utc::now(),
            packages: BTreeMap::new(),
        }
    }

    /// Record or replace a package entry
    pub fn record_install(&mut self, name: &str, links: Vec<LinkRecord>) {
        self.packages.insert(
            name.to_string(),
            PackageRecord {
                name: name.to_string(),
                installed_at: Utc::now(),
                links,
            },
        );
    }

    /// Drop a package entry; true if it was present
    pub fn remove_package(&mut self, name: &str) -> bool {
        self.packages.remove(name).is_some()
    }

    pub fn package(&self, name: &str) -> Option<&PackageRecord> {
        self.packages.get(name)
    }

    pub fn package_names(&self) -> impl Iterator<Item = &str> {
        self.packages.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

/// Loads and saves the manifest through the filesystem port
#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    pub fn new(target_root: &TargetPath) -> Self {
        Self {
            path: target_root.join(MANIFEST_FILE).into_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the manifest; a missing file is an empty manifest
    pub fn load(&self, fs: &dyn Filesystem, cancel: &CancelToken) -> Result<Manifest> {
        match fs.read_file(cancel, &self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.is_not_found() => Ok(Manifest::empty()),
            Err(e) => Err(e.context("loading manifest")),
        }
    }

    /// Persist the manifest atomically, refreshing `updated_at`
    pub fn save(
        &self,
        fs: &dyn Filesystem,
        cancel: &CancelToken,
        manifest: &mut Manifest,
    ) -> Result<()> {
        manifest.updated_at = Utc::now();
        let json = serde_json::to_vec_pretty(manifest)?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs.write_file(cancel, &tmp, &json, 0o644)
            .context("writing manifest temp file")?;
        if let Err(e) = fs.rename(cancel, &tmp, &self.path) {
            let _ = fs.remove(cancel, &tmp);
            return Err(e.context("persisting manifest"));
        }
        Ok(())
    }
}
