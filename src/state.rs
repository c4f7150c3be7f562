// src/state.rs

//! Current-state snapshot of the target directory
//!
//! The resolver compares desired state against this immutable value. It
//! is populated by probing exactly the paths the desired state names
//! (link targets and their implied parent directories) through the
//! filesystem port, so planning never walks the whole target tree.

use crate::cancel::CancelToken;
use crate::error::{Result, ResultExt};
use crate::filesystem::Filesystem;
use crate::planner::DesiredState;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Size and mode of an observed regular file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileState {
    pub size: u64,
    pub mode: u32,
}

/// Observed target of an existing symlink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkState {
    pub target: PathBuf,
}

/// What the target directory looks like right now
#[derive(Debug, Clone, Default)]
pub struct CurrentState {
    files: HashMap<PathBuf, FileState>,
    links: HashMap<PathBuf, LinkState>,
    dirs: HashMap<PathBuf, bool>,
}

impl CurrentState {
    /// An empty snapshot (nothing observed)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Record an observed regular file
    pub fn insert_file(&mut self, path: impl Into<PathBuf>, state: FileState) {
        self.files.insert(path.into(), state);
    }

    /// Record an observed symlink
    pub fn insert_link(&mut self, path: impl Into<PathBuf>, target: impl Into<PathBuf>) {
        self.links.insert(
            path.into(),
            LinkState {
                target: target.into(),
            },
        );
    }

    /// Record an observed directory
    pub fn insert_dir(&mut self, path: impl Into<PathBuf>) {
        self.dirs.insert(path.into(), true);
    }

    pub fn file(&self, path: &Path) -> Option<&FileState> {
        self.files.get(path)
    }

    pub fn link(&self, path: &Path) -> Option<&LinkState> {
        self.links.get(path)
    }

    pub fn is_dir(&self, path: &Path) -> bool {
        self.dirs.get(path).copied().unwrap_or(false)
    }

    /// Probe the filesystem for every path the desired state names.
    ///
    /// A path is classified at most once: symlink first (without
    /// following), then directory, then regular file. Missing paths are
    /// simply absent from the snapshot.
    pub fn capture(
        fs: &dyn Filesystem,
        cancel: &CancelToken,
        desired: &DesiredState,
    ) -> Result<Self> {
        let mut state = Self::empty();
        for target in desired.link_targets() {
            state.probe(fs, cancel, target)?;
        }
        for dir in desired.dir_paths() {
            state.probe(fs, cancel, dir)?;
        }
        Ok(state)
    }

    fn probe(&mut self, fs: &dyn Filesystem, cancel: &CancelToken, path: &Path) -> Result<()> {
        cancel.check("state capture")?;
        if fs
            .is_symlink(cancel, path)
            .with_context(|| format!("probing {}", path.display()))?
        {
            let target = fs
                .read_link(cancel, path)
                .with_context(|| format!("probing {}", path.display()))?;
            self.insert_link(path, target);
            return Ok(());
        }
        if !fs.exists(cancel, path) {
            return Ok(());
        }
        if fs
            .is_dir(cancel, path)
            .with_context(|| format!("probing {}", path.display()))?
        {
            self.insert_dir(path);
            return Ok(());
        }
        let info = fs
            .stat(cancel, path)
            .with_context(|| format!("probing {}", path.display()))?;
        self.insert_file(
            path,
            FileState {
                size: info.size,
                mode: info.mode,
            },
        );
        Ok(())
    }
}
