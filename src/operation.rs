// src/operation.rs

//! Filesystem operation model
//!
//! A plan is an ordered list of operations. Each operation is a value with
//! a unique id, a closed kind (six variants, so `execute`/`rollback`/
//! equality stay exhaustiveness-checked), dependencies on other operations
//! by id, a pure `validate`, and side-effecting `execute`/`rollback`
//! against the filesystem port.
//!
//! `rollback` is the best-effort inverse used when a later operation in
//! the same plan fails. `LinkDelete` rolls back to a no-op: the original
//! link target is not retained on the operation, so there is nothing to
//! restore. A stricter design would capture the pre-deletion target at
//! execute time.

use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::filesystem::Filesystem;
use crate::path::FilePath;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Unique identifier of an operation within a plan
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct OperationId(String);

impl OperationId {
    /// A fresh random id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an existing id; must be non-empty
    pub fn parse(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::InvalidOperation(
                "operation id must be non-empty".to_string(),
            ));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The closed set of operation kinds
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperationKind {
    /// Create a symlink at `target` pointing to `source`
    LinkCreate { source: FilePath, target: FilePath },
    /// Remove the symlink at `target`
    LinkDelete { target: FilePath },
    /// Create `path` and any missing parents, mode 0755
    DirCreate { path: FilePath },
    /// Remove `path`; it must be empty (sequencing comes from the graph)
    DirDelete { path: FilePath },
    /// Rename `source` to `dest`
    FileMove { source: FilePath, dest: FilePath },
    /// Copy the bytes of `source` to `backup`, mode 0644
    ///
    /// The whole file is read into memory; large files are out of scope.
    FileBackup { source: FilePath, backup: FilePath },
}

/// A single planned filesystem mutation
#[derive(Debug, Clone, Serialize)]
pub struct Operation {
    id: OperationId,
    #[serde(flatten)]
    kind: OperationKind,
    depends_on: Vec<OperationId>,
}

impl Operation {
    fn new(kind: OperationKind) -> Self {
        Self {
            id: OperationId::generate(),
            kind,
            depends_on: Vec::new(),
        }
    }

    pub fn link_create(source: FilePath, target: FilePath) -> Self {
        Self::new(OperationKind::LinkCreate { source, target })
    }

    pub fn link_delete(target: FilePath) -> Self {
        Self::new(OperationKind::LinkDelete { target })
    }

    pub fn dir_create(path: FilePath) -> Self {
        Self::new(OperationKind::DirCreate { path })
    }

    pub fn dir_delete(path: FilePath) -> Self {
        Self::new(OperationKind::DirDelete { path })
    }

    pub fn file_move(source: FilePath, dest: FilePath) -> Self {
        Self::new(OperationKind::FileMove { source, dest })
    }

    pub fn file_backup(source: FilePath, backup: FilePath) -> Self {
        Self::new(OperationKind::FileBackup { source, backup })
    }

    /// Add a dependency edge: `dep` must execute before this operation
    pub fn with_dependency(mut self, dep: OperationId) -> Self {
        self.depends_on.push(dep);
        self
    }

    /// Replace the dependency list
    pub fn with_dependencies(mut self, deps: Vec<OperationId>) -> Self {
        self.depends_on = deps;
        self
    }

    pub fn id(&self) -> &OperationId {
        &self.id
    }

    pub fn kind(&self) -> &OperationKind {
        &self.kind
    }

    /// Ids of operations that must execute first
    pub fn dependencies(&self) -> &[OperationId] {
        &self.depends_on
    }

    /// Semantic equality: same effect, ignoring id and ordering edges
    pub fn same_effect(&self, other: &Operation) -> bool {
        self.kind == other.kind
    }

    /// Pure precondition check; must pass before `execute`
    pub fn validate(&self) -> Result<()> {
        match &self.kind {
            OperationKind::LinkCreate { source, target } if source == target => Err(
                Error::InvalidOperation(format!("link source equals target: {source}")),
            ),
            OperationKind::FileMove { source, dest } if source == dest => Err(
                Error::InvalidOperation(format!("move source equals destination: {source}")),
            ),
            OperationKind::FileBackup { source, backup } if source == backup => Err(
                Error::InvalidOperation(format!("backup path equals source: {source}")),
            ),
            _ => Ok(()),
        }
    }

    /// Apply the operation through the filesystem port
    pub fn execute(&self, fs: &dyn Filesystem, cancel: &CancelToken) -> Result<()> {
        match &self.kind {
            OperationKind::LinkCreate { source, target } => {
                fs.symlink(cancel, source.as_path(), target.as_path())
            }
            OperationKind::LinkDelete { target } => fs.remove(cancel, target.as_path()),
            OperationKind::DirCreate { path } => fs.mkdir_all(cancel, path.as_path(), 0o755),
            OperationKind::DirDelete { path } => fs.remove(cancel, path.as_path()),
            OperationKind::FileMove { source, dest } => {
                fs.rename(cancel, source.as_path(), dest.as_path())
            }
            OperationKind::FileBackup { source, backup } => {
                let data = fs.read_file(cancel, source.as_path())?;
                fs.write_file(cancel, backup.as_path(), &data, 0o644)
            }
        }
    }

    /// Best-effort inverse of `execute`
    pub fn rollback(&self, fs: &dyn Filesystem, cancel: &CancelToken) -> Result<()> {
        match &self.kind {
            OperationKind::LinkCreate { target, .. } => fs.remove(cancel, target.as_path()),
            // The pre-deletion link target is not retained, so there is
            // nothing to restore here.
            OperationKind::LinkDelete { .. } => Ok(()),
            OperationKind::DirCreate { path } => {
                if let Err(e) = fs.remove(cancel, path.as_path()) {
                    log::debug!("leaving {path} in place during rollback: {e}");
                }
                Ok(())
            }
            OperationKind::DirDelete { path } => fs.mkdir(cancel, path.as_path(), 0o755),
            OperationKind::FileMove { source, dest } => {
                fs.rename(cancel, dest.as_path(), source.as_path())
            }
            OperationKind::FileBackup { backup, .. } => fs.remove(cancel, backup.as_path()),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            OperationKind::LinkCreate { source, target } => {
                write!(f, "link {target} -> {source}")
            }
            OperationKind::LinkDelete { target } => write!(f, "unlink {target}"),
            OperationKind::DirCreate { path } => write!(f, "mkdir {path}"),
            OperationKind::DirDelete { path } => write!(f, "rmdir {path}"),
            OperationKind::FileMove { source, dest } => write!(f, "move {source} -> {dest}"),
            OperationKind::FileBackup { source, backup } => {
                write!(f, "backup {source} -> {backup}")
            }
        }
    }
}
