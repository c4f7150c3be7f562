// src/filesystem/mod.rs

//! Filesystem port
//!
//! The planning core never touches the disk directly: the scanner and the
//! executor go through this trait, supplied by the caller. Every method
//! takes the cancellation token and is expected to honor it. Missing paths
//! surface as `Error::NotFound` so callers can treat "no file" as "empty"
//! (the manifest store relies on this).
//!
//! `is_dir` and `is_symlink` return `Ok(false)` for paths that do not
//! exist; probing is how the resolver builds its current-state snapshot.

mod memory;
mod os;

pub use memory::MemoryFilesystem;
pub use os::OsFilesystem;

use crate::cancel::CancelToken;
use crate::error::Result;
use std::path::{Path, PathBuf};

/// Kind of a directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
}

/// A single entry returned by `read_dir`
#[derive(Debug, Clone)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
}

/// Size and permissions of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileInfo {
    pub size: u64,
    pub mode: u32,
}

/// Blocking filesystem access used by the scanner and the executor
pub trait Filesystem {
    /// Size and mode of a file, without following symlinks
    fn stat(&self, cancel: &CancelToken, path: &Path) -> Result<FileInfo>;

    /// Directory entries in the underlying order, stable per call
    fn read_dir(&self, cancel: &CancelToken, path: &Path) -> Result<Vec<DirEntry>>;

    /// Target of a symlink
    fn read_link(&self, cancel: &CancelToken, path: &Path) -> Result<PathBuf>;

    /// Whole file contents
    fn read_file(&self, cancel: &CancelToken, path: &Path) -> Result<Vec<u8>>;

    /// Write a file with the given mode, replacing any existing content
    fn write_file(&self, cancel: &CancelToken, path: &Path, data: &[u8], mode: u32) -> Result<()>;

    /// Create a single directory; the parent must exist
    fn mkdir(&self, cancel: &CancelToken, path: &Path, mode: u32) -> Result<()>;

    /// Create a directory and any missing parents
    fn mkdir_all(&self, cancel: &CancelToken, path: &Path, mode: u32) -> Result<()>;

    /// Remove a file, symlink, or empty directory
    fn remove(&self, cancel: &CancelToken, path: &Path) -> Result<()>;

    /// Remove a path recursively
    fn remove_all(&self, cancel: &CancelToken, path: &Path) -> Result<()>;

    /// Create a symlink at `target` pointing to `source`
    fn symlink(&self, cancel: &CancelToken, source: &Path, target: &Path) -> Result<()>;

    /// Rename `old` to `new`
    fn rename(&self, cancel: &CancelToken, old: &Path, new: &Path) -> Result<()>;

    /// True if the path exists (without following a final symlink)
    fn exists(&self, cancel: &CancelToken, path: &Path) -> bool;

    /// True if the path exists and is a directory
    fn is_dir(&self, cancel: &CancelToken, path: &Path) -> Result<bool>;

    /// True if the path exists and is a symlink
    fn is_symlink(&self, cancel: &CancelToken, path: &Path) -> Result<bool>;
}
