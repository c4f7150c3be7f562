// src/filesystem/os.rs

//! Host filesystem adapter
//!
//! Thin mapping from the port onto `std::fs`, translating `NotFound` and
//! `PermissionDenied` into their identity-matchable error kinds.

use super::{DirEntry, EntryKind, FileInfo, Filesystem};
use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use std::fs;
use std::io::ErrorKind;
use std::os::unix::fs::{DirBuilderExt, PermissionsExt};
use std::path::{Path, PathBuf};

/// Adapter over the real filesystem
#[derive(Debug, Default, Clone)]
pub struct OsFilesystem;

impl OsFilesystem {
    pub fn new() -> Self {
        Self
    }
}

fn map_io(err: std::io::Error, path: &Path, operation: &str) -> Error {
    match err.kind() {
        ErrorKind::NotFound => Error::NotFound {
            path: path.to_path_buf(),
        },
        ErrorKind::PermissionDenied => Error::PermissionDenied {
            path: path.to_path_buf(),
            operation: operation.to_string(),
        },
        _ => Error::Io(err),
    }
}

impl Filesystem for OsFilesystem {
    fn stat(&self, cancel: &CancelToken, path: &Path) -> Result<FileInfo> {
        cancel.check("stat")?;
        let meta = fs::symlink_metadata(path).map_err(|e| map_io(e, path, "stat"))?;
        Ok(FileInfo {
            size: meta.len(),
            mode: meta.permissions().mode() & 0o7777,
        })
    }

    fn read_dir(&self, cancel: &CancelToken, path: &Path) -> Result<Vec<DirEntry>> {
        cancel.check("read_dir")?;
        let mut entries = Vec::new();
        for entry in fs::read_dir(path).map_err(|e| map_io(e, path, "read_dir"))? {
            let entry = entry.map_err(|e| map_io(e, path, "read_dir"))?;
            let file_type = entry.file_type().map_err(|e| map_io(e, path, "read_dir"))?;
            let kind = if file_type.is_symlink() {
                EntryKind::Symlink
            } else if file_type.is_dir() {
                EntryKind::Dir
            } else {
                EntryKind::File
            };
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                kind,
            });
        }
        Ok(entries)
    }

    fn read_link(&self, cancel: &CancelToken, path: &Path) -> Result<PathBuf> {
        cancel.check("read_link")?;
        fs::read_link(path).map_err(|e| map_io(e, path, "read_link"))
    }

    fn read_file(&self, cancel: &CancelToken, path: &Path) -> Result<Vec<u8>> {
        cancel.check("read_file")?;
        fs::read(path).map_err(|e| map_io(e, path, "read_file"))
    }

    fn write_file(&self, cancel: &CancelToken, path: &Path, data: &[u8], mode: u32) -> Result<()> {
        cancel.check("write_file")?;
        fs::write(path, data).map_err(|e| map_io(e, path, "write_file"))?;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))
            .map_err(|e| map_io(e, path, "write_file"))
    }

    fn mkdir(&self, cancel: &CancelToken, path: &Path, mode: u32) -> Result<()> {
        cancel.check("mkdir")?;
        fs::DirBuilder::new()
            .mode(mode)
            .create(path)
            .map_err(|e| map_io(e, path, "mkdir"))
    }

    fn mkdir_all(&self, cancel: &CancelToken, path: &Path, mode: u32) -> Result<()> {
        cancel.check("mkdir_all")?;
        fs::DirBuilder::new()
            .recursive(true)
            .mode(mode)
            .create(path)
            .map_err(|e| map_io(e, path, "mkdir_all"))
    }

    fn remove(&self, cancel: &CancelToken, path: &Path) -> Result<()> {
        cancel.check("remove")?;
        let meta = fs::symlink_metadata(path).map_err(|e| map_io(e, path, "remove"))?;
        if meta.is_dir() {
            fs::remove_dir(path).map_err(|e| map_io(e, path, "remove"))
        } else {
            fs::remove_file(path).map_err(|e| map_io(e, path, "remove"))
        }
    }

    fn remove_all(&self, cancel: &CancelToken, path: &Path) -> Result<()> {
        cancel.check("remove_all")?;
        let meta = fs::symlink_metadata(path).map_err(|e| map_io(e, path, "remove_all"))?;
        if meta.is_dir() && !meta.is_symlink() {
            fs::remove_dir_all(path).map_err(|e| map_io(e, path, "remove_all"))
        } else {
            fs::remove_file(path).map_err(|e| map_io(e, path, "remove_all"))
        }
    }

    fn symlink(&self, cancel: &CancelToken, source: &Path, target: &Path) -> Result<()> {
        cancel.check("symlink")?;
        std::os::unix::fs::symlink(source, target).map_err(|e| map_io(e, target, "symlink"))
    }

    fn rename(&self, cancel: &CancelToken, old: &Path, new: &Path) -> Result<()> {
        cancel.check("rename")?;
        fs::rename(old, new).map_err(|e| map_io(e, old, "rename"))
    }

    fn exists(&self, cancel: &CancelToken, path: &Path) -> bool {
        if cancel.is_cancelled() {
            return false;
        }
        fs::symlink_metadata(path).is_ok()
    }

    fn is_dir(&self, cancel: &CancelToken, path: &Path) -> Result<bool> {
        cancel.check("is_dir")?;
        match fs::symlink_metadata(path) {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(map_io(e, path, "is_dir")),
        }
    }

    fn is_symlink(&self, cancel: &CancelToken, path: &Path) -> Result<bool> {
        cancel.check("is_symlink")?;
        match fs::symlink_metadata(path) {
            Ok(meta) => Ok(meta.file_type().is_symlink()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(map_io(e, path, "is_symlink")),
        }
    }
}
