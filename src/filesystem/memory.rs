// src/filesystem/memory.rs

//! In-memory filesystem
//!
//! Backs the test suites and any caller that wants to plan against a
//! synthetic snapshot. Nodes live in a sorted map keyed by absolute path,
//! so `read_dir` order is deterministic across runs.

use super::{DirEntry, EntryKind, FileInfo, Filesystem};
use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Clone)]
enum MemNode {
    File { data: Vec<u8>, mode: u32 },
    Dir { mode: u32 },
    Symlink { target: PathBuf },
}

/// A synthetic filesystem rooted at `/`
#[derive(Debug, Default)]
pub struct MemoryFilesystem {
    nodes: Mutex<BTreeMap<PathBuf, MemNode>>,
}

impl MemoryFilesystem {
    /// An empty filesystem containing only the root directory
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(PathBuf::from("/"), MemNode::Dir { mode: 0o755 });
        Self {
            nodes: Mutex::new(nodes),
        }
    }

    /// Insert a file, creating missing parent directories
    pub fn add_file(&self, path: impl AsRef<Path>, data: &[u8]) {
        self.add_file_with_mode(path, data, 0o644);
    }

    /// Insert a file with an explicit mode, creating missing parents
    pub fn add_file_with_mode(&self, path: impl AsRef<Path>, data: &[u8], mode: u32) {
        let path = path.as_ref().to_path_buf();
        let mut nodes = self.nodes.lock().unwrap();
        Self::ensure_parents(&mut nodes, &path);
        nodes.insert(
            path,
            MemNode::File {
                data: data.to_vec(),
                mode,
            },
        );
    }

    /// Insert a directory, creating missing parents
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        let mut nodes = self.nodes.lock().unwrap();
        Self::ensure_parents(&mut nodes, &path);
        nodes.insert(path, MemNode::Dir { mode: 0o755 });
    }

    /// Insert a symlink at `path` pointing to `target`, creating parents
    pub fn add_symlink(&self, path: impl AsRef<Path>, target: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        let mut nodes = self.nodes.lock().unwrap();
        Self::ensure_parents(&mut nodes, &path);
        nodes.insert(
            path,
            MemNode::Symlink {
                target: target.as_ref().to_path_buf(),
            },
        );
    }

    fn ensure_parents(nodes: &mut BTreeMap<PathBuf, MemNode>, path: &Path) {
        let mut chain = Vec::new();
        let mut current = path.parent();
        while let Some(dir) = current {
            if dir.as_os_str().is_empty() || nodes.contains_key(dir) {
                break;
            }
            chain.push(dir.to_path_buf());
            current = dir.parent();
        }
        for dir in chain.into_iter().rev() {
            nodes.insert(dir, MemNode::Dir { mode: 0o755 });
        }
    }

    fn children_of(nodes: &BTreeMap<PathBuf, MemNode>, path: &Path) -> Vec<PathBuf> {
        nodes
            .keys()
            .filter(|p| p.parent() == Some(path))
            .cloned()
            .collect()
    }
}

impl Filesystem for MemoryFilesystem {
    fn stat(&self, cancel: &CancelToken, path: &Path) -> Result<FileInfo> {
        cancel.check("stat")?;
        let nodes = self.nodes.lock().unwrap();
        match nodes.get(path) {
            Some(MemNode::File { data, mode }) => Ok(FileInfo {
                size: data.len() as u64,
                mode: *mode,
            }),
            Some(MemNode::Dir { mode }) => Ok(FileInfo { size: 0, mode: *mode }),
            Some(MemNode::Symlink { target }) => Ok(FileInfo {
                size: target.as_os_str().len() as u64,
                mode: 0o777,
            }),
            None => Err(Error::NotFound {
                path: path.to_path_buf(),
            }),
        }
    }

    fn read_dir(&self, cancel: &CancelToken, path: &Path) -> Result<Vec<DirEntry>> {
        cancel.check("read_dir")?;
        let nodes = self.nodes.lock().unwrap();
        match nodes.get(path) {
            Some(MemNode::Dir { .. }) => {}
            Some(_) => {
                return Err(Error::InvalidPath {
                    path: path.display().to_string(),
                    reason: "not a directory".to_string(),
                })
            }
            None => {
                return Err(Error::NotFound {
                    path: path.to_path_buf(),
                })
            }
        }
        Ok(Self::children_of(&nodes, path)
            .into_iter()
            .map(|child| {
                let kind = match nodes.get(&child) {
                    Some(MemNode::Dir { .. }) => EntryKind::Dir,
                    Some(MemNode::Symlink { .. }) => EntryKind::Symlink,
                    _ => EntryKind::File,
                };
                DirEntry {
                    name: child
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    kind,
                }
            })
            .collect())
    }

    fn read_link(&self, cancel: &CancelToken, path: &Path) -> Result<PathBuf> {
        cancel.check("read_link")?;
        let nodes = self.nodes.lock().unwrap();
        match nodes.get(path) {
            Some(MemNode::Symlink { target }) => Ok(target.clone()),
            Some(_) => Err(Error::InvalidPath {
                path: path.display().to_string(),
                reason: "not a symlink".to_string(),
            }),
            None => Err(Error::NotFound {
                path: path.to_path_buf(),
            }),
        }
    }

    fn read_file(&self, cancel: &CancelToken, path: &Path) -> Result<Vec<u8>> {
        cancel.check("read_file")?;
        let nodes = self.nodes.lock().unwrap();
        match nodes.get(path) {
            Some(MemNode::File { data, .. }) => Ok(data.clone()),
            Some(_) => Err(Error::InvalidPath {
                path: path.display().to_string(),
                reason: "not a regular file".to_string(),
            }),
            None => Err(Error::NotFound {
                path: path.to_path_buf(),
            }),
        }
    }

    fn write_file(&self, cancel: &CancelToken, path: &Path, data: &[u8], mode: u32) -> Result<()> {
        cancel.check("write_file")?;
        let mut nodes = self.nodes.lock().unwrap();
        match path.parent() {
            Some(parent) if matches!(nodes.get(parent), Some(MemNode::Dir { .. })) => {}
            Some(parent) => {
                return Err(Error::NotFound {
                    path: parent.to_path_buf(),
                })
            }
            None => {
                return Err(Error::InvalidPath {
                    path: path.display().to_string(),
                    reason: "cannot write to root".to_string(),
                })
            }
        }
        nodes.insert(
            path.to_path_buf(),
            MemNode::File {
                data: data.to_vec(),
                mode,
            },
        );
        Ok(())
    }

    fn mkdir(&self, cancel: &CancelToken, path: &Path, mode: u32) -> Result<()> {
        cancel.check("mkdir")?;
        let mut nodes = self.nodes.lock().unwrap();
        if nodes.contains_key(path) {
            return Err(Error::InvalidPath {
                path: path.display().to_string(),
                reason: "already exists".to_string(),
            });
        }
        match path.parent() {
            Some(parent) if matches!(nodes.get(parent), Some(MemNode::Dir { .. })) => {}
            _ => {
                return Err(Error::NotFound {
                    path: path.to_path_buf(),
                })
            }
        }
        nodes.insert(path.to_path_buf(), MemNode::Dir { mode });
        Ok(())
    }

    fn mkdir_all(&self, cancel: &CancelToken, path: &Path, mode: u32) -> Result<()> {
        cancel.check("mkdir_all")?;
        let mut nodes = self.nodes.lock().unwrap();
        match nodes.get(path) {
            Some(MemNode::Dir { .. }) => return Ok(()),
            Some(_) => {
                return Err(Error::InvalidPath {
                    path: path.display().to_string(),
                    reason: "exists and is not a directory".to_string(),
                })
            }
            None => {}
        }
        Self::ensure_parents(&mut nodes, path);
        nodes.insert(path.to_path_buf(), MemNode::Dir { mode });
        Ok(())
    }

    fn remove(&self, cancel: &CancelToken, path: &Path) -> Result<()> {
        cancel.check("remove")?;
        let mut nodes = self.nodes.lock().unwrap();
        match nodes.get(path) {
            Some(MemNode::Dir { .. }) => {
                if !Self::children_of(&nodes, path).is_empty() {
                    return Err(Error::InvalidPath {
                        path: path.display().to_string(),
                        reason: "directory not empty".to_string(),
                    });
                }
            }
            Some(_) => {}
            None => {
                return Err(Error::NotFound {
                    path: path.to_path_buf(),
                })
            }
        }
        nodes.remove(path);
        Ok(())
    }

    fn remove_all(&self, cancel: &CancelToken, path: &Path) -> Result<()> {
        cancel.check("remove_all")?;
        let mut nodes = self.nodes.lock().unwrap();
        if !nodes.contains_key(path) {
            return Err(Error::NotFound {
                path: path.to_path_buf(),
            });
        }
        nodes.retain(|p, _| p != path && !p.starts_with(path));
        Ok(())
    }

    fn symlink(&self, cancel: &CancelToken, source: &Path, target: &Path) -> Result<()> {
        cancel.check("symlink")?;
        let mut nodes = self.nodes.lock().unwrap();
        if nodes.contains_key(target) {
            return Err(Error::InvalidPath {
                path: target.display().to_string(),
                reason: "already exists".to_string(),
            });
        }
        match target.parent() {
            Some(parent) if matches!(nodes.get(parent), Some(MemNode::Dir { .. })) => {}
            _ => {
                return Err(Error::NotFound {
                    path: target.to_path_buf(),
                })
            }
        }
        nodes.insert(
            target.to_path_buf(),
            MemNode::Symlink {
                target: source.to_path_buf(),
            },
        );
        Ok(())
    }

    fn rename(&self, cancel: &CancelToken, old: &Path, new: &Path) -> Result<()> {
        cancel.check("rename")?;
        let mut nodes = self.nodes.lock().unwrap();
        let moved: Vec<(PathBuf, MemNode)> = nodes
            .iter()
            .filter(|(p, _)| *p == old || p.starts_with(old))
            .map(|(p, n)| (p.clone(), n.clone()))
            .collect();
        if moved.is_empty() {
            return Err(Error::NotFound {
                path: old.to_path_buf(),
            });
        }
        for (p, _) in &moved {
            nodes.remove(p);
        }
        for (p, node) in moved {
            let suffix = p.strip_prefix(old).expect("subtree path under old root");
            let dest = if suffix.as_os_str().is_empty() {
                new.to_path_buf()
            } else {
                new.join(suffix)
            };
            nodes.insert(dest, node);
        }
        Ok(())
    }

    fn exists(&self, cancel: &CancelToken, path: &Path) -> bool {
        if cancel.is_cancelled() {
            return false;
        }
        self.nodes.lock().unwrap().contains_key(path)
    }

    fn is_dir(&self, cancel: &CancelToken, path: &Path) -> Result<bool> {
        cancel.check("is_dir")?;
        Ok(matches!(
            self.nodes.lock().unwrap().get(path),
            Some(MemNode::Dir { .. })
        ))
    }

    fn is_symlink(&self, cancel: &CancelToken, path: &Path) -> Result<bool> {
        cancel.check("is_symlink")?;
        Ok(matches!(
            self.nodes.lock().unwrap().get(path),
            Some(MemNode::Symlink { .. })
        ))
    }
}
