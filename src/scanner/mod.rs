// src/scanner/mod.rs

//! Package tree scanning
//!
//! Builds an in-memory tree of a package directory through the filesystem
//! port, pruning ignored entries structurally. Symlinks inside packages
//! are leaves; directory children keep the order `read_dir` returned so
//! plans are reproducible across runs.

pub mod dotfile;

use crate::cancel::CancelToken;
use crate::error::{Error, Result, ResultExt};
use crate::filesystem::Filesystem;
use crate::ignore::IgnoreSet;
use crate::path::{FilePath, PackagePath};
use std::path::{Path, PathBuf};

/// Kind of a scanned tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Dir,
    Symlink,
}

/// A node in a scanned package tree
#[derive(Debug, Clone)]
pub struct Node {
    pub path: FilePath,
    pub kind: NodeKind,
    /// Ordered children; empty for files and symlinks
    pub children: Vec<Node>,
}

impl Node {
    fn leaf(path: FilePath, kind: NodeKind) -> Self {
        Self {
            path,
            kind,
            children: Vec::new(),
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Dir
    }
}

/// A scanned package: a named directory tree under the package root
#[derive(Debug, Clone)]
pub struct Package {
    pub name: String,
    pub path: PackagePath,
    pub tree: Option<Node>,
}

impl Package {
    /// All file nodes of the package tree, in scan order
    pub fn files(&self) -> Vec<&Node> {
        self.tree.as_ref().map(collect_files).unwrap_or_default()
    }
}

/// Recursively scan `path` into a tree.
///
/// Classification asks `is_symlink` first so links to directories stay
/// leaves, then `is_dir`. The cancellation token is checked before each
/// directory read and before each recursive child.
pub fn scan_tree(fs: &dyn Filesystem, cancel: &CancelToken, path: &FilePath) -> Result<Node> {
    if fs
        .is_symlink(cancel, path.as_path())
        .with_context(|| format!("classifying {path}"))?
    {
        return Ok(Node::leaf(path.clone(), NodeKind::Symlink));
    }
    if !fs
        .is_dir(cancel, path.as_path())
        .with_context(|| format!("classifying {path}"))?
    {
        return Ok(Node::leaf(path.clone(), NodeKind::File));
    }

    cancel.check("scan")?;
    let entries = fs
        .read_dir(cancel, path.as_path())
        .with_context(|| format!("reading {path}"))?;

    let mut children = Vec::with_capacity(entries.len());
    for entry in entries {
        cancel.check("scan")?;
        children.push(scan_tree(fs, cancel, &path.join(&entry.name))?);
    }
    Ok(Node {
        path: path.clone(),
        kind: NodeKind::Dir,
        children,
    })
}

/// Scan one package by name, pruning ignored entries
pub fn scan_package(
    fs: &dyn Filesystem,
    cancel: &CancelToken,
    path: &PackagePath,
    name: &str,
    ignore: &IgnoreSet,
) -> Result<Package> {
    if name.is_empty() {
        return Err(Error::InvalidOperation(
            "package name must be non-empty".to_string(),
        ));
    }
    if !fs.exists(cancel, path.as_path()) {
        return Err(Error::PackageNotFound {
            package: name.to_string(),
        });
    }

    let tree = scan_tree(fs, cancel, &path.as_file_path())
        .with_context(|| format!("scanning package {name}"))?;
    log::debug!("scanned package {name}: {} nodes", count_nodes(&tree));

    Ok(Package {
        name: name.to_string(),
        path: path.clone(),
        tree: filter_tree(tree, ignore),
    })
}

/// Drop every node whose path matches the ignore set, along with its
/// descendants. Pruning is structural: siblings are unaffected.
pub fn filter_tree(node: Node, ignore: &IgnoreSet) -> Option<Node> {
    if ignore.should_ignore(node.path.as_path()) {
        return None;
    }
    let Node {
        path,
        kind,
        children,
    } = node;
    Some(Node {
        path,
        kind,
        children: children
            .into_iter()
            .filter_map(|child| filter_tree(child, ignore))
            .collect(),
    })
}

/// Pre-order depth-first visit; stops at the first error
pub fn walk<F>(node: &Node, f: &mut F) -> Result<()>
where
    F: FnMut(&Node) -> Result<()>,
{
    f(node)?;
    for child in &node.children {
        walk(child, f)?;
    }
    Ok(())
}

/// File nodes of the tree, in pre-order
pub fn collect_files(node: &Node) -> Vec<&Node> {
    let mut files = Vec::new();
    collect_files_into(node, &mut files);
    files
}

fn collect_files_into<'a>(node: &'a Node, out: &mut Vec<&'a Node>) {
    if node.is_file() {
        out.push(node);
    }
    for child in &node.children {
        collect_files_into(child, out);
    }
}

/// Total number of nodes in the tree
pub fn count_nodes(node: &Node) -> usize {
    1 + node.children.iter().map(count_nodes).sum::<usize>()
}

/// Path of `target` relative to `base`
pub fn relative_path(base: &Path, target: &Path) -> Result<PathBuf> {
    target
        .strip_prefix(base)
        .map(Path::to_path_buf)
        .map_err(|_| Error::InvalidPath {
            path: target.display().to_string(),
            reason: format!("not under {}", base.display()),
        })
}
