// src/planner.rs

//! Desired-state computation
//!
//! Walks scanned package trees and produces the set of links and implied
//! parent directories that would make the target directory reflect the
//! packages. Only files become links; directories in a package appear
//! solely as implied parents, and symlinks inside packages are not
//! surfaced at all.

use crate::error::Result;
use crate::operation::{Operation, OperationId};
use crate::path::{FilePath, TargetPath};
use crate::scanner::dotfile::translate_path;
use crate::scanner::{relative_path, Package};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A desired symlink: `target` in the target tree pointing at `source`
/// in a package tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSpec {
    pub source: FilePath,
    pub target: FilePath,
}

/// A desired parent directory in the target tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirSpec {
    pub path: FilePath,
}

/// Desired links and directories, keyed by target path
///
/// Sorted maps keep iteration deterministic; the key is the target path,
/// so a parent directory always iterates before anything beneath it.
#[derive(Debug, Clone, Default)]
pub struct DesiredState {
    links: BTreeMap<PathBuf, LinkSpec>,
    dirs: BTreeMap<PathBuf, DirSpec>,
}

impl DesiredState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a link spec keyed by its target. Last writer wins; the
    /// displaced spec is returned so the caller can surface the clash.
    pub fn insert_link(&mut self, spec: LinkSpec) -> Option<LinkSpec> {
        self.links.insert(spec.target.as_path().to_path_buf(), spec)
    }

    /// Insert a dir spec; idempotent on repeats
    pub fn insert_dir(&mut self, spec: DirSpec) {
        self.dirs.entry(spec.path.as_path().to_path_buf()).or_insert(spec);
    }

    pub fn links(&self) -> impl Iterator<Item = &LinkSpec> {
        self.links.values()
    }

    pub fn dirs(&self) -> impl Iterator<Item = &DirSpec> {
        self.dirs.values()
    }

    pub fn link_targets(&self) -> impl Iterator<Item = &Path> {
        self.links.keys().map(PathBuf::as_path)
    }

    pub fn dir_paths(&self) -> impl Iterator<Item = &Path> {
        self.dirs.keys().map(PathBuf::as_path)
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn dir_count(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty() && self.dirs.is_empty()
    }
}

/// Compute the desired state for a set of scanned packages.
///
/// For each file in each package tree: take its path relative to the
/// package root, translate the basename (`dot-` prefix), join onto the
/// target root, and record a link spec plus dir specs for every
/// intermediate directory strictly below the target root.
pub fn compute_desired_state(
    packages: &[Package],
    target_root: &TargetPath,
) -> Result<DesiredState> {
    let mut desired = DesiredState::new();

    for package in packages {
        for node in package.files() {
            let rel = relative_path(package.path.as_path(), node.path.as_path())?;
            let target = target_root.join(translate_path(&rel));

            record_parent_dirs(&mut desired, &target, target_root);
            let displaced = desired.insert_link(LinkSpec {
                source: node.path.clone(),
                target,
            });
            if let Some(old) = displaced {
                log::warn!(
                    "target {} claimed by multiple packages; {} replaces {}",
                    old.target,
                    node.path,
                    old.source
                );
            }
        }
    }

    Ok(desired)
}

/// Record a dir spec for every directory strictly between `target` and
/// the target root
fn record_parent_dirs(desired: &mut DesiredState, target: &FilePath, target_root: &TargetPath) {
    let mut current = target.as_path().parent();
    while let Some(dir) = current {
        if dir == target_root.as_path() || dir.as_os_str().is_empty() {
            break;
        }
        desired.insert_dir(DirSpec {
            path: FilePath::new(dir).expect("parent of a validated path is valid"),
        });
        current = dir.parent();
    }
}

/// Emit operations realizing the desired state: directory creations
/// first, then link creations, each link depending on its parent
/// directory chain. Actual execution order comes from the dependency
/// graph, not from this list.
pub fn operations_from_desired_state(desired: &DesiredState) -> Vec<Operation> {
    let mut operations = Vec::with_capacity(desired.dir_count() + desired.link_count());
    let mut dir_ops: BTreeMap<PathBuf, OperationId> = BTreeMap::new();

    for spec in desired.dirs() {
        let mut op = Operation::dir_create(spec.path.clone());
        if let Some(parent) = spec.path.as_path().parent() {
            if let Some(parent_id) = dir_ops.get(parent) {
                op = op.with_dependency(parent_id.clone());
            }
        }
        dir_ops.insert(spec.path.as_path().to_path_buf(), op.id().clone());
        operations.push(op);
    }

    for spec in desired.links() {
        let mut op = Operation::link_create(spec.source.clone(), spec.target.clone());
        if let Some(parent) = spec.target.as_path().parent() {
            if let Some(parent_id) = dir_ops.get(parent) {
                op = op.with_dependency(parent_id.clone());
            }
        }
        operations.push(op);
    }

    operations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelToken;
    use crate::filesystem::MemoryFilesystem;
    use crate::ignore::IgnoreSet;
    use crate::operation::OperationKind;
    use crate::path::PackagePath;
    use crate::scanner::scan_package;

    fn scan_fixture(fs: &MemoryFilesystem, name: &str) -> Package {
        let cancel = CancelToken::new();
        let path = PackagePath::new(format!("/pkgs/{name}")).unwrap();
        scan_package(fs, &cancel, &path, name, &IgnoreSet::default()).unwrap()
    }

    #[test]
    fn test_single_dotfile_translates_basename() {
        let fs = MemoryFilesystem::new();
        fs.add_file("/pkgs/vim/dot-vimrc", b"");
        let pkg = scan_fixture(&fs, "vim");
        let target_root = TargetPath::new("/home/u").unwrap();

        let desired = compute_desired_state(&[pkg], &target_root).unwrap();
        assert_eq!(desired.link_count(), 1);
        assert_eq!(desired.dir_count(), 0);

        let spec = desired.links().next().unwrap();
        assert_eq!(spec.source.as_path(), Path::new("/pkgs/vim/dot-vimrc"));
        assert_eq!(spec.target.as_path(), Path::new("/home/u/.vimrc"));
    }

    #[test]
    fn test_nested_file_implies_parent_dirs() {
        let fs = MemoryFilesystem::new();
        fs.add_file("/pkgs/nvim/config/nvim/init.lua", b"");
        let pkg = scan_fixture(&fs, "nvim");
        let target_root = TargetPath::new("/home/u").unwrap();

        let desired = compute_desired_state(&[pkg], &target_root).unwrap();
        let dirs: Vec<&Path> = desired.dir_paths().collect();
        assert_eq!(
            dirs,
            vec![Path::new("/home/u/config"), Path::new("/home/u/config/nvim")]
        );
        let spec = desired.links().next().unwrap();
        assert_eq!(
            spec.target.as_path(),
            Path::new("/home/u/config/nvim/init.lua")
        );
    }

    #[test]
    fn test_translation_applies_to_basename_only() {
        let fs = MemoryFilesystem::new();
        fs.add_file("/pkgs/git/dot-config/git/dot-gitconfig", b"");
        let pkg = scan_fixture(&fs, "git");
        let target_root = TargetPath::new("/home/u").unwrap();

        let desired = compute_desired_state(&[pkg], &target_root).unwrap();
        // The `dot-config` directory component is not rewritten; only the
        // final `dot-gitconfig` basename is.
        let spec = desired.links().next().unwrap();
        assert_eq!(
            spec.target.as_path(),
            Path::new("/home/u/dot-config/git/.gitconfig")
        );
    }

    #[test]
    fn test_directories_and_symlinks_are_not_link_specs() {
        let fs = MemoryFilesystem::new();
        fs.add_file("/pkgs/vim/colors/desert.vim", b"");
        fs.add_symlink("/pkgs/vim/linked", "/elsewhere");
        let pkg = scan_fixture(&fs, "vim");
        let target_root = TargetPath::new("/home/u").unwrap();

        let desired = compute_desired_state(&[pkg], &target_root).unwrap();
        assert_eq!(desired.link_count(), 1);
        let targets: Vec<&Path> = desired.link_targets().collect();
        assert_eq!(targets, vec![Path::new("/home/u/colors/desert.vim")]);
    }

    #[test]
    fn test_duplicate_target_last_writer_wins() {
        let fs = MemoryFilesystem::new();
        fs.add_file("/pkgs/a/dot-profile", b"a");
        fs.add_file("/pkgs/b/dot-profile", b"b");
        let a = scan_fixture(&fs, "a");
        let b = scan_fixture(&fs, "b");
        let target_root = TargetPath::new("/home/u").unwrap();

        let desired = compute_desired_state(&[a, b], &target_root).unwrap();
        assert_eq!(desired.link_count(), 1);
        let spec = desired.links().next().unwrap();
        assert_eq!(spec.source.as_path(), Path::new("/pkgs/b/dot-profile"));
    }

    #[test]
    fn test_operations_carry_parent_dir_dependencies() {
        let fs = MemoryFilesystem::new();
        fs.add_file("/pkgs/nvim/config/nvim/init.lua", b"");
        let pkg = scan_fixture(&fs, "nvim");
        let target_root = TargetPath::new("/home/u").unwrap();
        let desired = compute_desired_state(&[pkg], &target_root).unwrap();

        let ops = operations_from_desired_state(&desired);
        assert_eq!(ops.len(), 3);

        let outer = &ops[0];
        let inner = &ops[1];
        let link = &ops[2];
        assert!(matches!(outer.kind(), OperationKind::DirCreate { path } if path.as_path() == Path::new("/home/u/config")));
        assert!(matches!(inner.kind(), OperationKind::DirCreate { path } if path.as_path() == Path::new("/home/u/config/nvim")));
        assert!(matches!(link.kind(), OperationKind::LinkCreate { .. }));

        assert!(outer.dependencies().is_empty());
        assert_eq!(inner.dependencies(), &[outer.id().clone()]);
        assert_eq!(link.dependencies(), &[inner.id().clone()]);
    }

    #[test]
    fn test_empty_desired_state_emits_nothing() {
        let desired = DesiredState::new();
        assert!(operations_from_desired_state(&desired).is_empty());
    }
}
