// tests/os_roundtrip.rs

//! Integration tests against the real filesystem.
//!
//! Drives the pipeline and executor through `OsFilesystem` inside a
//! temporary directory, then verifies the links on disk, the manifest
//! contents, and the rollback behavior the in-memory tests can only
//! approximate.

use dot::{
    plan_install, plan_uninstall, CancelToken, Executor, Filesystem, IgnoreSet, ManifestStore,
    OsFilesystem, PackagePath, PlanningContext, ResolutionPolicies, TargetPath,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

struct OsFixture {
    _tmp: TempDir,
    fs: OsFilesystem,
    cancel: CancelToken,
    package_root: PackagePath,
    target_root: TargetPath,
}

impl OsFixture {
    fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let pkgs = tmp.path().join("pkgs");
        let home = tmp.path().join("home");
        fs::create_dir_all(&pkgs).unwrap();
        fs::create_dir_all(&home).unwrap();

        Self {
            package_root: PackagePath::new(&pkgs).unwrap(),
            target_root: TargetPath::new(&home).unwrap(),
            _tmp: tmp,
            fs: OsFilesystem::new(),
            cancel: CancelToken::new(),
        }
    }

    fn add_package_file(&self, package: &str, rel: &str, content: &str) {
        let path = self.package_root.as_path().join(package).join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn context(&self) -> PlanningContext<'_> {
        PlanningContext {
            fs: &self.fs,
            cancel: &self.cancel,
            package_root: self.package_root.clone(),
            target_root: self.target_root.clone(),
            ignore: IgnoreSet::default(),
            policies: ResolutionPolicies::default(),
            backup_dir: None,
        }
    }

    fn target(&self, rel: &str) -> std::path::PathBuf {
        self.target_root.as_path().join(rel)
    }
}

#[test]
fn manage_then_unmanage_on_disk() {
    let fixture = OsFixture::new();
    fixture.add_package_file("vim", "dot-vimrc", "set nocompatible\n");
    fixture.add_package_file("vim", "colors/desert.vim", "\" colorscheme\n");

    let plan = plan_install(&fixture.context(), &["vim".to_string()]).unwrap();
    assert_eq!(plan.metadata().link_count, 2);
    assert_eq!(plan.metadata().dir_count, 1);

    let result = Executor::new(&fixture.fs, &fixture.cancel)
        .execute(&plan)
        .unwrap();
    assert!(result.success());

    let vimrc = fixture.target(".vimrc");
    assert!(fs::symlink_metadata(&vimrc).unwrap().file_type().is_symlink());
    assert_eq!(
        fs::read_link(&vimrc).unwrap(),
        fixture.package_root.as_path().join("vim/dot-vimrc")
    );
    assert_eq!(
        fs::read_to_string(fixture.target("colors/desert.vim")).unwrap(),
        "\" colorscheme\n"
    );

    let uninstall = plan_uninstall(&fixture.context(), &["vim".to_string()]).unwrap();
    let result = Executor::new(&fixture.fs, &fixture.cancel)
        .execute(&uninstall)
        .unwrap();
    assert!(result.success());

    assert!(!vimrc.exists());
    assert!(!fixture.target("colors").exists());
}

#[test]
fn failed_run_rolls_back_links_on_disk() {
    let fixture = OsFixture::new();
    fixture.add_package_file("shell", "dot-profile", "export EDITOR=vim\n");
    fixture.add_package_file("shell", "dot-bashrc", "alias ll='ls -l'\n");

    let plan = plan_install(&fixture.context(), &["shell".to_string()]).unwrap();
    assert!(plan.is_executable());

    // Sabotage the second target after planning: a file appears between
    // plan and execute, so the symlink call fails mid-run.
    let targets: Vec<_> = plan
        .operations()
        .iter()
        .filter_map(|op| match op.kind() {
            dot::OperationKind::LinkCreate { target, .. } => Some(target.as_path().to_path_buf()),
            _ => None,
        })
        .collect();
    assert_eq!(targets.len(), 2);
    fs::write(&targets[1], "raced you").unwrap();

    let result = Executor::new(&fixture.fs, &fixture.cancel)
        .execute(&plan)
        .unwrap();
    assert!(!result.success());
    assert!(result.partial_failure());

    // The first link was rolled back; the interloper file is intact.
    assert!(!targets[0].exists());
    assert_eq!(fs::read_to_string(&targets[1]).unwrap(), "raced you");
}

#[test]
fn manifest_survives_a_roundtrip_on_disk() {
    let fixture = OsFixture::new();
    let store = ManifestStore::new(&fixture.target_root);

    let mut manifest = store.load(&fixture.fs, &fixture.cancel).unwrap();
    assert!(manifest.is_empty());

    manifest.record_install(
        "vim",
        vec![dot::LinkRecord {
            source: fixture.package_root.as_path().join("vim/dot-vimrc"),
            target: fixture.target(".vimrc"),
        }],
    );
    store
        .save(&fixture.fs, &fixture.cancel, &mut manifest)
        .unwrap();

    let loaded = store.load(&fixture.fs, &fixture.cancel).unwrap();
    assert_eq!(loaded.package("vim").unwrap().links.len(), 1);
    assert!(store.path().exists());
    assert!(!Path::new(&format!("{}.tmp", store.path().display())).exists());
}

#[test]
fn scan_ignores_version_control_litter_on_disk() {
    let fixture = OsFixture::new();
    fixture.add_package_file("git", "dot-gitconfig", "[user]\n");
    fixture.add_package_file("git", ".git/HEAD", "ref: refs/heads/main\n");

    let plan = plan_install(&fixture.context(), &["git".to_string()]).unwrap();
    assert_eq!(plan.metadata().link_count, 1);

    let result = Executor::new(&fixture.fs, &fixture.cancel)
        .execute(&plan)
        .unwrap();
    assert!(result.success());
    assert!(!fixture.target(".git").exists());
    assert!(fixture
        .fs
        .is_symlink(&fixture.cancel, &fixture.target(".gitconfig"))
        .unwrap());
}
