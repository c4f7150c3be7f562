// tests/pipeline.rs

//! End-to-end planning scenarios against the in-memory filesystem.
//!
//! Each test drives the full pipeline the way the CLI does, from package
//! trees and an observed target directory to an ordered plan, and checks
//! the plan artifact as a whole: operations, counts, conflicts, and
//! warnings.

use dot::{
    plan_install, plan_uninstall, CancelToken, ConflictType, DependencyGraph, Executor, FilePath,
    Filesystem, IgnoreSet, MemoryFilesystem, Operation, OperationKind, PackagePath, Plan,
    PlanningContext, ResolutionPolicies, ResolutionPolicy, TargetPath,
};
use std::path::Path;

struct Fixture {
    fs: MemoryFilesystem,
    cancel: CancelToken,
    policies: ResolutionPolicies,
    backup_dir: Option<std::path::PathBuf>,
}

impl Fixture {
    fn new() -> Self {
        let fs = MemoryFilesystem::new();
        fs.add_dir("/pkgs");
        fs.add_dir("/home/u");
        Self {
            fs,
            cancel: CancelToken::new(),
            policies: ResolutionPolicies::default(),
            backup_dir: None,
        }
    }

    fn context(&self) -> PlanningContext<'_> {
        PlanningContext {
            fs: &self.fs,
            cancel: &self.cancel,
            package_root: PackagePath::new("/pkgs").unwrap(),
            target_root: TargetPath::new("/home/u").unwrap(),
            ignore: IgnoreSet::default(),
            policies: self.policies,
            backup_dir: self.backup_dir.clone(),
        }
    }

    fn install(&self, packages: &[&str]) -> Plan {
        let names: Vec<String> = packages.iter().map(|s| s.to_string()).collect();
        plan_install(&self.context(), &names).unwrap()
    }

    fn uninstall(&self, packages: &[&str]) -> Plan {
        let names: Vec<String> = packages.iter().map(|s| s.to_string()).collect();
        plan_uninstall(&self.context(), &names).unwrap()
    }
}

#[test]
fn single_dotfile_install() {
    let fixture = Fixture::new();
    fixture.fs.add_file("/pkgs/vim/dot-vimrc", b"set nocompatible");

    let plan = fixture.install(&["vim"]);

    assert_eq!(plan.operations().len(), 1);
    match plan.operations()[0].kind() {
        OperationKind::LinkCreate { source, target } => {
            assert_eq!(source.as_path(), Path::new("/pkgs/vim/dot-vimrc"));
            assert_eq!(target.as_path(), Path::new("/home/u/.vimrc"));
        }
        other => panic!("expected a link creation, got {other:?}"),
    }
    assert_eq!(plan.metadata().link_count, 1);
    assert_eq!(plan.metadata().dir_count, 0);
    assert!(plan.metadata().conflicts.is_empty());
    assert_eq!(
        plan.package_operations()["vim"],
        vec![plan.operations()[0].id().clone()]
    );
}

#[test]
fn nested_structure_requires_parent_dir() {
    let fixture = Fixture::new();
    fixture.fs.add_file("/pkgs/vim/colors/desert.vim", b"");

    let plan = fixture.install(&["vim"]);

    let dir_pos = plan
        .operations()
        .iter()
        .position(|op| {
            matches!(op.kind(), OperationKind::DirCreate { path } if path.as_path() == Path::new("/home/u/colors"))
        })
        .expect("directory creation present");
    let link_pos = plan
        .operations()
        .iter()
        .position(|op| {
            matches!(
                op.kind(),
                OperationKind::LinkCreate { source, target }
                    if source.as_path() == Path::new("/pkgs/vim/colors/desert.vim")
                        && target.as_path() == Path::new("/home/u/colors/desert.vim")
            )
        })
        .expect("link creation present");
    assert!(dir_pos < link_pos);
    assert_eq!(plan.metadata().dir_count, 1);
}

#[test]
fn existing_plain_file_conflicts_under_default_policy() {
    let fixture = Fixture::new();
    fixture.fs.add_file("/pkgs/vim/dot-vimrc", b"set nocompatible");
    fixture.fs.add_file("/home/u/.vimrc", &[b'x'; 42]);

    let plan = fixture.install(&["vim"]);

    assert!(plan.has_conflicts());
    assert_eq!(plan.metadata().conflicts.len(), 1);
    let conflict = &plan.metadata().conflicts[0];
    assert_eq!(conflict.kind, ConflictType::FileExists);
    assert_eq!(conflict.path.as_path(), Path::new("/home/u/.vimrc"));
    assert_eq!(conflict.context["size"], "42");
    assert!(!conflict.suggestions.is_empty());
    assert!(plan
        .operations()
        .iter()
        .all(|op| !matches!(op.kind(), OperationKind::LinkCreate { .. })));
}

#[test]
fn existing_correct_link_is_a_skip() {
    let fixture = Fixture::new();
    fixture.fs.add_file("/pkgs/vim/dot-vimrc", b"set nocompatible");
    fixture.fs.add_symlink("/home/u/.vimrc", "/pkgs/vim/dot-vimrc");

    let plan = fixture.install(&["vim"]);

    assert!(plan.operations().is_empty());
    assert!(plan.metadata().conflicts.is_empty());
    assert!(plan.metadata().warnings.is_empty());
}

#[test]
fn wrong_link_with_skip_policy_warns_and_drops() {
    let mut fixture = Fixture::new();
    fixture.policies.on_wrong_link = ResolutionPolicy::Skip;
    fixture.fs.add_file("/pkgs/vim/dot-vimrc", b"set nocompatible");
    fixture.fs.add_symlink("/home/u/.vimrc", "/other/vimrc");

    let plan = fixture.install(&["vim"]);

    assert!(plan.operations().is_empty());
    assert!(plan.metadata().conflicts.is_empty());
    assert_eq!(plan.metadata().warnings.len(), 1);
    assert!(plan.metadata().warnings[0].message.starts_with("Skipping"));
}

#[test]
fn cyclic_operations_are_rejected() {
    let mut a = Operation::dir_create(FilePath::new("/home/u/a").unwrap());
    let b = Operation::dir_create(FilePath::new("/home/u/b").unwrap())
        .with_dependency(a.id().clone());
    a = a.with_dependency(b.id().clone());
    let a_text = a.to_string();
    let b_text = b.to_string();

    let err = DependencyGraph::build(vec![a, b])
        .topological_sort()
        .unwrap_err();
    match err {
        dot::Error::CyclicDependency { cycle } => {
            assert!(cycle.contains(&a_text));
            assert!(cycle.contains(&b_text));
        }
        other => panic!("expected a cycle error, got {other:?}"),
    }
}

#[test]
fn wrong_link_with_overwrite_policy_repoints() {
    let mut fixture = Fixture::new();
    fixture.policies.on_wrong_link = ResolutionPolicy::Overwrite;
    fixture.fs.add_file("/pkgs/vim/dot-vimrc", b"set nocompatible");
    fixture.fs.add_symlink("/home/u/.vimrc", "/other/vimrc");

    let plan = fixture.install(&["vim"]);
    assert!(!plan.has_conflicts());

    let result = Executor::new(&fixture.fs, &fixture.cancel)
        .execute(&plan)
        .unwrap();
    assert!(result.success());
    assert_eq!(
        fixture
            .fs
            .read_link(&fixture.cancel, Path::new("/home/u/.vimrc"))
            .unwrap(),
        Path::new("/pkgs/vim/dot-vimrc")
    );
}

#[test]
fn backup_policy_preserves_existing_file() {
    let mut fixture = Fixture::new();
    fixture.policies.on_file_exists = ResolutionPolicy::Backup;
    fixture.backup_dir = Some("/home/u/.dot-backup".into());
    fixture.fs.add_file("/pkgs/vim/dot-vimrc", b"from package");
    fixture.fs.add_file("/home/u/.vimrc", b"precious local edits");
    fixture.fs.add_dir("/home/u/.dot-backup");

    let plan = fixture.install(&["vim"]);
    assert!(!plan.has_conflicts());

    // The backup must come before the link creation.
    let backup_pos = plan
        .operations()
        .iter()
        .position(|op| matches!(op.kind(), OperationKind::FileBackup { .. }))
        .expect("backup operation present");
    let link_pos = plan
        .operations()
        .iter()
        .position(|op| matches!(op.kind(), OperationKind::LinkCreate { .. }))
        .expect("link operation present");
    assert!(backup_pos < link_pos);

    let result = Executor::new(&fixture.fs, &fixture.cancel)
        .execute(&plan)
        .unwrap();
    assert!(result.success());
    assert_eq!(
        fixture
            .fs
            .read_file(&fixture.cancel, Path::new("/home/u/.dot-backup/.vimrc"))
            .unwrap(),
        b"precious local edits"
    );
    assert!(fixture
        .fs
        .is_symlink(&fixture.cancel, Path::new("/home/u/.vimrc"))
        .unwrap());
}

#[test]
fn install_execute_replan_converges_to_empty() {
    let fixture = Fixture::new();
    fixture.fs.add_file("/pkgs/vim/dot-vimrc", b"");
    fixture.fs.add_file("/pkgs/vim/colors/desert.vim", b"");

    let plan = fixture.install(&["vim"]);
    let result = Executor::new(&fixture.fs, &fixture.cancel)
        .execute(&plan)
        .unwrap();
    assert!(result.success());

    let replan = fixture.install(&["vim"]);
    assert!(replan.operations().is_empty());
    assert!(replan.metadata().conflicts.is_empty());
    assert!(replan.metadata().warnings.is_empty());
}

#[test]
fn uninstall_removes_links_and_emptied_dirs() {
    let fixture = Fixture::new();
    fixture.fs.add_file("/pkgs/vim/dot-vimrc", b"");
    fixture.fs.add_file("/pkgs/vim/colors/desert.vim", b"");

    let install = fixture.install(&["vim"]);
    Executor::new(&fixture.fs, &fixture.cancel)
        .execute(&install)
        .unwrap();

    let uninstall = fixture.uninstall(&["vim"]);
    let result = Executor::new(&fixture.fs, &fixture.cancel)
        .execute(&uninstall)
        .unwrap();
    assert!(result.success());

    assert!(!fixture.fs.exists(&fixture.cancel, Path::new("/home/u/.vimrc")));
    assert!(!fixture
        .fs
        .exists(&fixture.cancel, Path::new("/home/u/colors/desert.vim")));
    assert!(!fixture.fs.exists(&fixture.cancel, Path::new("/home/u/colors")));
}

#[test]
fn uninstall_leaves_dirs_with_foreign_content() {
    let fixture = Fixture::new();
    fixture.fs.add_file("/pkgs/vim/colors/desert.vim", b"");

    let install = fixture.install(&["vim"]);
    Executor::new(&fixture.fs, &fixture.cancel)
        .execute(&install)
        .unwrap();
    // Someone else also keeps a file in the shared directory.
    fixture.fs.add_file("/home/u/colors/mine.vim", b"not managed");

    let uninstall = fixture.uninstall(&["vim"]);
    let result = Executor::new(&fixture.fs, &fixture.cancel)
        .execute(&uninstall)
        .unwrap();
    assert!(result.success());

    assert!(!fixture
        .fs
        .exists(&fixture.cancel, Path::new("/home/u/colors/desert.vim")));
    assert!(fixture
        .fs
        .exists(&fixture.cancel, Path::new("/home/u/colors/mine.vim")));
    assert!(fixture
        .fs
        .is_dir(&fixture.cancel, Path::new("/home/u/colors"))
        .unwrap());
}

#[test]
fn uninstall_skips_links_owned_by_others() {
    let fixture = Fixture::new();
    fixture.fs.add_file("/pkgs/vim/dot-vimrc", b"");
    fixture.fs.add_symlink("/home/u/.vimrc", "/other/package/vimrc");

    let plan = fixture.uninstall(&["vim"]);
    assert!(plan.operations().is_empty());
    assert_eq!(plan.metadata().warnings.len(), 1);
    assert!(plan.metadata().warnings[0].message.contains("leaving"));

    // The foreign link survives untouched.
    assert_eq!(
        fixture
            .fs
            .read_link(&fixture.cancel, Path::new("/home/u/.vimrc"))
            .unwrap(),
        Path::new("/other/package/vimrc")
    );
}

#[test]
fn multiple_packages_are_attributed_separately() {
    let fixture = Fixture::new();
    fixture.fs.add_file("/pkgs/vim/dot-vimrc", b"");
    fixture.fs.add_file("/pkgs/tmux/dot-tmux.conf", b"");

    let plan = fixture.install(&["vim", "tmux"]);
    assert_eq!(plan.metadata().package_count, 2);
    assert_eq!(plan.metadata().link_count, 2);
    assert_eq!(plan.package_operations().len(), 2);
    assert_eq!(plan.package_operations()["vim"].len(), 1);
    assert_eq!(plan.package_operations()["tmux"].len(), 1);
}

#[test]
fn ignored_entries_never_reach_the_plan() {
    let fixture = Fixture::new();
    fixture.fs.add_file("/pkgs/vim/dot-vimrc", b"");
    fixture.fs.add_file("/pkgs/vim/.git/HEAD", b"ref");
    fixture.fs.add_file("/pkgs/vim/.DS_Store", b"");

    let plan = fixture.install(&["vim"]);
    assert_eq!(plan.metadata().link_count, 1);
    assert!(plan.operations().iter().all(|op| {
        !op.to_string().contains(".git") && !op.to_string().contains(".DS_Store")
    }));
}

#[test]
fn adopt_moves_file_into_package_and_links_back() {
    let fixture = Fixture::new();
    fixture.fs.add_dir("/pkgs/vim");
    fixture.fs.add_file("/home/u/.vimrc", b"my precious settings");

    let plan = dot::plan_adopt(&fixture.context(), "vim", &[".vimrc".to_string()]).unwrap();
    let result = Executor::new(&fixture.fs, &fixture.cancel)
        .execute(&plan)
        .unwrap();
    assert!(result.success());

    // The content now lives in the package, untranslated.
    assert_eq!(
        fixture
            .fs
            .read_file(&fixture.cancel, Path::new("/pkgs/vim/dot-vimrc"))
            .unwrap(),
        b"my precious settings"
    );
    // The target is a link to the adopted file.
    assert_eq!(
        fixture
            .fs
            .read_link(&fixture.cancel, Path::new("/home/u/.vimrc"))
            .unwrap(),
        Path::new("/pkgs/vim/dot-vimrc")
    );
    assert!(plan.package_operations().contains_key("vim"));
}

#[test]
fn adopt_refuses_missing_files_and_skips_links() {
    let fixture = Fixture::new();
    fixture.fs.add_dir("/pkgs/vim");
    fixture.fs.add_symlink("/home/u/.vimrc", "/pkgs/vim/dot-vimrc");

    // Already-linked files are skipped with a warning rather than moved.
    let plan = dot::plan_adopt(&fixture.context(), "vim", &[".vimrc".to_string()]).unwrap();
    assert!(plan.operations().is_empty());
    assert_eq!(plan.metadata().warnings.len(), 1);

    // A file that does not exist is an error.
    let err = dot::plan_adopt(&fixture.context(), "vim", &[".missing".to_string()]).unwrap_err();
    assert!(matches!(
        err,
        dot::Error::SourceNotFound { ref path } if path == Path::new("/home/u/.missing")
    ));
}

#[test]
fn plan_serializes_with_stable_tags() {
    let fixture = Fixture::new();
    fixture.fs.add_file("/pkgs/vim/dot-vimrc", b"set nocompatible");
    fixture.fs.add_file("/home/u/.vimrc", b"existing");

    let plan = fixture.install(&["vim"]);
    let json: serde_json::Value = serde_json::from_str(&plan.to_json().unwrap()).unwrap();
    assert_eq!(json["metadata"]["conflicts"][0]["type"], "file_exists");
    assert_eq!(json["metadata"]["conflicts"][0]["path"], "/home/u/.vimrc");
}
