// src/pipeline.rs

//! The planning pipeline
//!
//! Four stages composed into a single deterministic run:
//!
//! ```text
//! Scan -> Plan -> Resolve -> Sort
//! ```
//!
//! Each stage is a function of the planning context and the previous
//! stage's output, short-circuiting on the first error and checking the
//! cancellation token at entry. If resolution surfaces conflicts, the
//! pipeline stops before Sort and returns an informational plan carrying
//! the unsorted operations plus all conflict and warning metadata;
//! callers must not execute such a plan.

use crate::cancel::CancelToken;
use crate::error::{Result, ResultExt};
use crate::filesystem::Filesystem;
use crate::graph::DependencyGraph;
use crate::ignore::IgnoreSet;
use crate::operation::{Operation, OperationId, OperationKind};
use crate::path::{is_under, FilePath, PackagePath, TargetPath};
use crate::plan::Plan;
use crate::planner::{compute_desired_state, operations_from_desired_state, DesiredState};
use crate::resolver::{resolve, ResolutionPolicies, ResolveResult, Warning, WarningSeverity};
use crate::scanner::{scan_package, Package};
use crate::state::CurrentState;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;

/// Everything a pipeline run needs from its caller
pub struct PlanningContext<'a> {
    pub fs: &'a dyn Filesystem,
    pub cancel: &'a CancelToken,
    pub package_root: PackagePath,
    pub target_root: TargetPath,
    pub ignore: IgnoreSet,
    pub policies: ResolutionPolicies,
    pub backup_dir: Option<PathBuf>,
}

/// Plan the installation of the named packages
pub fn plan_install(ctx: &PlanningContext<'_>, package_names: &[String]) -> Result<Plan> {
    let packages = scan_stage(ctx, package_names)?;
    let desired = plan_stage(ctx, &packages)?;
    let resolved = resolve_stage(ctx, &desired)?;

    if resolved.has_conflicts() {
        log::debug!(
            "plan has {} conflicts; returning unsorted",
            resolved.conflict_count()
        );
        return Ok(Plan::new(
            resolved.operations,
            packages.len(),
            resolved.conflicts,
            resolved.warnings,
            BTreeMap::new(),
        ));
    }

    let sorted = sort_stage(ctx, resolved.operations)?;
    let package_operations = attribute_packages(&sorted, &packages);
    Ok(Plan::new(
        sorted,
        packages.len(),
        Vec::new(),
        resolved.warnings,
        package_operations,
    ))
}

/// Plan the removal of the named packages.
///
/// Reuses the scan and desire stages to learn what the packages place in
/// the target, then emits deletions for every link that verifiably
/// points into the package and for every implied directory that would be
/// left holding nothing else.
pub fn plan_uninstall(ctx: &PlanningContext<'_>, package_names: &[String]) -> Result<Plan> {
    let packages = scan_stage(ctx, package_names)?;
    let desired = plan_stage(ctx, &packages)?;

    ctx.cancel.check("resolve stage")?;
    let current = CurrentState::capture(ctx.fs, ctx.cancel, &desired)?;

    let mut operations: Vec<Operation> = Vec::new();
    let mut warnings: Vec<Warning> = Vec::new();
    // Deleted target path -> id of the operation that deletes it, used
    // to decide which directories empty out and to order their removal.
    let mut deleted: HashMap<PathBuf, OperationId> = HashMap::new();

    for spec in desired.links() {
        match current.link(spec.target.as_path()) {
            Some(link) if link.target == spec.source.as_path() => {
                let op = Operation::link_delete(spec.target.clone());
                deleted.insert(spec.target.as_path().to_path_buf(), op.id().clone());
                operations.push(op);
            }
            Some(link) => {
                warnings.push(
                    Warning::new(
                        WarningSeverity::Caution,
                        format!("leaving {} in place: owned by another source", spec.target),
                    )
                    .with_context("actual", link.target.display().to_string()),
                );
            }
            None => {
                if current.file(spec.target.as_path()).is_some()
                    || current.is_dir(spec.target.as_path())
                {
                    warnings.push(Warning::new(
                        WarningSeverity::Caution,
                        format!("leaving {} in place: not a managed link", spec.target),
                    ));
                }
                // Already absent: nothing to undo.
            }
        }
    }

    // Directories deepest-first, so a child's removal can unblock its
    // parent within the same plan.
    let mut dirs: Vec<_> = desired.dirs().collect();
    dirs.sort_by_key(|spec| std::cmp::Reverse(spec.path.as_path().components().count()));
    for spec in dirs {
        if !current.is_dir(spec.path.as_path()) {
            continue;
        }
        let entries = ctx
            .fs
            .read_dir(ctx.cancel, spec.path.as_path())
            .with_context(|| format!("listing {}", spec.path))?;
        let mut deps = Vec::with_capacity(entries.len());
        let all_deleted = entries.iter().all(|entry| {
            match deleted.get(spec.path.as_path().join(&entry.name).as_path()) {
                Some(id) => {
                    deps.push(id.clone());
                    true
                }
                None => false,
            }
        });
        if !all_deleted {
            continue;
        }
        let op = Operation::dir_delete(spec.path.clone()).with_dependencies(deps);
        deleted.insert(spec.path.as_path().to_path_buf(), op.id().clone());
        operations.push(op);
    }

    let sorted = sort_stage(ctx, operations)?;
    Ok(Plan::new(
        sorted,
        packages.len(),
        Vec::new(),
        warnings,
        BTreeMap::new(),
    ))
}

/// Recompute the desired state for already-managed packages and plan
/// whatever reconciliation the observed target needs. Satisfied links
/// resolve to skips, so a converged target yields an empty plan.
pub fn plan_replan(ctx: &PlanningContext<'_>, package_names: &[String]) -> Result<Plan> {
    plan_install(ctx, package_names)
}

/// Plan the adoption of existing target files into a package.
///
/// Each file moves into the package tree under its untranslated name
/// (`.vimrc` becomes `dot-vimrc`) and a link to the new location takes
/// its place, so the target keeps working while the content comes under
/// version control.
pub fn plan_adopt(
    ctx: &PlanningContext<'_>,
    package_name: &str,
    files: &[String],
) -> Result<Plan> {
    use crate::error::Error;
    use crate::scanner::dotfile::untranslate_path;

    ctx.cancel.check("adopt")?;
    let package_path = PackagePath::new(ctx.package_root.as_path().join(package_name))?;

    let mut operations: Vec<Operation> = Vec::new();
    let mut warnings: Vec<Warning> = Vec::new();
    let mut dir_ops: HashMap<PathBuf, OperationId> = HashMap::new();

    for file in files {
        ctx.cancel.check("adopt")?;
        let target = ctx.target_root.join(file);
        if ctx.fs.is_symlink(ctx.cancel, target.as_path())? {
            warnings.push(Warning::new(
                WarningSeverity::Info,
                format!("skipping {target}: already a link"),
            ));
            continue;
        }
        if !ctx.fs.exists(ctx.cancel, target.as_path()) {
            return Err(Error::SourceNotFound {
                path: target.as_path().to_path_buf(),
            });
        }

        let rel = crate::scanner::relative_path(ctx.target_root.as_path(), target.as_path())?;
        let dest = package_path.join(untranslate_path(&rel));

        // Parent directories up to the package root, outermost first;
        // the package directory itself may not exist yet either.
        let mut missing = Vec::new();
        let mut current = dest.as_path().parent();
        while let Some(dir) = current {
            if dir == ctx.package_root.as_path()
                || dir_ops.contains_key(dir)
                || ctx.fs.is_dir(ctx.cancel, dir)?
            {
                break;
            }
            missing.push(dir.to_path_buf());
            current = dir.parent();
        }
        let mut last_dir_dep: Option<OperationId> = None;
        for dir in missing.into_iter().rev() {
            let mut op = Operation::dir_create(FilePath::new(&dir)?);
            if let Some(parent) = dir.parent() {
                if let Some(dep) = dir_ops.get(parent) {
                    op = op.with_dependency(dep.clone());
                }
            }
            dir_ops.insert(dir, op.id().clone());
            last_dir_dep = Some(op.id().clone());
            operations.push(op);
        }
        if last_dir_dep.is_none() {
            if let Some(parent) = dest.as_path().parent() {
                last_dir_dep = dir_ops.get(parent).cloned();
            }
        }

        let mut move_op = Operation::file_move(target.clone(), dest.clone());
        if let Some(dep) = last_dir_dep {
            move_op = move_op.with_dependency(dep);
        }
        let link_op = Operation::link_create(dest, target).with_dependency(move_op.id().clone());
        operations.push(move_op);
        operations.push(link_op);
    }

    let sorted = sort_stage(ctx, operations)?;
    let mut package_operations: BTreeMap<String, Vec<OperationId>> = BTreeMap::new();
    let attributed: Vec<OperationId> = sorted
        .iter()
        .filter(|op| {
            matches!(
                op.kind(),
                OperationKind::FileMove { dest, .. } if is_under(dest.as_path(), package_path.as_path())
            ) || matches!(
                op.kind(),
                OperationKind::LinkCreate { source, .. } if is_under(source.as_path(), package_path.as_path())
            )
        })
        .map(|op| op.id().clone())
        .collect();
    if !attributed.is_empty() {
        package_operations.insert(package_name.to_string(), attributed);
    }

    Ok(Plan::new(
        sorted,
        1,
        Vec::new(),
        warnings,
        package_operations,
    ))
}

/// Scan stage: resolve each package name under the package root
fn scan_stage(ctx: &PlanningContext<'_>, package_names: &[String]) -> Result<Vec<Package>> {
    ctx.cancel.check("scan stage")?;
    package_names
        .iter()
        .map(|name| {
            let path = PackagePath::new(ctx.package_root.as_path().join(name))?;
            scan_package(ctx.fs, ctx.cancel, &path, name, &ctx.ignore)
        })
        .collect()
}

/// Plan stage: package trees to desired links and directories
fn plan_stage(ctx: &PlanningContext<'_>, packages: &[Package]) -> Result<DesiredState> {
    ctx.cancel.check("plan stage")?;
    compute_desired_state(packages, &ctx.target_root)
}

/// Resolve stage: desired state to concrete, policy-filtered operations
fn resolve_stage(ctx: &PlanningContext<'_>, desired: &DesiredState) -> Result<ResolveResult> {
    ctx.cancel.check("resolve stage")?;
    let operations = operations_from_desired_state(desired);
    let current = CurrentState::capture(ctx.fs, ctx.cancel, desired)?;
    Ok(resolve(
        operations,
        &current,
        &ctx.policies,
        ctx.backup_dir.as_deref(),
    ))
}

/// Sort stage: dependency-respecting operation order
fn sort_stage(ctx: &PlanningContext<'_>, operations: Vec<Operation>) -> Result<Vec<Operation>> {
    ctx.cancel.check("sort stage")?;
    if operations.is_empty() {
        return Ok(operations);
    }
    DependencyGraph::build(operations).topological_sort()
}

/// Attribute operations to packages by where their sources live
fn attribute_packages(
    operations: &[Operation],
    packages: &[Package],
) -> BTreeMap<String, Vec<OperationId>> {
    let mut map: BTreeMap<String, Vec<OperationId>> = BTreeMap::new();
    let mut seen: HashSet<&OperationId> = HashSet::new();

    for op in operations {
        let source = match op.kind() {
            OperationKind::LinkCreate { source, .. } => source,
            OperationKind::FileMove { dest, .. } => dest,
            _ => continue,
        };
        for package in packages {
            if is_under(source.as_path(), package.path.as_path()) && seen.insert(op.id()) {
                map.entry(package.name.clone())
                    .or_default()
                    .push(op.id().clone());
                break;
            }
        }
    }
    map
}
