// src/commands.rs

//! Command handlers for the dot CLI
//!
//! Each handler assembles a planning context from flags and config, runs
//! the pipeline, renders the outcome, and (for mutating commands) drives
//! the executor and manifest store under the target lock.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::cancel::CancelToken;
use crate::cli::{GlobalOptions, OutputFormat};
use crate::config::Config;
use crate::executor::Executor;
use crate::filesystem::{Filesystem, OsFilesystem};
use crate::ignore::IgnoreSet;
use crate::lock::{Lockfile, LOCK_FILE};
use crate::manifest::{LinkRecord, Manifest, ManifestStore};
use crate::path::{clean, PackagePath, TargetPath};
use crate::pipeline::{plan_adopt, plan_install, plan_replan, plan_uninstall, PlanningContext};
use crate::plan::Plan;
use crate::planner::compute_desired_state;
use crate::resolver::ResolutionPolicies;
use crate::scanner::scan_package;

/// Effective settings after merging flags, config, and defaults
pub struct RunSettings {
    pub package_root: PackagePath,
    pub target_root: TargetPath,
    pub ignore: IgnoreSet,
    pub policies: ResolutionPolicies,
    pub backup_dir: Option<PathBuf>,
}

impl RunSettings {
    fn context<'a>(&self, fs: &'a dyn Filesystem, cancel: &'a CancelToken) -> PlanningContext<'a> {
        PlanningContext {
            fs,
            cancel,
            package_root: self.package_root.clone(),
            target_root: self.target_root.clone(),
            ignore: self.ignore.clone(),
            policies: self.policies,
            backup_dir: self.backup_dir.clone(),
        }
    }
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(clean(path))
    } else {
        let cwd = std::env::current_dir().context("resolving current directory")?;
        Ok(clean(&cwd.join(path)))
    }
}

/// Merge command-line flags over config over built-in defaults
pub fn build_settings(options: &GlobalOptions) -> Result<RunSettings> {
    let config = Config::load_or_default(options.config.as_deref())?;

    let package_dir = match options.dir.clone().or(config.package_dir.clone()) {
        Some(dir) => absolutize(&dir)?,
        None => std::env::current_dir().context("resolving current directory")?,
    };
    let target_dir = match options.target.clone().or(config.target_dir.clone()) {
        Some(dir) => absolutize(&dir)?,
        None => dirs::home_dir().context("cannot determine home directory; pass --target")?,
    };

    let mut ignore = config.ignore_set()?;
    for glob in &options.ignore {
        ignore.add(glob)?;
    }

    let mut policies = config.policies;
    if let Some(policy) = options.on_file_exists {
        policies.on_file_exists = policy.into();
    }
    if let Some(policy) = options.on_wrong_link {
        policies.on_wrong_link = policy.into();
    }

    let backup_dir = match options.backup_dir.clone().or(config.backup_dir) {
        Some(dir) => Some(absolutize(&dir)?),
        None => None,
    };

    Ok(RunSettings {
        package_root: PackagePath::new(package_dir)?,
        target_root: TargetPath::new(target_dir)?,
        ignore,
        policies,
        backup_dir,
    })
}

/// `dot manage <packages…>`
pub fn manage(options: &GlobalOptions, packages: &[String], dry_run: bool) -> Result<()> {
    let settings = build_settings(options)?;
    let fs = OsFilesystem::new();
    let cancel = CancelToken::new();
    let ctx = settings.context(&fs, &cancel);

    let _lock = acquire_lock(&settings, dry_run)?;
    let plan = plan_install(&ctx, packages)?;
    render_warnings(&plan);

    if plan.has_conflicts() {
        render_conflicts(&plan);
        bail!(
            "{} unresolved conflicts; nothing was changed",
            plan.metadata().conflicts.len()
        );
    }
    if dry_run {
        render_plan(&plan);
        return Ok(());
    }

    ensure_backup_dir(&fs, &cancel, &settings, &plan)?;
    run_plan(&fs, &cancel, &plan)?;

    let store = ManifestStore::new(&settings.target_root);
    let mut manifest = store.load(&fs, &cancel)?;
    for name in packages {
        let links = package_link_records(&ctx, name)?;
        manifest.record_install(name, links);
    }
    store.save(&fs, &cancel, &mut manifest)?;

    info!(packages = packages.len(), operations = plan.operations().len(), "manage complete");
    println!(
        "Managed {} package(s): {} link(s), {} dir(s).",
        packages.len(),
        plan.metadata().link_count,
        plan.metadata().dir_count
    );
    Ok(())
}

/// `dot unmanage <packages…>`
pub fn unmanage(options: &GlobalOptions, packages: &[String], dry_run: bool) -> Result<()> {
    let settings = build_settings(options)?;
    let fs = OsFilesystem::new();
    let cancel = CancelToken::new();
    let ctx = settings.context(&fs, &cancel);

    let _lock = acquire_lock(&settings, dry_run)?;
    let plan = plan_uninstall(&ctx, packages)?;
    render_warnings(&plan);

    if dry_run {
        render_plan(&plan);
        return Ok(());
    }

    run_plan(&fs, &cancel, &plan)?;

    let store = ManifestStore::new(&settings.target_root);
    let mut manifest = store.load(&fs, &cancel)?;
    for name in packages {
        if !manifest.remove_package(name) {
            warn!(package = %name, "package was not recorded in the manifest");
        }
    }
    store.save(&fs, &cancel, &mut manifest)?;

    println!(
        "Unmanaged {} package(s): {} operation(s) applied.",
        packages.len(),
        plan.operations().len()
    );
    Ok(())
}

/// `dot remanage [packages…]`; defaults to everything in the manifest
pub fn remanage(options: &GlobalOptions, packages: &[String], dry_run: bool) -> Result<()> {
    let settings = build_settings(options)?;
    let fs = OsFilesystem::new();
    let cancel = CancelToken::new();
    let ctx = settings.context(&fs, &cancel);

    let store = ManifestStore::new(&settings.target_root);
    let packages: Vec<String> = if packages.is_empty() {
        let manifest = store.load(&fs, &cancel)?;
        manifest.package_names().map(str::to_string).collect()
    } else {
        packages.to_vec()
    };
    if packages.is_empty() {
        println!("Nothing is managed yet.");
        return Ok(());
    }

    let _lock = acquire_lock(&settings, dry_run)?;
    let plan = plan_replan(&ctx, &packages)?;
    render_warnings(&plan);

    if plan.has_conflicts() {
        render_conflicts(&plan);
        bail!(
            "{} unresolved conflicts; nothing was changed",
            plan.metadata().conflicts.len()
        );
    }
    if dry_run {
        render_plan(&plan);
        return Ok(());
    }

    ensure_backup_dir(&fs, &cancel, &settings, &plan)?;
    run_plan(&fs, &cancel, &plan)?;

    let mut manifest = store.load(&fs, &cancel)?;
    for name in &packages {
        let links = package_link_records(&ctx, name)?;
        manifest.record_install(name, links);
    }
    store.save(&fs, &cancel, &mut manifest)?;

    println!("Remanaged {} package(s).", packages.len());
    Ok(())
}

/// `dot adopt <package> <files…>`
pub fn adopt(
    options: &GlobalOptions,
    package: &str,
    files: &[String],
    dry_run: bool,
) -> Result<()> {
    let settings = build_settings(options)?;
    let fs = OsFilesystem::new();
    let cancel = CancelToken::new();
    let ctx = settings.context(&fs, &cancel);

    let _lock = acquire_lock(&settings, dry_run)?;
    let plan = plan_adopt(&ctx, package, files)?;
    render_warnings(&plan);

    if dry_run {
        render_plan(&plan);
        return Ok(());
    }
    if plan.operations().is_empty() {
        println!("Nothing to adopt.");
        return Ok(());
    }

    run_plan(&fs, &cancel, &plan)?;

    let store = ManifestStore::new(&settings.target_root);
    let mut manifest = store.load(&fs, &cancel)?;
    let links = package_link_records(&ctx, package)?;
    manifest.record_install(package, links);
    store.save(&fs, &cancel, &mut manifest)?;

    println!("Adopted {} file(s) into {package}.", files.len());
    Ok(())
}

/// `dot plan <packages…>`
pub fn plan_command(
    options: &GlobalOptions,
    packages: &[String],
    format: OutputFormat,
) -> Result<()> {
    let settings = build_settings(options)?;
    let fs = OsFilesystem::new();
    let cancel = CancelToken::new();
    let ctx = settings.context(&fs, &cancel);

    let plan = plan_install(&ctx, packages)?;
    match format {
        OutputFormat::Json => println!("{}", plan.to_json()?),
        OutputFormat::Text => {
            render_warnings(&plan);
            render_conflicts(&plan);
            render_plan(&plan);
        }
    }
    Ok(())
}

/// `dot status`
pub fn status(options: &GlobalOptions) -> Result<()> {
    let settings = build_settings(options)?;
    let fs = OsFilesystem::new();
    let cancel = CancelToken::new();

    let store = ManifestStore::new(&settings.target_root);
    let manifest: Manifest = store.load(&fs, &cancel)?;
    if manifest.is_empty() {
        println!("Nothing is managed in {}.", settings.target_root);
        return Ok(());
    }

    println!("Managed packages in {}:", settings.target_root);
    for record in manifest.packages.values() {
        println!(
            "  {}  {} link(s), installed {}",
            record.name,
            record.links.len(),
            record.installed_at.to_rfc3339()
        );
    }
    println!("Last updated {}.", manifest.updated_at.to_rfc3339());
    Ok(())
}

fn acquire_lock(settings: &RunSettings, dry_run: bool) -> Result<Option<Lockfile>> {
    if dry_run {
        return Ok(None);
    }
    let path = settings.target_root.join(LOCK_FILE);
    Ok(Some(Lockfile::acquire(path.as_path())?))
}

/// The backup policy writes into the backup directory; make sure it
/// exists before any `FileBackup` operation runs
fn ensure_backup_dir(
    fs: &dyn Filesystem,
    cancel: &CancelToken,
    settings: &RunSettings,
    plan: &Plan,
) -> Result<()> {
    let needs_backup = plan
        .operations()
        .iter()
        .any(|op| matches!(op.kind(), crate::operation::OperationKind::FileBackup { .. }));
    if !needs_backup {
        return Ok(());
    }
    let dir = settings
        .backup_dir
        .as_deref()
        .context("backup operations planned without a backup directory")?;
    fs.mkdir_all(cancel, dir, 0o755)?;
    Ok(())
}

fn run_plan(fs: &dyn Filesystem, cancel: &CancelToken, plan: &Plan) -> Result<()> {
    let result = Executor::new(fs, cancel).execute(plan)?;
    if result.success() {
        return Ok(());
    }
    for error in &result.errors {
        eprintln!("error: {error}");
    }
    if result.partial_failure() {
        eprintln!(
            "rolled back {} of {} completed operation(s)",
            result.rolled_back.len(),
            result.executed.len()
        );
    }
    bail!("execution failed; the target was rolled back");
}

/// Desired links of one package, for the manifest record
fn package_link_records(ctx: &PlanningContext<'_>, name: &str) -> Result<Vec<LinkRecord>> {
    let path = PackagePath::new(ctx.package_root.as_path().join(name))?;
    let package = scan_package(ctx.fs, ctx.cancel, &path, name, &ctx.ignore)?;
    let desired = compute_desired_state(std::slice::from_ref(&package), &ctx.target_root)?;
    Ok(desired
        .links()
        .map(|spec| LinkRecord {
            source: spec.source.as_path().to_path_buf(),
            target: spec.target.as_path().to_path_buf(),
        })
        .collect())
}

fn render_plan(plan: &Plan) {
    if plan.operations().is_empty() {
        println!("Nothing to do.");
        return;
    }
    println!("Plan ({} operations):", plan.operations().len());
    for op in plan.operations() {
        println!("  {op}");
    }
}

fn render_warnings(plan: &Plan) {
    for warning in &plan.metadata().warnings {
        println!("[{}] {}", warning.severity, warning.message);
    }
}

fn render_conflicts(plan: &Plan) {
    for conflict in &plan.metadata().conflicts {
        println!("conflict [{}] {}: {}", conflict.kind, conflict.path, conflict.details);
        for suggestion in &conflict.suggestions {
            match &suggestion.example {
                Some(example) => println!(
                    "    - {}: {} (e.g. `{}`)",
                    suggestion.action, suggestion.explanation, example
                ),
                None => println!("    - {}: {}", suggestion.action, suggestion.explanation),
            }
        }
    }
}
