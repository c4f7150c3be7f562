// src/resolver/mod.rs

//! Conflict detection and resolution
//!
//! Pure comparison of planned operations against the observed state of
//! the target directory. Detection decides whether an operation is
//! redundant, clean, or conflicted; the per-conflict-type policy then
//! decides what happens to conflicted operations. Nothing here touches
//! the filesystem.

mod conflict;
mod policy;
mod suggest;

pub use conflict::{Conflict, ConflictType, Suggestion, Warning, WarningSeverity};
pub use policy::{ResolutionPolicies, ResolutionPolicy};
pub use suggest::suggestions_for;

use crate::operation::{Operation, OperationKind};
use crate::path::FilePath;
use crate::state::CurrentState;
use std::path::Path;

/// Verdict for a single operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// The operation is safe as planned
    Ok,
    /// The operation conflicts and no policy resolved it
    Conflict,
    /// The operation proceeds, possibly rewritten, with a warning
    Warning,
    /// The operation is redundant or was dropped by policy
    Skip,
}

/// Per-operation resolution verdict
#[derive(Debug)]
pub struct ResolutionOutcome {
    pub status: OutcomeStatus,
    /// Operations to keep; may be empty (skip/conflict) or longer than
    /// one (backup/overwrite rewrites)
    pub operations: Vec<Operation>,
    pub conflict: Option<Conflict>,
    pub warning: Option<Warning>,
}

impl ResolutionOutcome {
    fn ok(op: Operation) -> Self {
        Self {
            status: OutcomeStatus::Ok,
            operations: vec![op],
            conflict: None,
            warning: None,
        }
    }

    fn skip() -> Self {
        Self {
            status: OutcomeStatus::Skip,
            operations: Vec::new(),
            conflict: None,
            warning: None,
        }
    }

    fn skip_with_warning(warning: Warning) -> Self {
        Self {
            status: OutcomeStatus::Skip,
            operations: Vec::new(),
            conflict: None,
            warning: Some(warning),
        }
    }

    fn conflicted(conflict: Conflict) -> Self {
        Self {
            status: OutcomeStatus::Conflict,
            operations: Vec::new(),
            conflict: Some(conflict),
            warning: None,
        }
    }

    fn rewritten(operations: Vec<Operation>, warning: Warning) -> Self {
        Self {
            status: OutcomeStatus::Warning,
            operations,
            conflict: None,
            warning: Some(warning),
        }
    }
}

/// Aggregate result of resolving a batch of operations
#[derive(Debug, Default)]
pub struct ResolveResult {
    pub operations: Vec<Operation>,
    pub conflicts: Vec<Conflict>,
    pub warnings: Vec<Warning>,
}

impl ResolveResult {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    pub fn conflict_count(&self) -> usize {
        self.conflicts.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    fn absorb(&mut self, outcome: ResolutionOutcome) {
        self.operations.extend(outcome.operations);
        if let Some(conflict) = outcome.conflict {
            self.conflicts.push(conflict);
        }
        if let Some(warning) = outcome.warning {
            self.warnings.push(warning);
        }
    }
}

/// Resolve operations in input order against the current state
pub fn resolve(
    operations: Vec<Operation>,
    current: &CurrentState,
    policies: &ResolutionPolicies,
    backup_dir: Option<&Path>,
) -> ResolveResult {
    let mut result = ResolveResult::default();
    for op in operations {
        result.absorb(resolve_operation(op, current, policies, backup_dir));
    }
    result
}

/// Detect and, if needed, apply policy to a single operation
pub fn resolve_operation(
    op: Operation,
    current: &CurrentState,
    policies: &ResolutionPolicies,
    backup_dir: Option<&Path>,
) -> ResolutionOutcome {
    match detect(&op, current) {
        Detection::Clean => ResolutionOutcome::ok(op),
        Detection::AlreadySatisfied => ResolutionOutcome::skip(),
        Detection::Conflicted(conflict) => {
            apply_policy(op, conflict, policies, backup_dir)
        }
    }
}

enum Detection {
    Clean,
    AlreadySatisfied,
    Conflicted(Conflict),
}

fn detect(op: &Operation, current: &CurrentState) -> Detection {
    match op.kind() {
        OperationKind::LinkCreate { source, target } => {
            if let Some(link) = current.link(target.as_path()) {
                if link.target == source.as_path() {
                    return Detection::AlreadySatisfied;
                }
                return Detection::Conflicted(
                    Conflict::new(
                        ConflictType::WrongLink,
                        target.clone(),
                        format!(
                            "points to {}, expected {}",
                            link.target.display(),
                            source
                        ),
                    )
                    .with_context("actual", link.target.display().to_string())
                    .with_context("expected", source.to_string()),
                );
            }
            if let Some(file) = current.file(target.as_path()) {
                return Detection::Conflicted(
                    Conflict::new(
                        ConflictType::FileExists,
                        target.clone(),
                        "a regular file occupies the link target",
                    )
                    .with_context("size", file.size.to_string()),
                );
            }
            if current.is_dir(target.as_path()) {
                return Detection::Conflicted(Conflict::new(
                    ConflictType::DirExpected,
                    target.clone(),
                    "a directory occupies the link target",
                ));
            }
            Detection::Clean
        }
        OperationKind::DirCreate { path } => {
            if current.is_dir(path.as_path()) {
                return Detection::AlreadySatisfied;
            }
            if current.file(path.as_path()).is_some() || current.link(path.as_path()).is_some() {
                return Detection::Conflicted(Conflict::new(
                    ConflictType::FileExpected,
                    path.clone(),
                    "a file occupies the directory path",
                ));
            }
            Detection::Clean
        }
        // Deletes, moves, and backups are produced against state the
        // planner already inspected; they pass through unchanged.
        _ => Detection::Clean,
    }
}

fn apply_policy(
    op: Operation,
    conflict: Conflict,
    policies: &ResolutionPolicies,
    backup_dir: Option<&Path>,
) -> ResolutionOutcome {
    let target = conflict.path.clone();
    match policies.for_conflict(conflict.kind) {
        ResolutionPolicy::Fail => ResolutionOutcome::conflicted(enrich(conflict)),
        ResolutionPolicy::Skip => ResolutionOutcome::skip_with_warning(
            Warning::new(
                WarningSeverity::Info,
                format!("Skipping due to conflict: {target}"),
            )
            .with_context("conflict", conflict.kind.to_string()),
        ),
        ResolutionPolicy::Overwrite => {
            let delete = Operation::link_delete(target.clone());
            let kept = op.with_dependency(delete.id().clone());
            let warning = Warning::new(
                WarningSeverity::Danger,
                format!("Overwriting existing entry: {target}"),
            )
            .with_context("conflict", conflict.kind.to_string());
            ResolutionOutcome::rewritten(vec![delete, kept], warning)
        }
        ResolutionPolicy::Backup => {
            let Some(backup_path) = backup_destination(&target, backup_dir) else {
                log::warn!("backup policy requested for {target} but no backup directory is configured");
                return ResolutionOutcome::conflicted(
                    enrich(conflict).with_context(
                        "note",
                        "backup policy unavailable: no backup directory configured",
                    ),
                );
            };
            let backup = Operation::file_backup(target.clone(), backup_path.clone());
            let delete = Operation::link_delete(target.clone()).with_dependency(backup.id().clone());
            let kept = op.with_dependency(delete.id().clone());
            let warning = Warning::new(
                WarningSeverity::Caution,
                format!("Backing up existing file: {target}"),
            )
            .with_context("backup", backup_path.to_string());
            ResolutionOutcome::rewritten(vec![backup, delete, kept], warning)
        }
    }
}

fn backup_destination(target: &FilePath, backup_dir: Option<&Path>) -> Option<FilePath> {
    let dir = backup_dir?;
    if dir.as_os_str().is_empty() {
        return None;
    }
    let name = target.file_name()?;
    FilePath::new(dir.join(name)).ok()
}

fn enrich(mut conflict: Conflict) -> Conflict {
    conflict.suggestions = suggestions_for(conflict.kind);
    conflict
}
