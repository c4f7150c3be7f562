// src/executor.rs

//! Plan execution with rollback
//!
//! Drives a plan's operations in order through the filesystem port. An
//! operation moves from pending to executing to done; the first failure
//! stops the run and rolls back every completed operation in reverse
//! order, best-effort. A conflicted plan is refused outright.

use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::filesystem::Filesystem;
use crate::operation::{Operation, OperationId};
use crate::plan::Plan;

/// Outcome of an execution run
#[derive(Debug, Default)]
pub struct ExecutionResult {
    /// Operations that completed, in execution order
    pub executed: Vec<OperationId>,
    /// Operations that failed (at most one per run)
    pub failed: Vec<OperationId>,
    /// Operations whose rollback completed, in rollback order
    pub rolled_back: Vec<OperationId>,
    /// Every error observed, execution and rollback alike
    pub errors: Vec<Error>,
}

impl ExecutionResult {
    /// True if every operation completed
    pub fn success(&self) -> bool {
        self.failed.is_empty() && self.errors.is_empty()
    }

    /// True if some operations completed before the run failed
    pub fn partial_failure(&self) -> bool {
        !self.success() && !self.executed.is_empty()
    }
}

/// Executes plans against a filesystem port
pub struct Executor<'a> {
    fs: &'a dyn Filesystem,
    cancel: &'a CancelToken,
}

impl<'a> Executor<'a> {
    pub fn new(fs: &'a dyn Filesystem, cancel: &'a CancelToken) -> Self {
        Self { fs, cancel }
    }

    /// Run the plan's operations in order, rolling back on failure.
    ///
    /// Returns `Err` only when the plan itself is not executable; all
    /// runtime failures are reported through the result.
    pub fn execute(&self, plan: &Plan) -> Result<ExecutionResult> {
        if !plan.is_executable() {
            return Err(Error::InvalidOperation(format!(
                "refusing to execute a plan with {} unresolved conflicts",
                plan.metadata().conflicts.len()
            )));
        }

        let mut result = ExecutionResult::default();
        let mut completed: Vec<&Operation> = Vec::new();

        for op in plan.operations() {
            let attempt = self
                .cancel
                .check("execute")
                .and_then(|()| op.validate())
                .and_then(|()| {
                    log::debug!("executing {op}");
                    op.execute(self.fs, self.cancel)
                });

            match attempt {
                Ok(()) => {
                    result.executed.push(op.id().clone());
                    completed.push(op);
                }
                Err(e) => {
                    log::warn!("{op} failed: {e}");
                    result.failed.push(op.id().clone());
                    result.errors.push(e.context(format!("executing {op}")));
                    self.rollback(&completed, &mut result);
                    break;
                }
            }
        }

        Ok(result)
    }

    fn rollback(&self, completed: &[&Operation], result: &mut ExecutionResult) {
        for op in completed.iter().rev() {
            match op.rollback(self.fs, self.cancel) {
                Ok(()) => result.rolled_back.push(op.id().clone()),
                Err(e) => {
                    log::warn!("rollback of {op} failed: {e}");
                    result.errors.push(e.context(format!("rolling back {op}")));
                }
            }
        }
    }
}
