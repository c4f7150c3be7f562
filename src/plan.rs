// src/plan.rs

//! The plan artifact
//!
//! A plan is the final output of the pipeline: an ordered list of
//! operations plus metadata and a per-package attribution of operation
//! ids. Plans are immutable after construction and serialize to JSON
//! with stable field names; consumers filter on the conflict and
//! severity tags.
//!
//! A plan with conflicts is informational only: its operation list is
//! not topologically sorted and must not be executed. The metadata is
//! there so callers can render the conflicts and their suggestions.

use crate::error::Result;
use crate::operation::{Operation, OperationId, OperationKind};
use crate::resolver::{Conflict, Warning};
use serde::Serialize;
use std::collections::BTreeMap;

/// Counts and diagnostics describing a plan
#[derive(Debug, Clone, Serialize)]
pub struct PlanMetadata {
    pub package_count: usize,
    pub operation_count: usize,
    pub link_count: usize,
    pub dir_count: usize,
    pub conflicts: Vec<Conflict>,
    pub warnings: Vec<Warning>,
}

/// An ordered, conflict-resolved set of filesystem operations
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    operations: Vec<Operation>,
    metadata: PlanMetadata,
    package_operations: BTreeMap<String, Vec<OperationId>>,
}

impl Plan {
    /// Assemble a plan; counts are derived from the operations
    pub fn new(
        operations: Vec<Operation>,
        package_count: usize,
        conflicts: Vec<Conflict>,
        warnings: Vec<Warning>,
        package_operations: BTreeMap<String, Vec<OperationId>>,
    ) -> Self {
        let link_count = operations
            .iter()
            .filter(|op| matches!(op.kind(), OperationKind::LinkCreate { .. }))
            .count();
        let dir_count = operations
            .iter()
            .filter(|op| matches!(op.kind(), OperationKind::DirCreate { .. }))
            .count();
        let metadata = PlanMetadata {
            package_count,
            operation_count: operations.len(),
            link_count,
            dir_count,
            conflicts,
            warnings,
        };
        Self {
            operations,
            metadata,
            package_operations,
        }
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn metadata(&self) -> &PlanMetadata {
        &self.metadata
    }

    /// Operation ids attributed to each package by link/move source
    pub fn package_operations(&self) -> &BTreeMap<String, Vec<OperationId>> {
        &self.package_operations
    }

    pub fn has_conflicts(&self) -> bool {
        !self.metadata.conflicts.is_empty()
    }

    /// A plan is executable only when conflict-free
    pub fn is_executable(&self) -> bool {
        !self.has_conflicts()
    }

    /// Pretty-printed JSON rendering with stable field names
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
