// src/lib.rs

//! dot: a symlink-farm dotfile manager
//!
//! Packages are self-contained directory trees of configuration files;
//! dot materializes them into a target directory (typically the user's
//! home) as symbolic links. The core is a pure, deterministic planning
//! pipeline:
//!
//! - **Scan**: build each package tree through the filesystem port,
//!   filtered by ignore patterns
//! - **Plan**: turn trees into desired links and directories, applying
//!   dotfile name translation (`dot-vimrc` -> `.vimrc`)
//! - **Resolve**: compare desired against observed state, applying
//!   per-conflict-type policies and attaching suggestions
//! - **Sort**: order operations over their dependency graph, rejecting
//!   cycles
//!
//! Execution and rollback, the manifest store, configuration, and the
//! CLI sit around that core and talk to it through value types only.

pub mod cancel;
pub mod cli;
pub mod commands;
pub mod config;
mod error;
pub mod executor;
pub mod filesystem;
pub mod graph;
pub mod ignore;
pub mod lock;
pub mod manifest;
pub mod operation;
pub mod path;
pub mod pipeline;
pub mod plan;
pub mod planner;
pub mod resolver;
pub mod scanner;
pub mod state;

pub use cancel::CancelToken;
pub use error::{Error, Result, ResultExt};
pub use executor::{ExecutionResult, Executor};
pub use filesystem::{DirEntry, EntryKind, FileInfo, Filesystem, MemoryFilesystem, OsFilesystem};
pub use graph::DependencyGraph;
pub use ignore::{IgnorePattern, IgnoreSet};
pub use manifest::{LinkRecord, Manifest, ManifestStore, PackageRecord};
pub use operation::{Operation, OperationId, OperationKind};
pub use path::{FilePath, PackagePath, TargetPath};
pub use pipeline::{plan_adopt, plan_install, plan_replan, plan_uninstall, PlanningContext};
pub use plan::{Plan, PlanMetadata};
pub use planner::{DesiredState, DirSpec, LinkSpec};
pub use resolver::{
    resolve, Conflict, ConflictType, OutcomeStatus, ResolutionOutcome, ResolutionPolicies,
    ResolutionPolicy, ResolveResult, Suggestion, Warning, WarningSeverity,
};
pub use scanner::{Node, NodeKind, Package};
pub use state::{CurrentState, FileState, LinkState};
