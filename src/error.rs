// src/error.rs

//! Error taxonomy for the dot planning engine
//!
//! All fallible core operations return `Result<T>` with this crate-level
//! error. Kinds fall into five groups: user-input (`InvalidPath`,
//! `PackageNotFound`), structural (`CyclicDependency`), resource
//! (`SourceNotFound`, `PermissionDenied`, `NotFound`), wrapped I/O, and
//! cancellation. Cancellation is never wrapped in context so callers can
//! match on it directly after a deep pipeline run.

use std::path::PathBuf;
use thiserror::Error;

/// Crate-wide result alias
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// All errors produced by the planning engine and its adapters
#[derive(Debug, Error)]
pub enum Error {
    /// A path failed validation (empty, relative, traversal, non-canonical)
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// A named package does not exist under the package root
    #[error("package not found: {package}")]
    PackageNotFound { package: String },

    /// An operation's source path is missing
    #[error("source not found: {}", .path.display())]
    SourceNotFound { path: PathBuf },

    /// The filesystem denied an operation
    #[error("permission denied during {operation}: {}", .path.display())]
    PermissionDenied { path: PathBuf, operation: String },

    /// The operation graph contains a cycle; the list is a witness walk
    /// whose first and last entries are the same operation
    #[error("cyclic dependency: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    /// The path does not exist. Distinguishable by kind so callers can
    /// treat a missing manifest as an empty one.
    #[error("not found: {}", .path.display())]
    NotFound { path: PathBuf },

    /// An operation failed its preconditions before execution
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Caller-initiated cancellation; carries the stage or call site name
    #[error("cancelled during {0}")]
    Cancelled(String),

    /// Serialization of a plan or manifest failed
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A configuration file could not be parsed
    #[error("parse error: {0}")]
    Parse(String),

    /// Opaque I/O error from the filesystem adapter
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A wrapped error with prepended context; the causal chain is kept
    /// so kind checks keep working through `root_cause`
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap this error with context, preserving the chain.
    ///
    /// Cancellation passes through untouched: the pipeline contract is
    /// that callers can identity-match the cancellation they initiated.
    pub fn context(self, context: impl Into<String>) -> Self {
        match self {
            cancelled @ Error::Cancelled(_) => cancelled,
            source => Error::Context {
                context: context.into(),
                source: Box::new(source),
            },
        }
    }

    /// Innermost error in the chain, unwrapping any context layers
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Context { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// True if the chain bottoms out in caller-initiated cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self.root_cause(), Error::Cancelled(_))
    }

    /// True if the chain bottoms out in a missing path
    pub fn is_not_found(&self) -> bool {
        matches!(self.root_cause(), Error::NotFound { .. })
    }
}

/// Context-wrapping extension for `Result`
///
/// Mirrors the `"context: cause"` convention used in log output: the
/// message prepends, the source chain stays intact.
pub trait ResultExt<T> {
    /// Wrap the error with a static context message
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Wrap the error with a lazily built context message
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(context))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| e.context(f()))
    }
}
