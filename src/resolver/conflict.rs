// src/resolver/conflict.rs

//! Conflict and warning types
//!
//! A conflict is a structural disagreement between desired and current
//! state that prevents a specific operation without a resolution policy.
//! The string tags produced by `Display`/serde are a stable external
//! contract: consumers filter and pretty-print on them.

use crate::path::FilePath;
use serde::Serialize;
use std::collections::BTreeMap;
use strum_macros::Display;

/// Classification of a conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConflictType {
    /// A regular file occupies the link target
    FileExists,
    /// A symlink exists but points somewhere else
    WrongLink,
    /// The filesystem denied access
    Permission,
    /// A link chain loops
    Circular,
    /// A directory was expected at the path
    DirExpected,
    /// A file occupies a path that must become a directory
    FileExpected,
}

/// An actionable way out of a conflict
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub action: String,
    pub explanation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

impl Suggestion {
    pub fn new(action: &str, explanation: &str) -> Self {
        Self {
            action: action.to_string(),
            explanation: explanation.to_string(),
            example: None,
        }
    }

    pub fn with_example(mut self, example: &str) -> Self {
        self.example = Some(example.to_string());
        self
    }
}

/// A detected conflict with context and suggestions attached
#[derive(Debug, Clone, Serialize)]
pub struct Conflict {
    #[serde(rename = "type")]
    pub kind: ConflictType,
    pub path: FilePath,
    pub details: String,
    pub context: BTreeMap<String, String>,
    pub suggestions: Vec<Suggestion>,
}

impl Conflict {
    pub fn new(kind: ConflictType, path: FilePath, details: impl Into<String>) -> Self {
        Self {
            kind,
            path,
            details: details.into(),
            context: BTreeMap::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, key: &str, value: impl Into<String>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }
}

/// How loudly a warning should be rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WarningSeverity {
    Info,
    Caution,
    Danger,
}

/// Something the user should know about an executable plan
#[derive(Debug, Clone, Serialize)]
pub struct Warning {
    pub message: String,
    pub severity: WarningSeverity,
    pub context: BTreeMap<String, String>,
}

impl Warning {
    pub fn new(severity: WarningSeverity, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity,
            context: BTreeMap::new(),
        }
    }

    pub fn with_context(mut self, key: &str, value: impl Into<String>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }
}
