// src/resolver/policy.rs

//! Resolution policies
//!
//! A policy tells the resolver how to react to one class of conflict.
//! Everything defaults to `Fail`: no destructive choice is ever made
//! without the user asking for it.

use super::conflict::ConflictType;
use serde::{Deserialize, Serialize};

/// Reaction to a detected conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPolicy {
    /// Surface the conflict and drop the operation
    #[default]
    Fail,
    /// Preserve the existing file in the backup directory, then proceed
    Backup,
    /// Remove the existing entry and proceed
    Overwrite,
    /// Drop the operation and note it in a warning
    Skip,
}

/// Per-conflict-type policy selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionPolicies {
    pub on_file_exists: ResolutionPolicy,
    pub on_wrong_link: ResolutionPolicy,
    pub on_permission_err: ResolutionPolicy,
    pub on_circular: ResolutionPolicy,
    pub on_type_mismatch: ResolutionPolicy,
}

impl ResolutionPolicies {
    /// The policy governing a given conflict type
    pub fn for_conflict(&self, kind: ConflictType) -> ResolutionPolicy {
        match kind {
            ConflictType::FileExists => self.on_file_exists,
            ConflictType::WrongLink => self.on_wrong_link,
            ConflictType::Permission => self.on_permission_err,
            ConflictType::Circular => self.on_circular,
            ConflictType::DirExpected | ConflictType::FileExpected => self.on_type_mismatch,
        }
    }
}
