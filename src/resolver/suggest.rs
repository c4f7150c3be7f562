// src/resolver/suggest.rs

//! Suggestion enrichment
//!
//! Every conflict that survives resolution gets a fixed, deterministic
//! set of actionable suggestions attached, keyed by conflict type.

use super::conflict::{ConflictType, Suggestion};

/// The suggestion set for a conflict type
pub fn suggestions_for(kind: ConflictType) -> Vec<Suggestion> {
    match kind {
        ConflictType::FileExists => vec![
            Suggestion::new(
                "use the backup policy",
                "preserves the existing file in the backup directory before linking",
            )
            .with_example("dot manage --on-file-exists backup <package>"),
            Suggestion::new(
                "adopt the file into the package",
                "moves the existing file into the package so it becomes the link source",
            ),
            Suggestion::new(
                "remove the file manually",
                "delete it yourself if its content is no longer needed",
            ),
        ],
        ConflictType::WrongLink => vec![
            Suggestion::new(
                "uninstall the other package",
                "another package may own this target; unmanage it first",
            ),
            Suggestion::new(
                "use the overwrite policy",
                "replaces the existing link with the desired one",
            )
            .with_example("dot manage --on-wrong-link overwrite <package>"),
            Suggestion::new(
                "inspect the link",
                "check where the existing link points before deciding",
            )
            .with_example("ls -l <target>"),
        ],
        ConflictType::Permission => vec![
            Suggestion::new(
                "check directory permissions",
                "the target directory may not be writable by your user",
            ),
            Suggestion::new("run with elevated privileges", "only if the target genuinely requires it"),
            Suggestion::new(
                "change ownership",
                "chown the target directory to your user",
            )
            .with_example("chown -R $USER <dir>"),
        ],
        ConflictType::Circular => vec![
            Suggestion::new(
                "inspect the link chain",
                "follow each link to find where the loop closes",
            ),
            Suggestion::new("remove the offending link", "break the loop at its newest edge"),
            Suggestion::new(
                "review the package structure",
                "a package linking into itself usually indicates a layout mistake",
            ),
        ],
        ConflictType::DirExpected | ConflictType::FileExpected => vec![
            Suggestion::new(
                "remove the conflicting node",
                "the existing entry has the wrong type for this path",
            ),
            Suggestion::new(
                "review the package layout",
                "a file and a directory are competing for the same target path",
            ),
            Suggestion::new(
                "back up and remove",
                "preserve the existing entry elsewhere, then remove it",
            ),
        ],
    }
}
