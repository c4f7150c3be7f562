// src/ignore.rs

//! Ignore patterns for package scanning
//!
//! User-supplied globs are compiled into anchored regular expressions.
//! Matching is tried against the full path and against the basename, so a
//! pattern like `.git` prunes that directory anywhere in a package tree.
//!
//! Glob grammar: `*` matches any run of characters, `?` matches a single
//! character. Bracket expressions are treated as literal text rather than
//! character classes; all other regex metacharacters are escaped.

use crate::error::{Error, Result};
use regex::Regex;
use std::path::Path;

/// A compiled ignore pattern, keeping the original glob for display
#[derive(Debug, Clone)]
pub struct IgnorePattern {
    glob: String,
    regex: Regex,
}

impl IgnorePattern {
    /// Compile a glob into an anchored pattern
    pub fn new(glob: &str) -> Result<Self> {
        let regex = Regex::new(&glob_to_regex(glob)).map_err(|e| Error::InvalidPath {
            path: glob.to_string(),
            reason: format!("invalid ignore pattern: {e}"),
        })?;
        Ok(Self {
            glob: glob.to_string(),
            regex,
        })
    }

    /// The original glob text
    pub fn glob(&self) -> &str {
        &self.glob
    }

    /// Test a single string (a full path or a basename)
    pub fn matches(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Translate a glob to an anchored regex.
///
/// `[` and `]` are escaped literally instead of opening a bracket
/// expression; honoring character classes here has surprised users of
/// similar tools, so the whole glob stays literal apart from `*` and `?`.
fn glob_to_regex(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() + 8);
    out.push('^');
    for ch in glob.chars() {
        match ch {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '.' | '+' | '(' | ')' | '|' | '^' | '$' | '{' | '}' | '[' | ']' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            other => out.push(other),
        }
    }
    out.push('$');
    out
}

/// A set of ignore patterns applied during scanning
#[derive(Debug, Clone)]
pub struct IgnoreSet {
    patterns: Vec<IgnorePattern>,
}

impl IgnoreSet {
    /// An empty set that ignores nothing
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    /// Compile and add a glob
    pub fn add(&mut self, glob: &str) -> Result<()> {
        self.patterns.push(IgnorePattern::new(glob)?);
        Ok(())
    }

    /// Add an already compiled pattern
    pub fn add_pattern(&mut self, pattern: IgnorePattern) {
        self.patterns.push(pattern);
    }

    /// Number of patterns in the set
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// True if the set contains no patterns
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// True if the full path or its basename matches any pattern
    pub fn should_ignore(&self, path: &Path) -> bool {
        let full = path.to_string_lossy();
        let base = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.patterns
            .iter()
            .any(|p| p.matches(&full) || p.matches(&base))
    }
}

impl Default for IgnoreSet {
    /// The default set prunes version control and OS litter
    fn default() -> Self {
        let mut set = Self::empty();
        for glob in [".git", ".DS_Store"] {
            set.add(glob).expect("default ignore patterns are valid");
        }
        set
    }
}
