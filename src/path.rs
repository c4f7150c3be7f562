// src/path.rs

//! Phantom-typed path values and composable path validators
//!
//! A path value carries a compile-time tag identifying its kind: a package
//! root, the target root, or a file/directory known to live under one of
//! the roots. All three share representation and operations but cannot be
//! assigned across tags without an explicit constructor, so handing a
//! target path to code expecting a package path is rejected statically.
//!
//! Construction is validated: paths must be non-empty, absolute, and
//! traversal-free. The stored form is always the lexically cleaned form
//! (redundant separators and `.` components removed), so equality is plain
//! byte equality.

use crate::error::{Error, Result};
use serde::{Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::path::{Component, Path, PathBuf};

/// Marker for a package root directory
#[derive(Debug)]
pub enum PackageRoot {}

/// Marker for the target root directory
#[derive(Debug)]
pub enum TargetRoot {}

/// Marker for a file or directory under one of the roots
#[derive(Debug)]
pub enum AnyFile {}

/// A validated absolute path tagged with its kind
pub struct TypedPath<K> {
    inner: PathBuf,
    _kind: PhantomData<K>,
}

/// A validated package root path
pub type PackagePath = TypedPath<PackageRoot>;

/// A validated target root path
pub type TargetPath = TypedPath<TargetRoot>;

/// A validated path to a file or directory under a root
pub type FilePath = TypedPath<AnyFile>;

impl<K> TypedPath<K> {
    fn from_validated(inner: PathBuf) -> Self {
        Self {
            inner,
            _kind: PhantomData,
        }
    }

    /// The underlying path
    pub fn as_path(&self) -> &Path {
        &self.inner
    }

    /// Join a relative element, widening the tag to `FilePath`
    ///
    /// The result is lexically cleaned, so joining never produces a
    /// non-canonical value.
    pub fn join(&self, elem: impl AsRef<Path>) -> FilePath {
        TypedPath::from_validated(clean(&self.inner.join(elem.as_ref())))
    }

    /// Parent path, preserving the tag
    ///
    /// Fails for filesystem roots, which have no parent.
    pub fn parent(&self) -> Result<TypedPath<K>> {
        match self.inner.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                Ok(TypedPath::from_validated(parent.to_path_buf()))
            }
            _ => Err(Error::InvalidPath {
                path: self.inner.display().to_string(),
                reason: "root path has no parent".to_string(),
            }),
        }
    }

    /// Final path component, if any
    pub fn file_name(&self) -> Option<&str> {
        self.inner.file_name().and_then(|n| n.to_str())
    }

    /// Re-tag as a plain file path (a root is itself a directory entry
    /// under scanning)
    pub fn as_file_path(&self) -> FilePath {
        TypedPath::from_validated(self.inner.clone())
    }

    /// Consume into the underlying `PathBuf`
    pub fn into_path_buf(self) -> PathBuf {
        self.inner
    }
}

impl PackagePath {
    /// Validate and construct a package root path
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        validated(path.as_ref()).map(Self::from_validated)
    }
}

impl TargetPath {
    /// Validate and construct a target root path
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        validated(path.as_ref()).map(Self::from_validated)
    }
}

impl FilePath {
    /// Validate and construct a file path
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        validated(path.as_ref()).map(Self::from_validated)
    }
}

// Manual impls: the phantom parameter must not pick up trait bounds from
// derives (the markers are uninhabited).

impl<K> Clone for TypedPath<K> {
    fn clone(&self) -> Self {
        Self::from_validated(self.inner.clone())
    }
}

impl<K> PartialEq for TypedPath<K> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<K> Eq for TypedPath<K> {}

impl<K> Hash for TypedPath<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.hash(state);
    }
}

impl<K> PartialOrd for TypedPath<K> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<K> Ord for TypedPath<K> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.inner.cmp(&other.inner)
    }
}

impl<K> fmt::Debug for TypedPath<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.inner)
    }
}

impl<K> fmt::Display for TypedPath<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner.display())
    }
}

impl<K> AsRef<Path> for TypedPath<K> {
    fn as_ref(&self) -> &Path {
        &self.inner
    }
}

impl<K> Serialize for TypedPath<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.inner.serialize(serializer)
    }
}

/// Lexically clean a path: drop redundant separators and `.` components.
///
/// `..` components are preserved so the traversal validator can reject
/// them; this is cleaning, not resolution.
pub fn clean(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            other => cleaned.push(other.as_os_str()),
        }
    }
    cleaned
}

fn validated(path: &Path) -> Result<PathBuf> {
    let cleaned = clean(path);
    let display = cleaned.display().to_string();
    validate_with(
        &[
            &NonEmptyPathValidator,
            &AbsolutePathValidator,
            &TraversalFreeValidator,
        ],
        &cleaned,
    )?;
    // The stored form is the cleaned form; re-cleaning is a fixpoint.
    debug_assert_eq!(clean(&cleaned), cleaned, "clean must be idempotent: {display}");
    Ok(cleaned)
}

/// True if `path` is lexically under `base`: the relative remainder is
/// non-empty and does not start with `..`
pub fn is_under(path: &Path, base: &Path) -> bool {
    match path.strip_prefix(base) {
        Ok(rest) => !rest.as_os_str().is_empty(),
        Err(_) => false,
    }
}

/// Single-check path validator
///
/// Validators are values so callers can compose the chain that fits the
/// construction site.
pub trait PathValidator {
    /// Return the first problem found with `path`, if any
    fn validate(&self, path: &Path) -> Result<()>;
}

/// Rejects empty paths
pub struct NonEmptyPathValidator;

impl PathValidator for NonEmptyPathValidator {
    fn validate(&self, path: &Path) -> Result<()> {
        if path.as_os_str().is_empty() {
            return Err(Error::InvalidPath {
                path: String::new(),
                reason: "path is empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Rejects relative paths
pub struct AbsolutePathValidator;

impl PathValidator for AbsolutePathValidator {
    fn validate(&self, path: &Path) -> Result<()> {
        if !path.is_absolute() {
            return Err(Error::InvalidPath {
                path: path.display().to_string(),
                reason: "path must be absolute".to_string(),
            });
        }
        Ok(())
    }
}

/// Rejects absolute paths
pub struct RelativePathValidator;

impl PathValidator for RelativePathValidator {
    fn validate(&self, path: &Path) -> Result<()> {
        if path.is_absolute() {
            return Err(Error::InvalidPath {
                path: path.display().to_string(),
                reason: "path must be relative".to_string(),
            });
        }
        Ok(())
    }
}

/// Rejects `..` components and any path that differs from its cleaned form
pub struct TraversalFreeValidator;

impl PathValidator for TraversalFreeValidator {
    fn validate(&self, path: &Path) -> Result<()> {
        if path
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(Error::InvalidPath {
                path: path.display().to_string(),
                reason: "path traversal (`..`) is not allowed".to_string(),
            });
        }
        if clean(path) != path {
            return Err(Error::InvalidPath {
                path: path.display().to_string(),
                reason: "path is not in canonical form".to_string(),
            });
        }
        Ok(())
    }
}

/// Apply validators in order, returning the first error
pub fn validate_with(validators: &[&dyn PathValidator], path: &Path) -> Result<()> {
    for validator in validators {
        validator.validate(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_cleans_and_validates() {
        let p = FilePath::new("/home/u/./config//nvim").unwrap();
        assert_eq!(p.as_path(), Path::new("/home/u/config/nvim"));
    }

    #[test]
    fn test_construction_is_a_fixpoint() {
        let p = PackagePath::new("/pkgs/vim").unwrap();
        let again = PackagePath::new(p.as_path()).unwrap();
        assert_eq!(p, again);
        assert_eq!(clean(p.as_path()), p.as_path());
    }

    #[test]
    fn test_relative_path_rejected() {
        assert!(FilePath::new("pkgs/vim").is_err());
        assert!(TargetPath::new("./home").is_err());
    }

    #[test]
    fn test_empty_path_rejected() {
        assert!(FilePath::new("").is_err());
    }

    #[test]
    fn test_traversal_rejected() {
        assert!(FilePath::new("/pkgs/../etc/passwd").is_err());
        assert!(PackagePath::new("/pkgs/vim/..").is_err());
    }

    #[test]
    fn test_join_widens_to_file_path() {
        let root = TargetPath::new("/home/u").unwrap();
        let joined: FilePath = root.join(".vimrc");
        assert_eq!(joined.as_path(), Path::new("/home/u/.vimrc"));
    }

    #[test]
    fn test_parent_preserves_tag_and_fails_for_root() {
        let p = PackagePath::new("/pkgs/vim").unwrap();
        let parent: PackagePath = p.parent().unwrap();
        assert_eq!(parent.as_path(), Path::new("/pkgs"));

        let root = FilePath::new("/").unwrap();
        assert!(root.parent().is_err());
    }

    #[test]
    fn test_equality_is_byte_equality() {
        let a = FilePath::new("/home/u/.vimrc").unwrap();
        let b = FilePath::new("/home/u//.vimrc").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_is_under() {
        let base = Path::new("/pkgs/vim");
        assert!(is_under(Path::new("/pkgs/vim/dot-vimrc"), base));
        assert!(!is_under(Path::new("/pkgs/vim"), base));
        assert!(!is_under(Path::new("/other/vimrc"), base));
    }

    #[test]
    fn test_validate_with_returns_first_error() {
        let err = validate_with(
            &[&NonEmptyPathValidator, &AbsolutePathValidator],
            Path::new(""),
        )
        .unwrap_err();
        match err {
            Error::InvalidPath { reason, .. } => assert_eq!(reason, "path is empty"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_relative_validator() {
        assert!(RelativePathValidator.validate(Path::new("colors/desert.vim")).is_ok());
        assert!(RelativePathValidator.validate(Path::new("/colors")).is_err());
    }
}
