// src/scanner/dotfile.rs

//! Dotfile name translation
//!
//! Package trees store dotfiles without the leading dot so they stay
//! visible under version control: a file named `dot-vimrc` materializes as
//! `.vimrc` in the target. Translation is a pure rewrite of the basename;
//! parent components are never touched. The reverse direction is used when
//! adopting an existing file back into a package.

use std::path::{Path, PathBuf};

const DOT_PREFIX: &str = "dot-";

/// `dot-vimrc` -> `.vimrc`; any other name is unchanged
pub fn translate_dotfile(name: &str) -> String {
    match name.strip_prefix(DOT_PREFIX) {
        Some(rest) => format!(".{rest}"),
        None => name.to_string(),
    }
}

/// `.vimrc` -> `dot-vimrc`; names that are just `.` or not dot-prefixed
/// are unchanged
pub fn untranslate_dotfile(name: &str) -> String {
    match name.strip_prefix('.') {
        Some(rest) if !rest.is_empty() => format!("{DOT_PREFIX}{rest}"),
        _ => name.to_string(),
    }
}

/// Translate only the basename of `path`
pub fn translate_path(path: &Path) -> PathBuf {
    rewrite_basename(path, translate_dotfile)
}

/// Untranslate only the basename of `path`
pub fn untranslate_path(path: &Path) -> PathBuf {
    rewrite_basename(path, untranslate_dotfile)
}

fn rewrite_basename(path: &Path, rewrite: fn(&str) -> String) -> PathBuf {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return path.to_path_buf();
    };
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(rewrite(name)),
        _ => PathBuf::from(rewrite(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_prefix() {
        assert_eq!(translate_dotfile("dot-vimrc"), ".vimrc");
        assert_eq!(translate_dotfile("dot-config"), ".config");
        assert_eq!(translate_dotfile("vimrc"), "vimrc");
        assert_eq!(translate_dotfile(".vimrc"), ".vimrc");
    }

    #[test]
    fn test_untranslate_prefix() {
        assert_eq!(untranslate_dotfile(".vimrc"), "dot-vimrc");
        assert_eq!(untranslate_dotfile("vimrc"), "vimrc");
        assert_eq!(untranslate_dotfile("."), ".");
    }

    #[test]
    fn test_roundtrip_for_translated_names() {
        for name in ["dot-vimrc", "dot-config", "dot-a"] {
            assert_eq!(untranslate_dotfile(&translate_dotfile(name)), name);
        }
        for name in [".vimrc", ".bashrc"] {
            assert_eq!(translate_dotfile(&untranslate_dotfile(name)), name);
        }
    }

    #[test]
    fn test_path_translation_touches_basename_only() {
        assert_eq!(
            translate_path(Path::new("/pkgs/vim/dot-vimrc")),
            PathBuf::from("/pkgs/vim/.vimrc")
        );
        // A parent that happens to carry the prefix stays untouched.
        assert_eq!(
            translate_path(Path::new("dot-config/dot-gitconfig")),
            PathBuf::from("dot-config/.gitconfig")
        );
        assert_eq!(
            untranslate_path(Path::new("/home/u/.vimrc")),
            PathBuf::from("/home/u/dot-vimrc")
        );
    }

    #[test]
    fn test_relative_single_component() {
        assert_eq!(translate_path(Path::new("dot-vimrc")), PathBuf::from(".vimrc"));
    }
}
