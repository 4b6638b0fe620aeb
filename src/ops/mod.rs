//! The operation set. Each operation performs one filesystem, OS or process
//! action and returns the lines to print, or a classified [`CoreError`].

pub mod archive;
pub mod content;
pub mod files;
pub mod system;

use std::path::{Path, PathBuf};
use std::{env, io};

use crate::errors::CoreError;

/// Converts a tree-walk failure into an error naming the offending path.
pub(crate) fn walk_error(root: &Path, err: walkdir::Error) -> CoreError {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    match err.into_io_error() {
        Some(io_err) => CoreError::io(path, io_err),
        None => CoreError::Io(
            path,
            io::Error::new(io::ErrorKind::Other, "filesystem loop detected"),
        ),
    }
}

/// Absolute, symlink-free form of a path that may not exist yet: the deepest
/// existing ancestor is canonicalized and the remaining components appended.
pub(crate) fn resolve_pending(path: &Path) -> Option<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir().ok()?.join(path)
    };

    let mut existing = absolute.as_path();
    let mut missing = Vec::new();
    loop {
        if let Ok(real) = existing.canonicalize() {
            return Some(missing.iter().rev().fold(real, |acc, part| acc.join(part)));
        }
        missing.push(existing.file_name()?.to_os_string());
        existing = existing.parent()?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_pending_appends_missing_components() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        fs::create_dir(root.join("real")).unwrap();

        let pending = tmp.path().join("real").join("a").join("b");
        assert_eq!(resolve_pending(&pending), Some(root.join("real/a/b")));
        assert_eq!(resolve_pending(&root.join("real")), Some(root.join("real")));
    }
}
