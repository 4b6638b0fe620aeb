use crate::errors::CoreError;
use std::fs::{self, File, Metadata, OpenOptions, Permissions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Filesystem abstraction boundary for operation implementations.
///
/// Every method re-queries the filesystem; nothing is cached between calls.
/// Errors are classified against the path they concern.
pub trait FileSystem: Send + Sync {
    /// Reads file metadata, following symlinks.
    fn metadata(&self, path: &Path) -> crate::Result<Metadata>;

    /// Reads metadata of the path itself without following symlinks.
    fn symlink_metadata(&self, path: &Path) -> crate::Result<Metadata>;

    /// Creates a directory and all missing parent directories.
    fn create_dir_all(&self, path: &Path) -> crate::Result<()>;

    /// Creates (or truncates) a file and leaves it empty.
    fn create_empty(&self, path: &Path) -> crate::Result<()>;

    /// Replaces the whole content of a file.
    fn write(&self, path: &Path, data: &[u8]) -> crate::Result<()>;

    /// Appends to a file, creating it when missing.
    fn append(&self, path: &Path, data: &[u8]) -> crate::Result<()>;

    /// Reads UTF-8 text.
    fn read_to_string(&self, path: &Path) -> crate::Result<String>;

    /// Removes a file.
    fn remove_file(&self, path: &Path) -> crate::Result<()>;

    /// Removes an empty directory.
    fn remove_dir(&self, path: &Path) -> crate::Result<()>;

    /// Removes a directory together with all of its contents.
    fn remove_dir_all(&self, path: &Path) -> crate::Result<()>;

    /// Renames/moves a path.
    fn rename(&self, from: &Path, to: &Path) -> crate::Result<()>;

    /// Copies file content and permission bits, returning the bytes copied.
    fn copy(&self, from: &Path, to: &Path) -> crate::Result<u64>;

    /// Lists directory children as `(name, is_dir)` in enumeration order.
    fn list_dir(&self, path: &Path) -> crate::Result<Vec<(String, bool)>>;

    /// Applies permission bits.
    fn set_permissions(&self, path: &Path, permissions: Permissions) -> crate::Result<()>;
}

/// Default filesystem implementation backed by `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn metadata(&self, path: &Path) -> crate::Result<Metadata> {
        fs::metadata(path).map_err(|err| CoreError::io(path, err))
    }

    fn symlink_metadata(&self, path: &Path) -> crate::Result<Metadata> {
        fs::symlink_metadata(path).map_err(|err| CoreError::io(path, err))
    }

    fn create_dir_all(&self, path: &Path) -> crate::Result<()> {
        fs::create_dir_all(path).map_err(|err| CoreError::io(path, err))
    }

    fn create_empty(&self, path: &Path) -> crate::Result<()> {
        File::create(path)
            .map(drop)
            .map_err(|err| CoreError::io(path, err))
    }

    fn write(&self, path: &Path, data: &[u8]) -> crate::Result<()> {
        fs::write(path, data).map_err(|err| CoreError::io(path, err))
    }

    fn append(&self, path: &Path, data: &[u8]) -> crate::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|err| CoreError::io(path, err))?;
        file.write_all(data).map_err(|err| CoreError::io(path, err))
    }

    fn read_to_string(&self, path: &Path) -> crate::Result<String> {
        fs::read_to_string(path).map_err(|err| CoreError::io(path, err))
    }

    fn remove_file(&self, path: &Path) -> crate::Result<()> {
        fs::remove_file(path).map_err(|err| CoreError::io(path, err))
    }

    fn remove_dir(&self, path: &Path) -> crate::Result<()> {
        fs::remove_dir(path).map_err(|err| CoreError::io(path, err))
    }

    fn remove_dir_all(&self, path: &Path) -> crate::Result<()> {
        fs::remove_dir_all(path).map_err(|err| CoreError::io(path, err))
    }

    fn rename(&self, from: &Path, to: &Path) -> crate::Result<()> {
        fs::rename(from, to).map_err(|err| CoreError::io(from, err))
    }

    fn copy(&self, from: &Path, to: &Path) -> crate::Result<u64> {
        fs::copy(from, to).map_err(|err| CoreError::io(from, err))
    }

    fn list_dir(&self, path: &Path) -> crate::Result<Vec<(String, bool)>> {
        let entries = fs::read_dir(path).map_err(|err| CoreError::io(path, err))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| CoreError::io(path, err))?;
            let is_dir = entry.path().is_dir();
            names.push((entry.file_name().to_string_lossy().into_owned(), is_dir));
        }
        Ok(names)
    }

    fn set_permissions(&self, path: &Path, permissions: Permissions) -> crate::Result<()> {
        fs::set_permissions(path, permissions).map_err(|err| CoreError::io(path, err))
    }
}

/// Joins a parent directory and a child name the way `mkdir`/`touch` address targets.
pub fn child_path(parent: &str, name: &str) -> PathBuf {
    Path::new(parent).join(name)
}

/// Real filesystem that refuses to stat one file name, for exercising
/// failures partway through a tree walk.
#[cfg(test)]
pub(crate) struct FailingFileSystem {
    pub(crate) unreadable: &'static str,
}

#[cfg(test)]
impl FailingFileSystem {
    fn check(&self, path: &Path) -> crate::Result<()> {
        if path.file_name().and_then(|name| name.to_str()) == Some(self.unreadable) {
            return Err(CoreError::io(
                path,
                std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
impl FileSystem for FailingFileSystem {
    fn metadata(&self, path: &Path) -> crate::Result<Metadata> {
        self.check(path)?;
        RealFileSystem.metadata(path)
    }

    fn symlink_metadata(&self, path: &Path) -> crate::Result<Metadata> {
        RealFileSystem.symlink_metadata(path)
    }

    fn create_dir_all(&self, path: &Path) -> crate::Result<()> {
        RealFileSystem.create_dir_all(path)
    }

    fn create_empty(&self, path: &Path) -> crate::Result<()> {
        RealFileSystem.create_empty(path)
    }

    fn write(&self, path: &Path, data: &[u8]) -> crate::Result<()> {
        RealFileSystem.write(path, data)
    }

    fn append(&self, path: &Path, data: &[u8]) -> crate::Result<()> {
        RealFileSystem.append(path, data)
    }

    fn read_to_string(&self, path: &Path) -> crate::Result<String> {
        RealFileSystem.read_to_string(path)
    }

    fn remove_file(&self, path: &Path) -> crate::Result<()> {
        RealFileSystem.remove_file(path)
    }

    fn remove_dir(&self, path: &Path) -> crate::Result<()> {
        RealFileSystem.remove_dir(path)
    }

    fn remove_dir_all(&self, path: &Path) -> crate::Result<()> {
        RealFileSystem.remove_dir_all(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> crate::Result<()> {
        RealFileSystem.rename(from, to)
    }

    fn copy(&self, from: &Path, to: &Path) -> crate::Result<u64> {
        self.check(from)?;
        RealFileSystem.copy(from, to)
    }

    fn list_dir(&self, path: &Path) -> crate::Result<Vec<(String, bool)>> {
        RealFileSystem.list_dir(path)
    }

    fn set_permissions(&self, path: &Path, permissions: Permissions) -> crate::Result<()> {
        RealFileSystem.set_permissions(path, permissions)
    }
}
