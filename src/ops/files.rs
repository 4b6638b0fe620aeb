//! Filesystem operations: list, mkdir, touch, rm, mv, cp, find, du.

use std::fs::Metadata;
use std::path::Path;

use filetime::FileTime;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::errors::{CoreError, Result};
use crate::fs::{child_path, FileSystem};
use crate::helpers::{print_size, relative_display};
use crate::models::{CommandKind, CommandOutput};

use super::{resolve_pending, walk_error};

/// Lists the immediate entries of a directory in enumeration order.
pub fn list(fs: &dyn FileSystem, path: &str) -> Result<CommandOutput> {
    let dir = Path::new(path);
    if !fs.metadata(dir)?.is_dir() {
        return Err(CoreError::NotADirectory(dir.to_path_buf()));
    }

    let mut lines = vec![format!("Contents of '{path}':")];
    for (name, is_dir) in fs.list_dir(dir)? {
        let marker = if is_dir { "/" } else { "" };
        lines.push(format!("- {name}{marker}"));
    }
    Ok(CommandOutput::success(CommandKind::List, lines))
}

/// Creates `<path>/<name>` along with any missing parents.
pub fn mkdir(fs: &dyn FileSystem, path: &str, name: &str) -> Result<CommandOutput> {
    let target = child_path(path, name);
    if fs.symlink_metadata(&target).is_ok() {
        return Err(CoreError::AlreadyExists(target));
    }
    fs.create_dir_all(&target)?;
    info!(path = %target.display(), "Folder created");
    Ok(CommandOutput::line(
        CommandKind::Mkdir,
        format!("Folder '{name}' created successfully at '{path}'."),
    ))
}

/// Creates an empty file at `<path>/<name>`, truncating an existing one.
pub fn touch(fs: &dyn FileSystem, path: &str, name: &str) -> Result<CommandOutput> {
    let target = child_path(path, name);
    fs.create_empty(&target)?;
    info!(path = %target.display(), "Empty file created");
    Ok(CommandOutput::line(
        CommandKind::Touch,
        format!("Empty file '{name}' created successfully at '{path}'."),
    ))
}

/// Deletes a file, an empty directory, or with `recursive` a whole tree.
pub fn remove(fs: &dyn FileSystem, path: &str, recursive: bool) -> Result<CommandOutput> {
    let target = Path::new(path);
    let file_type = fs.symlink_metadata(target)?.file_type();

    let message = if file_type.is_file() || file_type.is_symlink() {
        fs.remove_file(target)?;
        format!("File '{path}' deleted successfully.")
    } else if file_type.is_dir() {
        if recursive {
            fs.remove_dir_all(target)?;
            format!("Directory '{path}' and its contents deleted successfully.")
        } else {
            if !fs.list_dir(target)?.is_empty() {
                return Err(CoreError::DirectoryNotEmpty(target.to_path_buf()));
            }
            fs.remove_dir(target)?;
            format!("Empty directory '{path}' deleted successfully.")
        }
    } else {
        return Err(CoreError::UnsupportedFileType(target.to_path_buf()));
    };

    info!(path = %target.display(), recursive, "Deleted");
    Ok(CommandOutput::line(CommandKind::Remove, message))
}

/// Renames or relocates a path. An existing destination is never replaced.
pub fn rename(fs: &dyn FileSystem, old_path: &str, new_path: &str) -> Result<CommandOutput> {
    let from = Path::new(old_path);
    let to = Path::new(new_path);
    fs.symlink_metadata(from)?;
    if fs.symlink_metadata(to).is_ok() {
        return Err(CoreError::AlreadyExists(to.to_path_buf()));
    }

    fs.rename(from, to).map_err(|err| match err {
        CoreError::NotFound(_) => CoreError::NotFound(to.to_path_buf()),
        other => other,
    })?;
    info!(from = %from.display(), to = %to.display(), "Renamed");
    Ok(CommandOutput::line(
        CommandKind::Move,
        format!("'{old_path}' successfully renamed/moved to '{new_path}'."),
    ))
}

/// Copies a file (overwriting the destination) or a directory tree (which
/// must not already exist at the destination, nor lie inside the source).
/// A tree copy that fails partway is removed again.
pub fn copy(fs: &dyn FileSystem, source: &str, dest: &str) -> Result<CommandOutput> {
    let src = Path::new(source);
    let dst = Path::new(dest);
    let metadata = fs.metadata(src)?;

    if metadata.is_dir() {
        if fs.symlink_metadata(dst).is_ok() {
            return Err(CoreError::AlreadyExists(dst.to_path_buf()));
        }
        if let (Some(src_real), Some(dst_real)) = (resolve_pending(src), resolve_pending(dst)) {
            if dst_real.starts_with(&src_real) {
                return Err(CoreError::Overlap(src.to_path_buf(), dst.to_path_buf()));
            }
        }

        let files = match copy_tree(fs, src, dst) {
            Ok(files) => files,
            Err(err) => {
                if fs.symlink_metadata(dst).is_ok() {
                    if let Err(cleanup) = fs.remove_dir_all(dst) {
                        warn!(path = %dst.display(), error = %cleanup, "Could not remove partial copy");
                    }
                }
                return Err(err);
            }
        };
        info!(from = %src.display(), to = %dst.display(), files, "Directory copied");
        return Ok(CommandOutput::line(
            CommandKind::Copy,
            format!("Directory '{source}' copied to '{dest}' ({files} files)."),
        ));
    }

    let target = match fs.metadata(dst) {
        Ok(existing) if existing.is_dir() => match src.file_name() {
            Some(name) => dst.join(name),
            None => dst.to_path_buf(),
        },
        _ => dst.to_path_buf(),
    };
    let bytes = copy_file(fs, src, &target, &metadata)?;
    info!(from = %src.display(), to = %target.display(), bytes, "File copied");
    Ok(CommandOutput::line(
        CommandKind::Copy,
        format!(
            "File '{source}' copied to '{}' ({bytes} bytes).",
            target.display()
        ),
    ))
}

fn copy_file(fs: &dyn FileSystem, from: &Path, to: &Path, metadata: &Metadata) -> Result<u64> {
    let bytes = fs.copy(from, to)?;
    let accessed = FileTime::from_last_access_time(metadata);
    let modified = FileTime::from_last_modification_time(metadata);
    filetime::set_file_times(to, accessed, modified).map_err(|err| CoreError::io(to, err))?;
    Ok(bytes)
}

fn copy_tree(fs: &dyn FileSystem, src: &Path, dst: &Path) -> Result<usize> {
    let mut files = 0usize;
    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry.map_err(|err| walk_error(src, err))?;
        let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dst.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs.create_dir_all(&target)?;
        } else if file_type.is_file() {
            let metadata = fs.metadata(entry.path())?;
            copy_file(fs, entry.path(), &target, &metadata)?;
            files += 1;
        } else if file_type.is_symlink() {
            match fs.metadata(entry.path()) {
                Ok(metadata) if metadata.is_file() => {
                    copy_file(fs, entry.path(), &target, &metadata)?;
                    files += 1;
                }
                _ => warn!(path = %entry.path().display(), "Skipping symlink that is not a file"),
            }
        }
    }
    Ok(files)
}

/// Walks `dir` collecting files whose name contains `term`, as paths
/// relative to `dir` in walk order. Symlinks to files count as files.
pub fn find_matches(fs: &dyn FileSystem, dir: &str, term: &str) -> Result<Vec<String>> {
    let root = Path::new(dir);
    if !fs.metadata(root)?.is_dir() {
        return Err(CoreError::NotADirectory(root.to_path_buf()));
    }

    let mut matches = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                debug!(error = %err, "Skipping unreadable entry");
                continue;
            }
        };
        let is_file = entry.file_type().is_file()
            || (entry.path_is_symlink()
                && fs.metadata(entry.path()).map(|m| m.is_file()).unwrap_or(false));
        if !is_file {
            continue;
        }
        if entry.file_name().to_string_lossy().contains(term) {
            matches.push(relative_display(entry.path(), root));
        }
    }
    Ok(matches)
}

pub fn find(fs: &dyn FileSystem, dir: &str, term: &str) -> Result<CommandOutput> {
    let matches = find_matches(fs, dir, term)?;
    if matches.is_empty() {
        return Ok(CommandOutput::line(
            CommandKind::Find,
            format!("No files matching '{term}' found in '{dir}'."),
        ));
    }
    Ok(CommandOutput::success(CommandKind::Find, matches))
}

/// Size in bytes of a file, or of all regular files below a directory.
/// Symbolic links inside a directory are neither followed nor counted.
pub fn disk_usage_bytes(fs: &dyn FileSystem, path: &Path) -> Result<u64> {
    let metadata = fs.metadata(path)?;
    if !metadata.is_dir() {
        return Ok(metadata.len());
    }

    let mut total = 0u64;
    for entry in WalkDir::new(path).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                debug!(error = %err, "Skipping unreadable entry");
                continue;
            }
        };
        if entry.file_type().is_file() {
            total += fs.symlink_metadata(entry.path())?.len();
        }
    }
    Ok(total)
}

pub fn disk_usage(fs: &dyn FileSystem, path: &str) -> Result<CommandOutput> {
    let bytes = disk_usage_bytes(fs, Path::new(path))?;
    Ok(CommandOutput::line(
        CommandKind::DiskUsage,
        format!("Size of '{path}': {bytes} bytes ({})", print_size(bytes)),
    ))
}
