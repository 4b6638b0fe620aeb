//! Zip archive creation and extraction.

use std::fs::{File, Metadata};
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::result::ZipError;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::errors::{CoreError, Result};
use crate::fs::FileSystem;
use crate::helpers::archive_path;
use crate::models::{CommandKind, CommandOutput};

use super::{resolve_pending, walk_error};

fn zip_error(path: &Path, err: ZipError) -> CoreError {
    match err {
        ZipError::Io(io_err) => CoreError::io(path, io_err),
        other => CoreError::Io(
            path.to_path_buf(),
            io::Error::new(io::ErrorKind::Other, other.to_string()),
        ),
    }
}

fn entry_options(metadata: &Metadata) -> FileOptions {
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        options.unix_permissions(metadata.permissions().mode() & 0o7777)
    }
    #[cfg(not(unix))]
    {
        let _ = metadata;
        options
    }
}

/// Archive entry name: `base` followed by `relative`'s components, `/`-joined.
fn entry_name(base: &str, relative: &Path) -> String {
    let mut name = base.to_string();
    for component in relative.components() {
        if let Component::Normal(part) = component {
            name.push('/');
            name.push_str(&part.to_string_lossy());
        }
    }
    name
}

/// Name used for the top-level archive entry.
fn base_name(source: &Path) -> String {
    match source.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => source
            .canonicalize()
            .ok()
            .and_then(|path| path.file_name().map(|name| name.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "root".to_string()),
    }
}

/// Writes `source` into a zip archive derived from `output_name`. A
/// directory's own name becomes the top-level entry.
///
/// A file source is never its own archive. A partially written archive is
/// removed when any entry fails.
pub fn create_archive(fs: &dyn FileSystem, source: &Path, output_name: &str) -> Result<PathBuf> {
    let metadata = fs.metadata(source)?;
    let archive = archive_path(output_name);
    let base = base_name(source);

    if !metadata.is_dir() {
        if let (Some(source_real), Some(archive_real)) =
            (resolve_pending(source), resolve_pending(&archive))
        {
            if source_real == archive_real {
                return Err(CoreError::Overlap(source.to_path_buf(), archive));
            }
        }
    }

    let file = File::create(&archive).map_err(|err| CoreError::io(&archive, err))?;
    let written = write_entries(fs, ZipWriter::new(file), source, &metadata, &base, &archive);
    if let Err(err) = written {
        if let Err(cleanup) = fs.remove_file(&archive) {
            warn!(archive = %archive.display(), error = %cleanup, "Could not remove partial archive");
        }
        return Err(err);
    }
    Ok(archive)
}

fn write_entries(
    fs: &dyn FileSystem,
    mut writer: ZipWriter<File>,
    source: &Path,
    metadata: &Metadata,
    base: &str,
    archive: &Path,
) -> Result<()> {
    if !metadata.is_dir() {
        append_file(&mut writer, source, base, metadata, archive)?;
        writer.finish().map_err(|err| zip_error(archive, err))?;
        return Ok(());
    }

    let archive_real = archive.canonicalize().ok();
    for entry in WalkDir::new(source).follow_links(false) {
        let entry = entry.map_err(|err| walk_error(source, err))?;
        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let name = entry_name(base, relative);
        let entry_metadata = match fs.metadata(entry.path()) {
            Ok(metadata) => metadata,
            Err(err) if entry.path_is_symlink() => {
                debug!(path = %entry.path().display(), error = %err, "Skipping dangling symlink");
                continue;
            }
            Err(err) => return Err(err),
        };

        if entry.file_type().is_dir() {
            writer
                .add_directory(name, entry_options(&entry_metadata))
                .map_err(|err| zip_error(archive, err))?;
            continue;
        }
        if !entry_metadata.is_file() {
            continue;
        }
        if archive_real.is_some() && entry.path().canonicalize().ok() == archive_real {
            debug!(path = %entry.path().display(), "Skipping the archive being written");
            continue;
        }
        append_file(&mut writer, entry.path(), &name, &entry_metadata, archive)?;
    }
    writer.finish().map_err(|err| zip_error(archive, err))?;
    Ok(())
}

fn append_file(
    writer: &mut ZipWriter<File>,
    path: &Path,
    name: &str,
    metadata: &Metadata,
    archive: &Path,
) -> Result<()> {
    writer
        .start_file(name, entry_options(metadata))
        .map_err(|err| zip_error(archive, err))?;
    let mut file = File::open(path).map_err(|err| CoreError::io(path, err))?;
    io::copy(&mut file, writer).map_err(|err| CoreError::io(path, err))?;
    Ok(())
}

pub fn zip(fs: &dyn FileSystem, source: &str, output_name: &str) -> Result<CommandOutput> {
    let archive = create_archive(fs, Path::new(source), output_name)?;
    info!(source, archive = %archive.display(), "Archive created");
    Ok(CommandOutput::line(
        CommandKind::Zip,
        format!("'{source}' compressed to '{}'.", archive.display()),
    ))
}

/// Extracts a zip archive into `dest`, creating it when missing. Returns the
/// number of entries extracted.
pub fn extract_archive(fs: &dyn FileSystem, source: &Path, dest: &Path) -> Result<usize> {
    if fs.metadata(source)?.is_dir() {
        return Err(CoreError::IsADirectory(source.to_path_buf()));
    }
    let file = File::open(source).map_err(|err| CoreError::io(source, err))?;
    let mut archive = ZipArchive::new(file).map_err(|err| match err {
        ZipError::Io(io_err) => CoreError::io(source, io_err),
        other => CoreError::InvalidArchive(source.to_path_buf(), other.to_string()),
    })?;

    fs.create_dir_all(dest)?;
    let entries = archive.len();
    archive.extract(dest).map_err(|err| zip_error(dest, err))?;
    Ok(entries)
}

pub fn unzip(fs: &dyn FileSystem, source: &str, dest: &str) -> Result<CommandOutput> {
    let entries = extract_archive(fs, Path::new(source), Path::new(dest))?;
    info!(source, dest, entries, "Archive extracted");
    Ok(CommandOutput::line(
        CommandKind::Unzip,
        format!("Extracted {entries} entries from '{source}' to '{dest}'."),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{FailingFileSystem, RealFileSystem};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_entry_name_joins_with_forward_slash() {
        assert_eq!(entry_name("docs", Path::new("")), "docs");
        assert_eq!(entry_name("docs", Path::new("a").join("b.txt").as_path()), "docs/a/b.txt");
    }

    #[test]
    fn test_directory_round_trip() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("project");
        fs::create_dir_all(src.join("nested/deeper")).unwrap();
        fs::write(src.join("top.txt"), "top").unwrap();
        fs::write(src.join("nested/deeper/leaf.bin"), [0u8, 1, 2, 255]).unwrap();

        let output = tmp.path().join("bundle.tar");
        let archive = create_archive(
            &RealFileSystem,
            &src,
            &output.to_string_lossy(),
        )
        .unwrap();
        assert_eq!(archive, tmp.path().join("bundle.zip"));

        let dest = tmp.path().join("out");
        extract_archive(&RealFileSystem, &archive, &dest).unwrap();
        assert_eq!(fs::read_to_string(dest.join("project/top.txt")).unwrap(), "top");
        assert_eq!(
            fs::read(dest.join("project/nested/deeper/leaf.bin")).unwrap(),
            vec![0u8, 1, 2, 255]
        );
    }

    #[test]
    fn test_single_file_round_trip() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("note.txt");
        fs::write(&src, "hello").unwrap();

        let archive = create_archive(
            &RealFileSystem,
            &src,
            &tmp.path().join("note").to_string_lossy(),
        )
        .unwrap();
        let dest = tmp.path().join("x");
        let entries = extract_archive(&RealFileSystem, &archive, &dest).unwrap();
        assert_eq!(entries, 1);
        assert_eq!(fs::read_to_string(dest.join("note.txt")).unwrap(), "hello");
    }

    #[test]
    fn test_unzip_rejects_non_archive() {
        let tmp = TempDir::new().unwrap();
        let bogus = tmp.path().join("bogus.zip");
        fs::write(&bogus, "this is not a zip file at all").unwrap();

        let err = extract_archive(&RealFileSystem, &bogus, &tmp.path().join("d")).unwrap_err();
        assert!(matches!(err, CoreError::InvalidArchive(..)));

        let missing = tmp.path().join("missing.zip");
        let err = extract_archive(&RealFileSystem, &missing, &tmp.path().join("d")).unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn test_zip_missing_source_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = create_archive(
            &RealFileSystem,
            &tmp.path().join("nothing"),
            &tmp.path().join("out").to_string_lossy(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
        assert!(!tmp.path().join("out.zip").exists());
    }

    #[test]
    fn test_file_is_never_zipped_onto_itself() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("report.zip");
        fs::write(&src, "precious data").unwrap();

        let err = create_archive(
            &RealFileSystem,
            &src,
            &tmp.path().join("report").to_string_lossy(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Overlap(..)));
        assert_eq!(fs::read_to_string(&src).unwrap(), "precious data");
    }

    #[test]
    fn test_failed_entry_leaves_no_partial_archive() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("project");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("fine.txt"), "ok").unwrap();
        fs::write(src.join("locked.txt"), "secret").unwrap();

        let failing = FailingFileSystem {
            unreadable: "locked.txt",
        };
        let err = create_archive(&failing, &src, &tmp.path().join("out").to_string_lossy())
            .unwrap_err();
        assert!(matches!(err, CoreError::Io(..)));
        assert!(!tmp.path().join("out.zip").exists());
        assert!(src.join("locked.txt").exists());
    }
}
