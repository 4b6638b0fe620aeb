//! Content and metadata operations: cat, echo, chmod, diff, stat, grep, hash.

use std::fs::{File, Metadata, Permissions};
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use regex::Regex;
use sha2::{Digest, Sha256};
use similar::TextDiff;
use tracing::{debug, info};

use crate::errors::{CoreError, Result};
use crate::fs::FileSystem;
use crate::helpers::{serialize_system_time, UNAVAILABLE};
use crate::models::{CommandKind, CommandOutput};

/// Chunk size used when streaming a file into a digest.
const HASH_CHUNK_SIZE: usize = 8192;

fn ensure_not_dir(fs: &dyn FileSystem, path: &Path) -> Result<Metadata> {
    let metadata = fs.metadata(path)?;
    if metadata.is_dir() {
        return Err(CoreError::IsADirectory(path.to_path_buf()));
    }
    Ok(metadata)
}

/// Prints the entire text content of a file.
pub fn cat(fs: &dyn FileSystem, path: &str) -> Result<CommandOutput> {
    let file = Path::new(path);
    ensure_not_dir(fs, file)?;
    let content = fs.read_to_string(file)?;
    Ok(CommandOutput::success(
        CommandKind::Cat,
        content.lines().map(str::to_string).collect::<Vec<_>>(),
    ))
}

/// Writes `content` plus a newline, replacing the file or appending to it.
pub fn echo(fs: &dyn FileSystem, path: &str, content: &str, append: bool) -> Result<CommandOutput> {
    let target = Path::new(path);
    let line = format!("{content}\n");
    let message = if append {
        fs.append(target, line.as_bytes())?;
        format!("Appended to '{path}'.")
    } else {
        fs.write(target, line.as_bytes())?;
        format!("Wrote to '{path}'.")
    };
    debug!(path, append, bytes = line.len(), "Content written");
    Ok(CommandOutput::line(CommandKind::Echo, message))
}

/// Parses an octal permission string such as `755` or `0o644`.
pub fn parse_mode(mode: &str) -> Result<u32> {
    let digits = mode.strip_prefix("0o").unwrap_or(mode);
    if digits.is_empty() || !digits.chars().all(|ch| ('0'..='7').contains(&ch)) {
        return Err(CoreError::InvalidMode(mode.to_string()));
    }
    match u32::from_str_radix(digits, 8) {
        Ok(bits) if bits <= 0o7777 => Ok(bits),
        _ => Err(CoreError::InvalidMode(mode.to_string())),
    }
}

#[cfg(unix)]
fn permissions_for(_current: &Metadata, bits: u32) -> Permissions {
    use std::os::unix::fs::PermissionsExt;
    Permissions::from_mode(bits)
}

#[cfg(not(unix))]
fn permissions_for(current: &Metadata, bits: u32) -> Permissions {
    let mut permissions = current.permissions();
    permissions.set_readonly(bits & 0o200 == 0);
    permissions
}

pub fn chmod(fs: &dyn FileSystem, path: &str, mode: &str) -> Result<CommandOutput> {
    let bits = parse_mode(mode)?;
    let target = Path::new(path);
    let metadata = fs.metadata(target)?;
    fs.set_permissions(target, permissions_for(&metadata, bits))?;
    info!(path, mode = %format!("{bits:o}"), "Permissions changed");
    Ok(CommandOutput::line(
        CommandKind::Chmod,
        format!("Permissions of '{path}' set to {bits:o}."),
    ))
}

/// Unified line diff of two files labelled with their paths. Identical
/// inputs produce no lines.
pub fn unified_diff(fs: &dyn FileSystem, first: &str, second: &str) -> Result<Vec<String>> {
    let read = |path: &str| match fs.read_to_string(Path::new(path)) {
        Err(CoreError::NotFound(_)) => Err(CoreError::EitherNotFound(first.into(), second.into())),
        other => other,
    };
    let old = read(first)?;
    let new = read(second)?;
    if old == new {
        return Ok(Vec::new());
    }

    let diff = TextDiff::from_lines(&old, &new);
    let rendered = diff.unified_diff().header(first, second).to_string();
    Ok(rendered.lines().map(str::to_string).collect())
}

pub fn diff(fs: &dyn FileSystem, first: &str, second: &str) -> Result<CommandOutput> {
    Ok(CommandOutput::success(
        CommandKind::Diff,
        unified_diff(fs, first, second)?,
    ))
}

/// Platform-dependent `stat` fields; `None` renders as unavailable.
#[derive(Debug, Default)]
struct PlatformFields {
    changed: Option<String>,
    mode: Option<u32>,
    inode: Option<u64>,
    device: Option<u64>,
    links: Option<u64>,
    uid: Option<u32>,
    gid: Option<u32>,
}

#[cfg(unix)]
fn platform_fields(metadata: &Metadata) -> PlatformFields {
    use crate::helpers::serialize_epoch_seconds;
    use std::os::unix::fs::MetadataExt;

    PlatformFields {
        changed: Some(serialize_epoch_seconds(metadata.ctime())),
        mode: Some(metadata.mode() & 0o7777),
        inode: Some(metadata.ino()),
        device: Some(metadata.dev()),
        links: Some(metadata.nlink()),
        uid: Some(metadata.uid()),
        gid: Some(metadata.gid()),
    }
}

#[cfg(not(unix))]
fn platform_fields(metadata: &Metadata) -> PlatformFields {
    PlatformFields {
        changed: metadata.created().ok().map(serialize_system_time),
        mode: Some(if metadata.permissions().readonly() { 0o444 } else { 0o666 }),
        ..PlatformFields::default()
    }
}

fn or_unavailable<T: ToString>(value: Option<T>) -> String {
    value
        .map(|value| value.to_string())
        .unwrap_or_else(|| UNAVAILABLE.to_string())
}

pub fn stat(fs: &dyn FileSystem, path: &str) -> Result<CommandOutput> {
    let metadata = fs.metadata(Path::new(path))?;
    let fields = platform_fields(&metadata);

    let lines = vec![
        format!("File: {path}"),
        format!("Size: {} bytes", metadata.len()),
        format!(
            "Modified: {}",
            or_unavailable(metadata.modified().ok().map(serialize_system_time))
        ),
        format!(
            "Accessed: {}",
            or_unavailable(metadata.accessed().ok().map(serialize_system_time))
        ),
        format!("Created/changed: {}", or_unavailable(fields.changed)),
        format!(
            "Permissions: {}",
            or_unavailable(fields.mode.map(|mode| format!("{mode:o}")))
        ),
        format!("Inode: {}", or_unavailable(fields.inode)),
        format!("Device: {}", or_unavailable(fields.device)),
        format!("Hard links: {}", or_unavailable(fields.links)),
        format!("Owner uid: {}", or_unavailable(fields.uid)),
        format!("Group gid: {}", or_unavailable(fields.gid)),
    ];
    Ok(CommandOutput::success(CommandKind::Stat, lines))
}

/// Lines of `path` matching `pattern`, formatted as `path:line: text`.
pub fn grep_lines(fs: &dyn FileSystem, path: &str, pattern: &str) -> Result<Vec<String>> {
    let regex = Regex::new(pattern).map_err(|err| CoreError::InvalidPattern(pattern.to_string(), err))?;
    let file_path = Path::new(path);
    ensure_not_dir(fs, file_path)?;
    let file = File::open(file_path).map_err(|err| CoreError::io(file_path, err))?;

    let mut matches = Vec::new();
    for (index, line) in BufReader::new(file).split(b'\n').enumerate() {
        let line = line.map_err(|err| CoreError::io(file_path, err))?;
        let text = String::from_utf8_lossy(&line);
        let text = text.strip_suffix('\r').unwrap_or(&text);
        if regex.is_match(text) {
            matches.push(format!("{path}:{}: {text}", index + 1));
        }
    }
    Ok(matches)
}

pub fn grep(fs: &dyn FileSystem, path: &str, pattern: &str) -> Result<CommandOutput> {
    let matches = grep_lines(fs, path, pattern)?;
    if matches.is_empty() {
        return Ok(CommandOutput::line(
            CommandKind::Grep,
            format!("No lines matching '{pattern}' in '{path}'."),
        ));
    }
    Ok(CommandOutput::success(CommandKind::Grep, matches))
}

/// Digest algorithms `hash` accepts.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum HashAlgorithm {
    Md5,
    Sha256,
}

impl HashAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha256 => "sha256",
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "md5" => Ok(Self::Md5),
            "sha256" => Ok(Self::Sha256),
            _ => Err(CoreError::UnsupportedAlgorithm(value.to_string())),
        }
    }
}

fn stream_chunks(path: &Path, mut consume: impl FnMut(&[u8])) -> Result<u64> {
    let mut file = File::open(path).map_err(|err| CoreError::io(path, err))?;
    let mut buffer = [0u8; HASH_CHUNK_SIZE];
    let mut total_bytes = 0u64;

    loop {
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|err| CoreError::io(path, err))?;
        if bytes_read == 0 {
            break;
        }
        consume(&buffer[..bytes_read]);
        total_bytes += bytes_read as u64;
    }
    Ok(total_bytes)
}

/// Lowercase hex digest of a file, read in fixed-size chunks.
pub fn file_digest(fs: &dyn FileSystem, path: &Path, algorithm: HashAlgorithm) -> Result<String> {
    ensure_not_dir(fs, path)?;
    let (digest, total_bytes) = match algorithm {
        HashAlgorithm::Md5 => {
            let mut context = md5::Context::new();
            let total = stream_chunks(path, |chunk| context.consume(chunk))?;
            (format!("{:x}", context.compute()), total)
        }
        HashAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            let total = stream_chunks(path, |chunk| hasher.update(chunk))?;
            (format!("{:x}", hasher.finalize()), total)
        }
    };
    debug!(path = %path.display(), algorithm = algorithm.as_str(), total_bytes, "Digest computed");
    Ok(digest)
}

pub fn hash(fs: &dyn FileSystem, path: &str, algorithm: &str) -> Result<CommandOutput> {
    let algorithm = algorithm.parse::<HashAlgorithm>()?;
    let digest = file_digest(fs, Path::new(path), algorithm)?;
    Ok(CommandOutput::line(
        CommandKind::Hash,
        format!("{}  {path}  ({})", digest, algorithm.as_str()),
    ))
}
