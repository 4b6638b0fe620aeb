//! Shared formatting helpers for operation output.

use chrono::{DateTime, Local, TimeZone};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Timestamp format used by `stat`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Marker printed for metadata fields the platform cannot supply.
pub const UNAVAILABLE: &str = "unavailable";

/// Serializes a system time into the local timestamp format.
pub fn serialize_system_time(time: SystemTime) -> String {
    let dt = DateTime::<Local>::from(time);
    dt.format(TIMESTAMP_FORMAT).to_string()
}

/// Serializes seconds since the Unix epoch, as reported by raw `stat` fields.
pub fn serialize_epoch_seconds(secs: i64) -> String {
    match Local.timestamp_opt(secs, 0).single() {
        Some(dt) => dt.format(TIMESTAMP_FORMAT).to_string(),
        None => UNAVAILABLE.to_string(),
    }
}

/// Human readable size rendering.
pub fn print_size(bytes: u64) -> String {
    const SUFFIXES: [&str; 5] = ["B", "K", "M", "G", "T"];
    let mut value = bytes as f64;
    let mut idx = 0usize;

    while value >= 1024.0 && idx < SUFFIXES.len() - 1 {
        value /= 1024.0;
        idx += 1;
    }

    if idx == 0 {
        format!("{:.0} {}", value, SUFFIXES[idx])
    } else {
        format!("{:.1} {}", value, SUFFIXES[idx])
    }
}

pub fn to_gigabytes(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0 * 1024.0)
}

pub fn to_megabytes(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

/// Share of `part` in `total` as a percentage; zero when `total` is zero.
pub fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

/// Derives the archive path for `zip`: the output file name is cut at its
/// first `.` and `.zip` is appended, keeping the original parent directory.
pub fn archive_path(output_name: &str) -> PathBuf {
    let output = Path::new(output_name);
    let file_name = output
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(output_name);
    let stem = match file_name.split('.').next() {
        Some(stem) if !stem.is_empty() => stem,
        _ => "archive",
    };
    let archive = format!("{stem}.zip");
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(archive),
        _ => PathBuf::from(archive),
    }
}

/// Renders `path` relative to `root`, falling back to the full path.
pub fn relative_display(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_size() {
        assert_eq!(print_size(0), "0 B");
        assert_eq!(print_size(1023), "1023 B");
        assert_eq!(print_size(1536), "1.5 K");
        assert_eq!(print_size(5 * 1024 * 1024), "5.0 M");
    }

    #[test]
    fn test_archive_path_cuts_at_first_dot() {
        assert_eq!(archive_path("backup"), PathBuf::from("backup.zip"));
        assert_eq!(archive_path("backup.tar.gz"), PathBuf::from("backup.zip"));
        assert_eq!(archive_path("out/data.zip"), PathBuf::from("out/data.zip"));
        assert_eq!(archive_path("./out.zip"), PathBuf::from("./out.zip"));
    }

    #[test]
    fn test_archive_path_hidden_name_falls_back() {
        assert_eq!(archive_path(".hidden"), PathBuf::from("archive.zip"));
    }

    #[test]
    fn test_percent_handles_zero_total() {
        assert_eq!(percent(5, 0), 0.0);
        assert_eq!(percent(1, 4), 25.0);
    }

    #[test]
    fn test_relative_display() {
        let root = Path::new("/data");
        assert_eq!(relative_display(Path::new("/data/a/b.txt"), root), "a/b.txt");
        assert_eq!(relative_display(Path::new("/other"), root), "/other");
    }
}
