use std::{io, path::PathBuf};

/// Broad failure classes every operation reports through.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ErrorCategory {
    NotFound,
    AlreadyExists,
    WrongKind,
    InvalidArgument,
    Unexpected,
}

/// Shared error type used by all operations.
#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    /// Target path, archive or executable is absent.
    #[error("'{0}' not found.")]
    NotFound(PathBuf),

    /// Creation or rename target conflicts with an existing path.
    #[error("'{0}' already exists.")]
    AlreadyExists(PathBuf),

    /// One or both operands of a two-file comparison are absent.
    #[error("one or both files not found: '{0}', '{1}'.")]
    EitherNotFound(PathBuf, PathBuf),

    #[error("'{0}' is not a directory.")]
    NotADirectory(PathBuf),

    #[error("'{0}' is a directory.")]
    IsADirectory(PathBuf),

    /// A directory must be empty unless recursive deletion was requested.
    #[error("directory '{0}' is not empty (use -r to delete it recursively).")]
    DirectoryNotEmpty(PathBuf),

    /// The write target of an operation coincides with, or lies inside, its input.
    #[error("'{1}' overlaps the source '{0}'.")]
    Overlap(PathBuf, PathBuf),

    #[error("'{0}' is neither a file nor a directory.")]
    UnsupportedFileType(PathBuf),

    #[error("invalid octal mode '{0}'.")]
    InvalidMode(String),

    #[error("unsupported algorithm '{0}' (expected md5 or sha256).")]
    UnsupportedAlgorithm(String),

    #[error("'{0}' is not a valid zip archive: {1}")]
    InvalidArchive(PathBuf, String),

    #[error("invalid pattern '{0}': {1}")]
    InvalidPattern(String, #[source] regex::Error),

    /// An external utility is not installed on this system.
    #[error("'{0}' utility not found on this system.")]
    ToolNotFound(String),

    /// An external utility ran but exited unsuccessfully.
    #[error("{program} failed: {message}")]
    ToolFailed { program: String, message: String },

    /// File system I/O failure not covered by a more specific variant.
    #[error("I/O error while accessing '{0}': {1}")]
    Io(PathBuf, #[source] io::Error),
}

impl CoreError {
    /// Classifies an I/O error against the path it concerns.
    pub fn io(path: impl Into<PathBuf>, error: io::Error) -> Self {
        let path = path.into();
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path),
            io::ErrorKind::AlreadyExists => Self::AlreadyExists(path),
            io::ErrorKind::NotADirectory => Self::NotADirectory(path),
            io::ErrorKind::IsADirectory => Self::IsADirectory(path),
            io::ErrorKind::DirectoryNotEmpty => Self::DirectoryNotEmpty(path),
            _ => Self::Io(path, error),
        }
    }

    pub fn tool_failed(program: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolFailed {
            program: program.into(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound(_) | Self::EitherNotFound(..) | Self::ToolNotFound(_) => {
                ErrorCategory::NotFound
            }
            Self::AlreadyExists(_) => ErrorCategory::AlreadyExists,
            Self::NotADirectory(_)
            | Self::IsADirectory(_)
            | Self::DirectoryNotEmpty(_)
            | Self::UnsupportedFileType(_) => ErrorCategory::WrongKind,
            Self::InvalidMode(_)
            | Self::UnsupportedAlgorithm(_)
            | Self::InvalidArchive(..)
            | Self::InvalidPattern(..)
            | Self::Overlap(..) => ErrorCategory::InvalidArgument,
            Self::ToolFailed { .. } | Self::Io(..) => ErrorCategory::Unexpected,
        }
    }
}

/// Shared result alias for the crate.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_is_classified_by_kind() {
        let err = CoreError::io("/a", io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, CoreError::NotFound(_)));
        assert_eq!(err.category(), ErrorCategory::NotFound);

        let err = CoreError::io("/a", io::Error::from(io::ErrorKind::AlreadyExists));
        assert_eq!(err.category(), ErrorCategory::AlreadyExists);

        let err = CoreError::io("/a", io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(err.category(), ErrorCategory::Unexpected);
    }

    #[test]
    fn test_unexpected_message_carries_system_text() {
        let err = CoreError::io("/x", io::Error::new(io::ErrorKind::Other, "disk on fire"));
        let message = err.to_string();
        assert!(message.contains("/x"));
        assert!(message.contains("disk on fire"));
    }

    #[test]
    fn test_invalid_argument_category() {
        assert_eq!(
            CoreError::InvalidMode("9z".into()).category(),
            ErrorCategory::InvalidArgument
        );
        assert_eq!(
            CoreError::UnsupportedAlgorithm("sha1".into()).category(),
            ErrorCategory::InvalidArgument
        );
        assert_eq!(
            CoreError::Overlap("/d".into(), "/d/sub".into()).category(),
            ErrorCategory::InvalidArgument
        );
    }
}
