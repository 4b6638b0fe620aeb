use crate::errors::{CoreError, ErrorCategory};

/// Every command the dispatcher knows about.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum CommandKind {
    List,
    Mkdir,
    Touch,
    Remove,
    Move,
    Cat,
    Find,
    Copy,
    Echo,
    Chmod,
    Zip,
    Unzip,
    DiskUsage,
    Diff,
    Stat,
    Grep,
    Hash,
    Processes,
    Ping,
    SysInfo,
    Help,
}

impl CommandKind {
    pub const ALL: [CommandKind; 21] = [
        Self::List,
        Self::Mkdir,
        Self::Touch,
        Self::Remove,
        Self::Move,
        Self::Cat,
        Self::Find,
        Self::Copy,
        Self::Echo,
        Self::Chmod,
        Self::Zip,
        Self::Unzip,
        Self::DiskUsage,
        Self::Diff,
        Self::Stat,
        Self::Grep,
        Self::Hash,
        Self::Processes,
        Self::Ping,
        Self::SysInfo,
        Self::Help,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Mkdir => "mkdir",
            Self::Touch => "touch",
            Self::Remove => "rm",
            Self::Move => "mv",
            Self::Cat => "cat",
            Self::Find => "find",
            Self::Copy => "cp",
            Self::Echo => "echo",
            Self::Chmod => "chmod",
            Self::Zip => "zip",
            Self::Unzip => "unzip",
            Self::DiskUsage => "du",
            Self::Diff => "diff",
            Self::Stat => "stat",
            Self::Grep => "grep",
            Self::Hash => "hash",
            Self::Processes => "ps",
            Self::Ping => "ping",
            Self::SysInfo => "sysinfo",
            Self::Help => "help",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    /// Positional arguments required after any leading flag has been consumed.
    pub fn min_args(&self) -> usize {
        match self {
            Self::List | Self::Processes | Self::SysInfo | Self::Help => 0,
            Self::Remove | Self::Cat | Self::DiskUsage | Self::Stat | Self::Ping => 1,
            Self::Mkdir
            | Self::Touch
            | Self::Move
            | Self::Find
            | Self::Copy
            | Self::Echo
            | Self::Chmod
            | Self::Zip
            | Self::Unzip
            | Self::Diff
            | Self::Grep
            | Self::Hash => 2,
        }
    }

    /// Leading flag accepted in the first positional slot, if any.
    pub fn leading_flag(&self) -> Option<&'static str> {
        match self {
            Self::Remove => Some("-r"),
            Self::Echo => Some("-a"),
            _ => None,
        }
    }

    pub fn synopsis(&self) -> &'static str {
        match self {
            Self::List => "list [path]",
            Self::Mkdir => "mkdir <path> <name>",
            Self::Touch => "touch <path> <name>",
            Self::Remove => "rm [-r] <path>",
            Self::Move => "mv <old_path> <new_path>",
            Self::Cat => "cat <path>",
            Self::Find => "find <directory> <term>",
            Self::Copy => "cp <source> <dest>",
            Self::Echo => "echo [-a] <path> <content>",
            Self::Chmod => "chmod <path> <octal_mode>",
            Self::Zip => "zip <source> <output_name>",
            Self::Unzip => "unzip <source> <dest>",
            Self::DiskUsage => "du <path>",
            Self::Diff => "diff <file1> <file2>",
            Self::Stat => "stat <path>",
            Self::Grep => "grep <path> <pattern>",
            Self::Hash => "hash <path> <md5|sha256>",
            Self::Processes => "ps",
            Self::Ping => "ping <host>",
            Self::SysInfo => "sysinfo",
            Self::Help => "help",
        }
    }

    pub fn summary(&self) -> &'static str {
        match self {
            Self::List => "List contents of a directory. Defaults to current directory.",
            Self::Mkdir => "Create a new folder (and missing parents).",
            Self::Touch => "Create a new empty file.",
            Self::Remove => "Delete a file or an empty directory; -r deletes recursively.",
            Self::Move => "Rename or move a file or directory.",
            Self::Cat => "Print the content of a file.",
            Self::Find => "Recursively find files whose name contains a term.",
            Self::Copy => "Copy a file or a directory tree.",
            Self::Echo => "Write a line to a file; -a appends instead of overwriting.",
            Self::Chmod => "Change permission bits using an octal mode.",
            Self::Zip => "Compress a file or directory into a zip archive.",
            Self::Unzip => "Extract a zip archive into a directory.",
            Self::DiskUsage => "Show the size of a file or directory in bytes.",
            Self::Diff => "Show a unified diff between two text files.",
            Self::Stat => "Show file system metadata.",
            Self::Grep => "Print lines of a file matching a regular expression.",
            Self::Hash => "Compute an md5 or sha256 digest of a file.",
            Self::Processes => "List running processes.",
            Self::Ping => "Send one ICMP echo request to a host.",
            Self::SysInfo => "Show CPU, memory, disk and network statistics.",
            Self::Help => "Display this help message.",
        }
    }

    pub fn usage(&self) -> String {
        format!("Usage: {}", self.synopsis())
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parsed invocation: the command, its leading flag state and the
/// remaining positional arguments.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub command: CommandKind,
    pub args: Vec<String>,
    pub flagged: bool,
}

impl CommandContext {
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }
}

/// Lines an operation produced on success.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub command: CommandKind,
    pub stdout: Vec<String>,
}

impl CommandOutput {
    pub fn success(command: CommandKind, stdout: impl Into<Vec<String>>) -> Self {
        Self {
            command,
            stdout: stdout.into(),
        }
    }

    pub fn line(command: CommandKind, line: impl Into<String>) -> Self {
        Self::success(command, vec![line.into()])
    }
}

/// Result of one dispatch, rendered to text by [`CommandOutcome::render`].
#[derive(Debug)]
pub enum CommandOutcome {
    Completed(CommandOutput),
    Failed {
        command: CommandKind,
        error: CoreError,
    },
    /// Too few arguments; the operation was not invoked.
    Usage(CommandKind),
    /// Help requested, or the command was missing/unknown.
    Help { unknown: Option<String> },
}

impl CommandOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Help { unknown: None })
    }

    pub fn render(&self) -> Vec<String> {
        match self {
            Self::Completed(output) => output.stdout.clone(),
            Self::Failed { error, .. } => vec![render_error(error)],
            Self::Usage(command) => vec![command.usage()],
            Self::Help { unknown } => {
                let mut lines = Vec::new();
                if let Some(name) = unknown {
                    lines.push(format!("Unknown command: {name}"));
                }
                lines.extend(help_lines());
                lines
            }
        }
    }
}

fn render_error(error: &CoreError) -> String {
    match error.category() {
        ErrorCategory::Unexpected => format!("An unexpected error occurred: {error}"),
        _ => format!("Error: {error}"),
    }
}

/// The full command catalog with usage.
pub fn help_lines() -> Vec<String> {
    let width = CommandKind::ALL
        .iter()
        .map(|kind| kind.synopsis().len())
        .max()
        .unwrap_or(0);
    let mut lines = vec![
        "Simple CLI File Manager".to_string(),
        "Usage: filekit <command> [arguments]".to_string(),
        String::new(),
        "Commands:".to_string(),
    ];
    lines.extend(CommandKind::ALL.iter().map(|kind| {
        format!("  {:<width$} - {}", kind.synopsis(), kind.summary(), width = width)
    }));
    lines
}
