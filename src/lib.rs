//! Command-line file management utility.
//!
//! A single dispatch entry point maps a command token to one filesystem, OS or
//! process operation. Operations return a result value; every failure is
//! classified and rendered as text, so the program always runs to completion.

pub mod dispatch;
pub mod errors;
pub mod fs;
pub mod helpers;
pub mod models;
pub mod ops;
pub mod platform;

pub use dispatch::{parse, Dispatcher};
pub use errors::{CoreError, ErrorCategory, Result};
pub use fs::{FileSystem, RealFileSystem};
pub use helpers::{archive_path, print_size, serialize_system_time};
pub use models::{help_lines, CommandContext, CommandKind, CommandOutcome, CommandOutput};
pub use platform::{PlatformFamily, SysinfoProbe, SystemProbe};

/// Dispatches `argv` against the host filesystem and system.
pub fn dispatch<S: AsRef<str>>(argv: &[S]) -> CommandOutcome {
    Dispatcher::new(RealFileSystem, SysinfoProbe::new(), PlatformFamily::current()).dispatch(argv)
}

/// Re-export a small stable API surface for embedding callers.
pub mod prelude {
    pub use crate::{
        dispatch::Dispatcher,
        errors::{CoreError, ErrorCategory, Result},
        fs::{FileSystem, RealFileSystem},
        models::*,
        platform::{PlatformFamily, SysinfoProbe, SystemProbe},
    };
}
