//! Command dispatch: argument vector in, [`CommandOutcome`] out.

use tracing::{debug, info};

use crate::errors::Result;
use crate::fs::FileSystem;
use crate::models::{help_lines, CommandContext, CommandKind, CommandOutcome, CommandOutput};
use crate::ops::{archive, content, files, system};
use crate::platform::{PlatformFamily, SystemProbe};

/// Parses a full argument vector (program name first).
///
/// Returns the outcome directly for help, unknown commands and arity
/// failures; none of those run an operation.
pub fn parse<S: AsRef<str>>(argv: &[S]) -> std::result::Result<CommandContext, CommandOutcome> {
    let mut tokens = argv.iter().skip(1).map(|token| token.as_ref().to_string());
    let name = match tokens.next() {
        Some(name) => name,
        None => return Err(CommandOutcome::Help { unknown: None }),
    };
    let command = match CommandKind::from_name(&name) {
        Some(command) => command,
        None => return Err(CommandOutcome::Help { unknown: Some(name) }),
    };

    let mut args: Vec<String> = tokens.collect();
    let flagged = match command.leading_flag() {
        Some(flag) if args.first().map(String::as_str) == Some(flag) => {
            args.remove(0);
            true
        }
        _ => false,
    };

    if args.len() < command.min_args() {
        return Err(CommandOutcome::Usage(command));
    }
    Ok(CommandContext {
        command,
        args,
        flagged,
    })
}

/// Routes invocations to operations over a filesystem and a system probe.
pub struct Dispatcher<F, P> {
    fs: F,
    probe: P,
    family: PlatformFamily,
}

impl<F: FileSystem, P: SystemProbe> Dispatcher<F, P> {
    pub fn new(fs: F, probe: P, family: PlatformFamily) -> Self {
        Self { fs, probe, family }
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    /// Never fails: every error is folded into the returned outcome.
    pub fn dispatch<S: AsRef<str>>(&mut self, argv: &[S]) -> CommandOutcome {
        let context = match parse(argv) {
            Ok(context) => context,
            Err(outcome) => {
                debug!(?outcome, "Not dispatching");
                return outcome;
            }
        };

        debug!(command = %context.command, args = ?context.args, flagged = context.flagged, "Dispatching");
        match self.run(&context) {
            Ok(output) => CommandOutcome::Completed(output),
            Err(error) => {
                info!(command = %context.command, category = ?error.category(), %error, "Command failed");
                CommandOutcome::Failed {
                    command: context.command,
                    error,
                }
            }
        }
    }

    fn run(&mut self, ctx: &CommandContext) -> Result<CommandOutput> {
        let fs: &dyn FileSystem = &self.fs;
        let arg = move |index: usize| ctx.arg(index).unwrap_or_default();

        match ctx.command {
            CommandKind::List => files::list(fs, ctx.arg(0).unwrap_or(".")),
            CommandKind::Mkdir => files::mkdir(fs, arg(0), arg(1)),
            CommandKind::Touch => files::touch(fs, arg(0), arg(1)),
            CommandKind::Remove => files::remove(fs, arg(0), ctx.flagged),
            CommandKind::Move => files::rename(fs, arg(0), arg(1)),
            CommandKind::Cat => content::cat(fs, arg(0)),
            CommandKind::Find => files::find(fs, arg(0), arg(1)),
            CommandKind::Copy => files::copy(fs, arg(0), arg(1)),
            CommandKind::Echo => content::echo(fs, arg(0), arg(1), ctx.flagged),
            CommandKind::Chmod => content::chmod(fs, arg(0), arg(1)),
            CommandKind::Zip => archive::zip(fs, arg(0), arg(1)),
            CommandKind::Unzip => archive::unzip(fs, arg(0), arg(1)),
            CommandKind::DiskUsage => files::disk_usage(fs, arg(0)),
            CommandKind::Diff => content::diff(fs, arg(0), arg(1)),
            CommandKind::Stat => content::stat(fs, arg(0)),
            CommandKind::Grep => content::grep(fs, arg(0), arg(1)),
            CommandKind::Hash => content::hash(fs, arg(0), arg(1)),
            CommandKind::Processes => system::ps(&mut self.probe),
            CommandKind::Ping => system::ping(arg(0), self.family),
            CommandKind::SysInfo => system::sysinfo(&mut self.probe),
            CommandKind::Help => Ok(CommandOutput::success(CommandKind::Help, help_lines())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(argv: &[&str]) -> CommandContext {
        match parse(argv) {
            Ok(context) => context,
            Err(outcome) => panic!("expected a context, got {outcome:?}"),
        }
    }

    #[test]
    fn test_no_command_is_help() {
        assert!(matches!(
            parse(&["filekit"]),
            Err(CommandOutcome::Help { unknown: None })
        ));
    }

    #[test]
    fn test_unknown_command_is_help_with_notice() {
        match parse(&["filekit", "explode"]) {
            Err(CommandOutcome::Help { unknown: Some(name) }) => assert_eq!(name, "explode"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_arity_for_every_command() {
        for kind in CommandKind::ALL {
            let min = kind.min_args();
            if min == 0 {
                assert!(parse(&["filekit", kind.as_str()]).is_ok());
                continue;
            }
            let mut argv = vec!["filekit", kind.as_str()];
            argv.extend(std::iter::repeat("x").take(min - 1));
            match parse(&argv) {
                Err(CommandOutcome::Usage(command)) => assert_eq!(command, kind),
                other => panic!("{kind}: expected usage, got {other:?}"),
            }
            argv.push("x");
            assert!(parse(&argv).is_ok(), "{kind} with {min} args");
        }
    }

    #[test]
    fn test_leading_flags_shift_arguments() {
        let context = parse_ok(&["filekit", "rm", "-r", "dir"]);
        assert!(context.flagged);
        assert_eq!(context.args, vec!["dir"]);

        let context = parse_ok(&["filekit", "rm", "dir"]);
        assert!(!context.flagged);

        assert!(matches!(
            parse(&["filekit", "rm", "-r"]),
            Err(CommandOutcome::Usage(CommandKind::Remove))
        ));

        let context = parse_ok(&["filekit", "echo", "-a", "f.txt", "hi"]);
        assert!(context.flagged);
        assert_eq!(context.args, vec!["f.txt", "hi"]);

        assert!(matches!(
            parse(&["filekit", "echo", "-a", "f.txt"]),
            Err(CommandOutcome::Usage(CommandKind::Echo))
        ));
    }

    #[test]
    fn test_flag_only_recognised_for_its_command() {
        let context = parse_ok(&["filekit", "cat", "-r"]);
        assert!(!context.flagged);
        assert_eq!(context.args, vec!["-r"]);
    }
}
