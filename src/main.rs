use std::env;
use std::io::{self, Write};

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Diagnostics go to stderr; `RUST_LOG` overrides the default level.
fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .init();
}

fn run() -> i32 {
    let args: Vec<String> = env::args_os()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();

    let outcome = filekit::dispatch(&args);

    let stdout = io::stdout();
    let mut stdout = stdout.lock();
    for line in outcome.render() {
        if writeln!(stdout, "{line}").is_err() {
            break;
        }
    }
    // Failures are reported as text only; the exit status is not differentiated.
    0
}

fn main() {
    init_logging();
    std::process::exit(run());
}
