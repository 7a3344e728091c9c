//! CLI entrypoint for the `skein` plugin orchestrator.
//!
//! The binary delegates to [`skein_cli::run`], which loads configuration,
//! parses the plugin reference flags, and dispatches the plugin. Plugin
//! output is forwarded to this process's standard streams.

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Plugin output is forwarded from worker threads, so the handles must be
    // `Send`; the stream locks are not.
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    skein_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
