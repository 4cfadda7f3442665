//! CLI entrypoint for the Mantle dispatch demonstration.
//!
//! The binary delegates to [`mantle_cli::run`], which loads configuration,
//! installs telemetry, assembles the requested component graph and reports
//! the outcome of one proxied call.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    mantle_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
