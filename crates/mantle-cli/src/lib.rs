//! Command-line runtime for the Mantle dispatch demonstration.
//!
//! The runtime splits configuration flags from the binary's own arguments,
//! loads layered configuration, installs structured telemetry and then drives
//! one proxied call through the dispatch engine. The outcome is written to
//! stdout as a single JSON line so it can be inspected by scripts and tests.
//! IO streams and the configuration loader are injectable for tests.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use tracing::info;

mod cli;
mod config;
mod demo;
mod errors;
pub mod telemetry;

pub use cli::Scenario;
use cli::Cli;
use config::{ConfigLoader, OrthoConfigLoader, split_config_arguments};
use errors::AppError;

/// Tracing target for the CLI runtime.
pub const CLI_TARGET: &str = "mantle_cli";

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with_loader(args, stdout, stderr, &OrthoConfigLoader)
}

pub(crate) fn run_with_loader<I, W, E, L>(
    args: I,
    stdout: &mut W,
    stderr: &mut E,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let split = split_config_arguments(&args);

    let cli = match Cli::try_parse_from(split.cli_arguments) {
        Ok(cli) => cli,
        Err(error) if matches!(error.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = write!(stdout, "{error}");
            return ExitCode::SUCCESS;
        }
        Err(error) => {
            let _ = write!(stderr, "{}", AppError::CliUsage(error));
            return ExitCode::FAILURE;
        }
    };

    match execute(&cli, &split.config_arguments, loader, stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let _ = writeln!(stderr, "{error}");
            ExitCode::FAILURE
        }
    }
}

fn execute<W, L>(
    cli: &Cli,
    config_arguments: &[OsString],
    loader: &L,
    stdout: &mut W,
) -> Result<(), AppError>
where
    W: Write,
    L: ConfigLoader,
{
    let config = loader.load(config_arguments)?;
    telemetry::initialise(&config)?;
    info!(
        target: CLI_TARGET,
        scenario = cli.scenario.as_str(),
        method_access = %config.method_access(),
        "running scenario"
    );

    let assembly = demo::assemble(cli.scenario, config.method_access()).map_err(AppError::Assemble)?;
    let report = assembly
        .greet(cli.scenario, &cli.name)
        .map_err(AppError::Dispatch)?;

    serde_json::to_writer(&mut *stdout, &report).map_err(AppError::SerialiseReport)?;
    stdout.write_all(b"\n").map_err(AppError::WriteReport)?;
    stdout.flush().map_err(AppError::WriteReport)
}
