//! Command-line runtime for the `skein` plugin orchestrator.
//!
//! [`run`] is the whole program: it splits configuration flags from plugin
//! flags, loads the layered [`Config`], installs telemetry and signal
//! handlers, and walks the plugin reference through the
//! [`Dispatcher`]. Every failure is reported once on stderr and mapped to
//! [`ExitCode::FAILURE`].

mod cli;
mod config;
mod errors;
mod signals;
mod telemetry;

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use skein_config::Config;
use skein_plugins::{
    AliasTable, CancelToken, Dispatcher, FormatExecutors, GitFetcher, InvocationContext,
    OutputSinks, PluginReference, Toolchain,
};
use tracing::error;

use crate::cli::Cli;
use crate::config::{ConfigLoader, OrthoConfigLoader, split_config_arguments};
pub(crate) use crate::errors::AppError;

const CLI_TARGET: &str = "skein_cli";

/// Flags consumed by the configuration loader rather than the plugin flags.
pub const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--log-filter",
    "--log-format",
    "--alias-file",
    "--workspace-root",
    "--fetch-timeout-secs",
    "--git-binary",
    "--bash-binary",
    "--go-binary",
    "--node-binary",
    "--sh-binary",
];

/// Runs the CLI using the provided arguments and output handles.
///
/// Plugin output is forwarded to `stdout` and `stderr` as it is produced.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write + Send,
    E: Write + Send,
{
    run_with_loader(args, stdout, stderr, &OrthoConfigLoader)
}

fn run_with_loader<I, W, E, L>(args: I, stdout: &mut W, stderr: &mut E, loader: &L) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write + Send,
    E: Write + Send,
    L: ConfigLoader,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let split = split_config_arguments(&args);

    let result = Cli::try_parse_from(&split.plugin_arguments)
        .map_err(AppError::CliUsage)
        .and_then(|cli| {
            loader
                .load(&split.config_arguments)
                .map(|config| (cli, config))
        })
        .and_then(|(cli, config)| {
            dispatch(cli.into(), &config, OutputSinks::new(&mut *stdout, &mut *stderr))
        });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(info) if info.is_informational() => {
            drop(write!(stdout, "{info}"));
            ExitCode::SUCCESS
        }
        Err(failure) => {
            drop(writeln!(stderr, "skein: {failure}"));
            ExitCode::FAILURE
        }
    }
}

fn dispatch(
    reference: PluginReference,
    config: &Config,
    sinks: OutputSinks<'_>,
) -> Result<(), AppError> {
    telemetry::initialise(config)?;
    let aliases = config
        .alias_file()
        .map_or_else(|| Ok(AliasTable::new()), |path| AliasTable::load(path.as_std_path()))?;
    let context = InvocationContext::capture().map_err(AppError::WorkingDirectory)?;
    let cancel = CancelToken::new();
    signals::register(&cancel).map_err(AppError::Signals)?;

    let toolchain = Toolchain::new(
        config.bash_binary(),
        config.go_binary(),
        config.node_binary(),
    )
    .with_sh(config.sh_binary());
    let dispatcher = Dispatcher::new(
        aliases,
        GitFetcher::new(config.git_binary()),
        FormatExecutors::new(&toolchain),
    )
    .with_workspace_root(
        config
            .workspace_root()
            .map(|root| root.as_std_path().to_path_buf()),
    )
    .with_fetch_timeout(config.fetch_timeout());

    let name = reference.name().to_owned();
    let repository = reference.repository().to_owned();
    dispatcher
        .run(reference, &context, &cancel, sinks)
        .map(drop)
        .map_err(|failure| {
            error!(
                target: CLI_TARGET,
                stage = %failure.stage(),
                name = name.as_str(),
                repository = repository.as_str(),
                error = %failure,
                "plugin step failed"
            );
            AppError::from(failure)
        })
}
