//! Error types for the CLI runtime.

use std::io;
use std::sync::Arc;

use skein_plugins::{AliasError, DispatchError};
use thiserror::Error;

use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Aliases(#[from] AliasError),
    #[error("failed to read the working directory: {0}")]
    WorkingDirectory(io::Error),
    #[error("failed to install signal handlers: {0}")]
    Signals(io::Error),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl AppError {
    /// Returns `true` for clap's help and version output, which is not a
    /// failure and belongs on stdout.
    pub(crate) fn is_informational(&self) -> bool {
        matches!(self, Self::CliUsage(error) if !error.use_stderr())
    }
}
