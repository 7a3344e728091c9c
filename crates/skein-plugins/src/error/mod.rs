//! Domain errors raised by the plugin pipeline.
//!
//! Each pipeline stage owns a `thiserror`-derived enum with structured
//! context so the CLI can report which stage failed and for which
//! reference. I/O errors are wrapped in `Arc` to satisfy the
//! `result_large_err` Clippy lint and keep the enums cheap to clone.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::detect::PluginFormat;

/// Errors raised while loading an alias table.
#[derive(Debug, Error)]
pub enum AliasError {
    /// The alias file could not be read.
    #[error("failed to read alias file '{}': {source}", path.display())]
    Read {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The alias file is not valid YAML or does not match the schema.
    #[error("failed to parse alias file '{}': {message}", path.display())]
    Parse {
        /// File that was parsed.
        path: PathBuf,
        /// Parser diagnostic.
        message: String,
    },

    /// An alias entry is missing a required field.
    #[error("alias '{name}' is invalid: {message}")]
    Invalid {
        /// Alias key.
        name: String,
        /// Description of the validation failure.
        message: String,
    },
}

/// Errors raised while allocating or removing the ephemeral workspace.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// The workspace directory could not be created.
    #[error("failed to create plugin workspace under '{}': {source}", parent.display())]
    Create {
        /// Directory the workspace was to be created in.
        parent: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The workspace directory could not be removed.
    #[error("failed to remove plugin workspace '{}': {source}", path.display())]
    Remove {
        /// Workspace root.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },
}

/// Errors raised while retrieving plugin source.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The fetch tool could not be started.
    #[error("failed to start '{program}': {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// A fetch step exited unsuccessfully (unreachable repository, unknown
    /// ref or commit, authentication failure).
    #[error("{step} failed with status {status}: {stderr}")]
    Command {
        /// Human-readable description of the step, e.g. `git fetch`.
        step: String,
        /// Exit status, or `-1` when terminated by a signal.
        status: i32,
        /// Trimmed diagnostic output of the step.
        stderr: String,
    },

    /// The fetch was aborted by an external cancellation signal.
    #[error("fetch cancelled")]
    Cancelled,

    /// The fetch exceeded its configured deadline.
    #[error("fetch timed out after {timeout_secs}s")]
    TimedOut {
        /// Configured deadline in seconds.
        timeout_secs: u64,
    },

    /// Waiting on or reading from the fetch tool failed.
    #[error("I/O error while fetching: {source}")]
    Io {
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },
}

impl FetchError {
    /// Returns `true` when the fetch stopped because of an external signal.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Errors raised by format executors.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The plugin's manifest could not be read or describes nothing runnable.
    #[error("invalid plugin manifest '{}': {message}", path.display())]
    Manifest {
        /// Manifest file.
        path: PathBuf,
        /// Description of the problem.
        message: String,
    },

    /// The manifest selects a runtime this orchestrator cannot execute.
    #[error("unsupported plugin runtime '{runtime}'")]
    UnsupportedRuntime {
        /// Runtime named by the manifest.
        runtime: String,
    },

    /// A plugin process could not be spawned.
    #[error("failed to start '{program}': {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// A plugin process exited with a non-zero status code.
    #[error("'{program}' exited with non-zero status {status}")]
    NonZeroExit {
        /// Program that exited.
        program: String,
        /// Process exit status, `-1` when terminated by a signal.
        status: i32,
    },

    /// Streaming output from or waiting on a plugin process failed.
    #[error("I/O error running '{program}': {source}")]
    Io {
        /// Program being run.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },
}

/// Errors surfaced by the execution dispatcher, one per failing transition.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No repository remained after alias resolution.
    #[error("plugin reference '{name}' does not resolve to a repository")]
    UnresolvedReference {
        /// The plugin name that was looked up, possibly empty.
        name: String,
    },

    /// The ephemeral workspace could not be allocated.
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    /// Plugin source could not be retrieved.
    #[error("cannot fetch plugin '{repository}' at '{locator}': {source}")]
    Fetch {
        /// Repository that was fetched.
        repository: String,
        /// Commit or ref requested.
        locator: String,
        /// Underlying fetch failure.
        #[source]
        source: FetchError,
    },

    /// Plugin retrieval was cancelled by an external signal.
    #[error("fetch of plugin '{repository}' was cancelled")]
    Cancelled {
        /// Repository that was being fetched.
        repository: String,
    },

    /// The fetched tree matches none of the supported plugin formats.
    #[error("plugin '{repository}' has an unknown plugin type")]
    UnsupportedFormat {
        /// Repository that was fetched.
        repository: String,
    },

    /// The format executor failed.
    #[error("{format} plugin failed: {source}")]
    Executor {
        /// Format that was dispatched.
        format: PluginFormat,
        /// Underlying executor failure.
        #[source]
        source: ExecutorError,
    },
}
