//! The execution dispatcher: resolve, fetch, detect, execute.
//!
//! [`Dispatcher::run`] walks one plugin reference through the pipeline
//! stages in [`DispatchStage`] order. Every failure maps to exactly one
//! [`DispatchError`] variant, and the workspace is released exactly once on
//! every path that acquired it. The dispatcher never terminates the process;
//! exit-code translation belongs to the caller.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use crate::alias::AliasResolver;
use crate::cancel::CancelToken;
use crate::detect;
use crate::error::{DispatchError, FetchError};
use crate::executor::{Environ, ExecutionRequest, ExecutionResult, ExecutorSet};
use crate::fetch::SourceFetcher;
use crate::reference::{PluginReference, PluginSource};
use crate::workspace::Workspace;

/// Tracing target for dispatcher transitions.
const DISPATCH_TARGET: &str = "skein_plugins::dispatch";

/// Pipeline states, in transition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStage {
    /// Nothing has happened yet.
    Start,
    /// Alias resolution has been applied.
    AliasResolved,
    /// The ephemeral workspace exists.
    WorkspaceAcquired,
    /// Plugin source is present in the workspace.
    SourceFetched,
    /// The plugin format is known.
    TypeDetected,
    /// An executor has been invoked.
    Dispatched,
    /// The plugin completed successfully.
    Succeeded,
    /// The pipeline stopped with an error.
    Failed,
}

impl DispatchStage {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::AliasResolved => "alias-resolved",
            Self::WorkspaceAcquired => "workspace-acquired",
            Self::SourceFetched => "source-fetched",
            Self::TypeDetected => "type-detected",
            Self::Dispatched => "dispatched",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for DispatchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DispatchError {
    /// The stage the pipeline was in when this error stopped it.
    #[must_use]
    pub const fn stage(&self) -> DispatchStage {
        match self {
            Self::UnresolvedReference { .. } | Self::Workspace(_) => DispatchStage::AliasResolved,
            Self::Fetch { .. } | Self::Cancelled { .. } => DispatchStage::WorkspaceAcquired,
            Self::UnsupportedFormat { .. } => DispatchStage::TypeDetected,
            Self::Executor { .. } => DispatchStage::Dispatched,
        }
    }
}

/// Process-global state captured once by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    work_dir: PathBuf,
    environment: Environ,
}

impl InvocationContext {
    /// Creates a context from explicit values.
    #[must_use]
    pub fn new(work_dir: impl Into<PathBuf>, environment: Environ) -> Self {
        Self {
            work_dir: work_dir.into(),
            environment,
        }
    }

    /// Captures the current directory and environment of this process.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the current directory cannot be determined.
    pub fn capture() -> io::Result<Self> {
        Ok(Self::new(std::env::current_dir()?, Environ::from_process()))
    }

    /// The caller's working directory.
    #[must_use]
    pub fn work_dir(&self) -> &Path {
        self.work_dir.as_path()
    }

    /// The inherited environment.
    #[must_use]
    pub const fn environment(&self) -> &Environ {
        &self.environment
    }
}

/// Output sinks handed to the plugin.
pub struct OutputSinks<'a> {
    stdout: &'a mut (dyn Write + Send),
    stderr: &'a mut (dyn Write + Send),
}

impl<'a> OutputSinks<'a> {
    /// Bundles the plugin's stdout and stderr sinks.
    pub const fn new(
        stdout: &'a mut (dyn Write + Send),
        stderr: &'a mut (dyn Write + Send),
    ) -> Self {
        Self { stdout, stderr }
    }
}

/// Sequences alias resolution, workspace management, fetching, detection,
/// and execution.
///
/// # Example
///
/// ```no_run
/// use skein_plugins::{
///     AliasTable, CancelToken, Dispatcher, FormatExecutors, GitFetcher, InvocationContext,
///     OutputSinks, PluginReference, Toolchain,
/// };
///
/// let dispatcher = Dispatcher::new(
///     AliasTable::new(),
///     GitFetcher::default(),
///     FormatExecutors::new(&Toolchain::default()),
/// );
/// let context = InvocationContext::capture().expect("current directory");
/// let reference = PluginReference::new("", "https://example.com/plugin.git", "main", "");
/// let (mut stdout, mut stderr) = (std::io::stdout(), std::io::stderr());
/// let outcome = dispatcher.run(
///     reference,
///     &context,
///     &CancelToken::new(),
///     OutputSinks::new(&mut stdout, &mut stderr),
/// );
/// assert!(outcome.is_ok());
/// ```
#[derive(Debug)]
pub struct Dispatcher<A, F, X> {
    resolver: A,
    fetcher: F,
    executors: X,
    workspace_root: Option<PathBuf>,
    fetch_timeout: Option<Duration>,
}

impl<A, F, X> Dispatcher<A, F, X>
where
    A: AliasResolver,
    F: SourceFetcher,
    X: ExecutorSet,
{
    /// Creates a dispatcher with workspaces under the system temp directory
    /// and no fetch deadline.
    #[must_use]
    pub const fn new(resolver: A, fetcher: F, executors: X) -> Self {
        Self {
            resolver,
            fetcher,
            executors,
            workspace_root: None,
            fetch_timeout: None,
        }
    }

    /// Creates workspaces under `root` instead of the system temp directory.
    #[must_use]
    pub fn with_workspace_root(mut self, root: Option<PathBuf>) -> Self {
        self.workspace_root = root;
        self
    }

    /// Bounds each fetch by `timeout`; `None` disables the deadline.
    #[must_use]
    pub const fn with_fetch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Runs the plugin named by `reference`.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] naming the first failing stage.
    pub fn run(
        &self,
        reference: PluginReference,
        context: &InvocationContext,
        cancel: &CancelToken,
        sinks: OutputSinks<'_>,
    ) -> Result<ExecutionResult, DispatchError> {
        let outcome = self.run_stages(reference, context, cancel, sinks);
        match &outcome {
            Ok(result) => {
                transition(DispatchStage::Succeeded);
                info!(
                    target: DISPATCH_TARGET,
                    exit_code = ?result.exit_code(),
                    "plugin succeeded"
                );
            }
            Err(error) => {
                transition(DispatchStage::Failed);
                debug!(
                    target: DISPATCH_TARGET,
                    stage = %error.stage(),
                    %error,
                    "dispatch failed"
                );
            }
        }
        outcome
    }

    fn run_stages(
        &self,
        reference: PluginReference,
        context: &InvocationContext,
        cancel: &CancelToken,
        sinks: OutputSinks<'_>,
    ) -> Result<ExecutionResult, DispatchError> {
        transition(DispatchStage::Start);
        let resolved = reference.resolve_alias(&self.resolver);
        transition(DispatchStage::AliasResolved);

        let Some(source) = resolved.to_source() else {
            return Err(DispatchError::UnresolvedReference {
                name: resolved.name().to_owned(),
            });
        };
        info!(
            target: DISPATCH_TARGET,
            name = resolved.name(),
            repository = source.repository(),
            locator = source.locator(),
            "dispatching plugin"
        );

        let mut workspace = Workspace::acquire(self.workspace_root.as_deref())?;
        transition(DispatchStage::WorkspaceAcquired);
        let outcome = self.run_in_workspace(&source, workspace.root(), context, cancel, sinks);
        drop(workspace.release());
        outcome
    }

    fn run_in_workspace(
        &self,
        source: &PluginSource,
        source_dir: &Path,
        context: &InvocationContext,
        cancel: &CancelToken,
        sinks: OutputSinks<'_>,
    ) -> Result<ExecutionResult, DispatchError> {
        let fetch_cancel = self
            .fetch_timeout
            .map_or_else(|| cancel.clone(), |timeout| cancel.with_timeout(timeout));
        self.fetcher
            .fetch(source, source_dir, &fetch_cancel)
            .map_err(|error| fetch_failure(source, error))?;
        transition(DispatchStage::SourceFetched);

        let format = detect::detect(source_dir);
        transition(DispatchStage::TypeDetected);

        let executor = self
            .executors
            .executor_for(format)
            .ok_or_else(|| DispatchError::UnsupportedFormat {
                repository: source.repository().to_owned(),
            })?;

        let request = ExecutionRequest::new(
            source_dir,
            context.work_dir(),
            context.environment(),
            sinks.stdout,
            sinks.stderr,
        );
        transition(DispatchStage::Dispatched);
        executor
            .execute(request)
            .map_err(|source| DispatchError::Executor { format, source })
    }
}

fn fetch_failure(source: &PluginSource, error: FetchError) -> DispatchError {
    if error.is_cancelled() {
        return DispatchError::Cancelled {
            repository: source.repository().to_owned(),
        };
    }
    DispatchError::Fetch {
        repository: source.repository().to_owned(),
        locator: source.locator().to_owned(),
        source: error,
    }
}

fn transition(stage: DispatchStage) {
    debug!(target: DISPATCH_TARGET, %stage, "dispatch stage");
}
