//! Format executors and the request they consume.
//!
//! Each supported [`PluginFormat`] has one executor implementing
//! [`FormatExecutor`]. The dispatcher selects an executor through
//! [`ExecutorSet::executor_for`], which the production
//! [`FormatExecutors`] implements as a `match` over the closed format enum.
//! The trait seams let tests substitute recording doubles without spawning
//! processes.

use std::io::Write;
use std::path::Path;
use std::process::Command;

use crate::detect::PluginFormat;
use crate::error::ExecutorError;
use crate::process;

mod bitrise;
mod environ;
mod github;
mod harness;
mod manifest;

pub use self::bitrise::BitriseExecutor;
pub use self::environ::Environ;
pub use self::github::GithubActionExecutor;
pub use self::harness::HarnessExecutor;

/// Everything an executor needs to run one plugin.
///
/// Built once by the dispatcher after a known format has been detected and
/// consumed by exactly one executor. Process-global state (working directory,
/// environment, standard streams) arrives here explicitly so executors never
/// read it ambiently.
pub struct ExecutionRequest<'a> {
    source_dir: &'a Path,
    work_dir: &'a Path,
    environment: &'a Environ,
    stdout: &'a mut (dyn Write + Send),
    stderr: &'a mut (dyn Write + Send),
}

impl<'a> ExecutionRequest<'a> {
    /// Bundles the request fields.
    pub const fn new(
        source_dir: &'a Path,
        work_dir: &'a Path,
        environment: &'a Environ,
        stdout: &'a mut (dyn Write + Send),
        stderr: &'a mut (dyn Write + Send),
    ) -> Self {
        Self {
            source_dir,
            work_dir,
            environment,
            stdout,
            stderr,
        }
    }

    /// Directory holding the fetched plugin source.
    #[must_use]
    pub const fn source_dir(&self) -> &'a Path {
        self.source_dir
    }

    /// The caller's working directory; plugin processes run here.
    #[must_use]
    pub const fn work_dir(&self) -> &'a Path {
        self.work_dir
    }

    /// The inherited environment.
    #[must_use]
    pub const fn environment(&self) -> &'a Environ {
        self.environment
    }

    /// Runs `command` in `dir` with exactly `environ`, streaming output into
    /// the request's sinks.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::Spawn`], [`ExecutorError::Io`], or
    /// [`ExecutorError::NonZeroExit`].
    pub fn run_in(
        &mut self,
        dir: &Path,
        mut command: Command,
        environ: &Environ,
    ) -> Result<ExecutionResult, ExecutorError> {
        let program = command.get_program().to_string_lossy().into_owned();
        command.current_dir(dir);
        process::apply_environment(&mut command, environ);
        process::run_streaming(command, &program, &mut *self.stdout, &mut *self.stderr)
    }

    /// Runs `command` in the caller's working directory.
    ///
    /// # Errors
    ///
    /// See [`ExecutionRequest::run_in`].
    pub fn run(
        &mut self,
        command: Command,
        environ: &Environ,
    ) -> Result<ExecutionResult, ExecutorError> {
        let work_dir = self.work_dir;
        self.run_in(work_dir, command, environ)
    }
}

impl std::fmt::Debug for ExecutionRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionRequest")
            .field("source_dir", &self.source_dir)
            .field("work_dir", &self.work_dir)
            .field("environment_len", &self.environment.len())
            .finish_non_exhaustive()
    }
}

/// Successful completion of a plugin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    exit_code: Option<i32>,
}

impl ExecutionResult {
    /// Creates a result with the child's exit code, when one exists.
    #[must_use]
    pub const fn new(exit_code: Option<i32>) -> Self {
        Self { exit_code }
    }

    /// The child's exit code.
    #[must_use]
    pub const fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }
}

/// Runs a plugin of one particular format.
///
/// # Example
///
/// ```
/// use skein_plugins::{ExecutionRequest, ExecutionResult, ExecutorError, FormatExecutor};
///
/// struct NoopExecutor;
///
/// impl FormatExecutor for NoopExecutor {
///     fn execute(&self, _request: ExecutionRequest<'_>) -> Result<ExecutionResult, ExecutorError> {
///         Ok(ExecutionResult::new(Some(0)))
///     }
/// }
/// ```
pub trait FormatExecutor {
    /// Interprets the fetched source tree and runs the plugin.
    ///
    /// # Errors
    ///
    /// Returns an [`ExecutorError`] if the manifest is unusable, the runtime
    /// is unsupported, or a plugin process fails.
    fn execute(&self, request: ExecutionRequest<'_>) -> Result<ExecutionResult, ExecutorError>;
}

/// Maps a detected format to its executor.
pub trait ExecutorSet {
    /// Returns the executor for `format`, or `None` for
    /// [`PluginFormat::Unknown`].
    fn executor_for(&self, format: PluginFormat) -> Option<&dyn FormatExecutor>;
}

/// External programs the executors invoke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    bash: String,
    go: String,
    node: String,
    sh: String,
}

impl Toolchain {
    /// Creates a toolchain from explicit program names or paths.
    #[must_use]
    pub fn new(bash: impl Into<String>, go: impl Into<String>, node: impl Into<String>) -> Self {
        Self {
            bash: bash.into(),
            go: go.into(),
            node: node.into(),
            sh: String::from("sh"),
        }
    }

    /// Replaces the POSIX `sh` used by composite action steps.
    #[must_use]
    pub fn with_sh(mut self, sh: impl Into<String>) -> Self {
        self.sh = sh.into();
        self
    }

    /// The `bash` program.
    #[must_use]
    pub const fn bash(&self) -> &str {
        self.bash.as_str()
    }

    /// The `go` program.
    #[must_use]
    pub const fn go(&self) -> &str {
        self.go.as_str()
    }

    /// The `node` program.
    #[must_use]
    pub const fn node(&self) -> &str {
        self.node.as_str()
    }

    /// The `sh` program.
    #[must_use]
    pub const fn sh(&self) -> &str {
        self.sh.as_str()
    }
}

impl Default for Toolchain {
    fn default() -> Self {
        Self::new("bash", "go", "node")
    }
}

/// One executor per supported format, selected by tagged dispatch.
#[derive(Debug, Clone)]
pub struct FormatExecutors<H = HarnessExecutor, B = BitriseExecutor, G = GithubActionExecutor> {
    harness: H,
    bitrise: B,
    github: G,
}

impl FormatExecutors {
    /// Builds the production executors over `toolchain`.
    #[must_use]
    pub fn new(toolchain: &Toolchain) -> Self {
        Self::with_executors(
            HarnessExecutor::new(toolchain.clone()),
            BitriseExecutor::new(toolchain.clone()),
            GithubActionExecutor::new(toolchain.clone()),
        )
    }
}

impl<H, B, G> FormatExecutors<H, B, G> {
    /// Assembles a set from explicit executors.
    #[must_use]
    pub const fn with_executors(harness: H, bitrise: B, github: G) -> Self {
        Self {
            harness,
            bitrise,
            github,
        }
    }
}

impl<H, B, G> ExecutorSet for FormatExecutors<H, B, G>
where
    H: FormatExecutor,
    B: FormatExecutor,
    G: FormatExecutor,
{
    fn executor_for(&self, format: PluginFormat) -> Option<&dyn FormatExecutor> {
        match format {
            PluginFormat::Harness => Some(&self.harness),
            PluginFormat::Bitrise => Some(&self.bitrise),
            PluginFormat::GithubAction => Some(&self.github),
            PluginFormat::Unknown => None,
        }
    }
}
