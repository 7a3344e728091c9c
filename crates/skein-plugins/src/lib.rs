//! Plugin resolution, retrieval, and execution for CI pipeline steps.
//!
//! The `skein-plugins` crate turns a logical plugin reference, a
//! `(name, repository, ref, commit)` tuple, into a running child process.
//! The pipeline is strictly linear:
//!
//! 1. an [`AliasResolver`] may rewrite the reference to a pinned source;
//! 2. a [`Workspace`] is allocated for the fetched tree;
//! 3. a [`SourceFetcher`] retrieves the source into the workspace;
//! 4. [`detect`](detect::detect) classifies the tree as a [`PluginFormat`];
//! 5. the matching [`FormatExecutor`] runs the plugin in the caller's working
//!    directory with the caller's environment and output streams.
//!
//! The [`Dispatcher`] sequences these stages, reports failures as
//! [`DispatchError`], and releases the workspace on every path.
//!
//! # Example
//!
//! ```rust,no_run
//! use skein_plugins::{
//!     AliasTable, CancelToken, Dispatcher, FormatExecutors, GitFetcher, InvocationContext,
//!     OutputSinks, PluginReference, Toolchain,
//! };
//!
//! let dispatcher = Dispatcher::new(
//!     AliasTable::new(),
//!     GitFetcher::default(),
//!     FormatExecutors::new(&Toolchain::default()),
//! );
//! let context = InvocationContext::capture().expect("current directory is readable");
//! let (mut stdout, mut stderr) = (std::io::stdout(), std::io::stderr());
//! dispatcher
//!     .run(
//!         PluginReference::new("", "https://github.com/example/step.git", "main", ""),
//!         &context,
//!         &CancelToken::new(),
//!         OutputSinks::new(&mut stdout, &mut stderr),
//!     )
//!     .expect("plugin succeeds");
//! ```

pub mod alias;
pub mod cancel;
pub mod detect;
pub mod dispatch;
pub mod error;
pub mod executor;
pub mod fetch;
mod process;
pub mod reference;
pub mod workspace;

#[cfg(test)]
mod tests;

pub use self::alias::{AliasResolver, AliasTable, AliasTarget};
pub use self::cancel::CancelToken;
pub use self::detect::PluginFormat;
pub use self::dispatch::{DispatchStage, Dispatcher, InvocationContext, OutputSinks};
pub use self::error::{AliasError, DispatchError, ExecutorError, FetchError, WorkspaceError};
pub use self::executor::{
    BitriseExecutor, Environ, ExecutionRequest, ExecutionResult, ExecutorSet, FormatExecutor,
    FormatExecutors, GithubActionExecutor, HarnessExecutor, Toolchain,
};
pub use self::fetch::{GitFetcher, SourceFetcher};
pub use self::reference::{PluginReference, PluginSource};
pub use self::workspace::Workspace;
