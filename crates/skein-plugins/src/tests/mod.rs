//! Crate-level test doubles and BDD scenarios for the dispatcher.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use mockall::mock;
use tempfile::TempDir;

use crate::alias::{AliasResolver, AliasTable, AliasTarget};
use crate::cancel::CancelToken;
use crate::detect::PluginFormat;
use crate::dispatch::{Dispatcher, InvocationContext, OutputSinks};
use crate::error::{DispatchError, ExecutorError, FetchError};
use crate::executor::{Environ, ExecutionRequest, ExecutionResult, FormatExecutor, FormatExecutors};
use crate::fetch::SourceFetcher;
use crate::reference::{PluginReference, PluginSource};

mod behaviour;

mock! {
    pub(crate) Resolver {}
    impl AliasResolver for Resolver {
        fn resolve(&self, name: &str) -> Option<AliasTarget>;
    }
}

mock! {
    pub(crate) Fetcher {}
    impl SourceFetcher for Fetcher {
        fn fetch(
            &self,
            source: &PluginSource,
            destination: &Path,
            cancel: &CancelToken,
        ) -> Result<(), FetchError>;
    }
}

/// What a recording executor observed.
#[derive(Debug, Clone)]
pub(crate) struct Invocation {
    pub(crate) format: PluginFormat,
    pub(crate) source_dir: PathBuf,
    pub(crate) work_dir: PathBuf,
    pub(crate) environment: Environ,
    pub(crate) source_present: bool,
}

pub(crate) type InvocationLog = Rc<RefCell<Vec<Invocation>>>;

/// Executor double that records its request instead of spawning anything.
pub(crate) struct RecordingExecutor {
    format: PluginFormat,
    log: InvocationLog,
    failure: Option<i32>,
}

impl RecordingExecutor {
    pub(crate) fn new(format: PluginFormat, log: &InvocationLog) -> Self {
        Self {
            format,
            log: Rc::clone(log),
            failure: None,
        }
    }

    pub(crate) const fn failing_with(mut self, status: i32) -> Self {
        self.failure = Some(status);
        self
    }
}

impl FormatExecutor for RecordingExecutor {
    fn execute(&self, request: ExecutionRequest<'_>) -> Result<ExecutionResult, ExecutorError> {
        self.log.borrow_mut().push(Invocation {
            format: self.format,
            source_dir: request.source_dir().to_path_buf(),
            work_dir: request.work_dir().to_path_buf(),
            environment: request.environment().clone(),
            source_present: request.source_dir().is_dir(),
        });
        match self.failure {
            Some(status) => Err(ExecutorError::NonZeroExit {
                program: String::from("plugin"),
                status,
            }),
            None => Ok(ExecutionResult::new(Some(0))),
        }
    }
}

pub(crate) type RecordingExecutors =
    FormatExecutors<RecordingExecutor, RecordingExecutor, RecordingExecutor>;

/// Recording executors for every known format, sharing one log.
pub(crate) fn recording_executors(log: &InvocationLog) -> RecordingExecutors {
    FormatExecutors::with_executors(
        RecordingExecutor::new(PluginFormat::Harness, log),
        RecordingExecutor::new(PluginFormat::Bitrise, log),
        RecordingExecutor::new(PluginFormat::GithubAction, log),
    )
}

/// Builds a fetcher double that writes `markers` into the destination and
/// records the destination it was given.
pub(crate) fn fetcher_writing(
    markers: &'static [&'static str],
    seen: &Arc<Mutex<Option<PathBuf>>>,
) -> MockFetcher {
    let seen_destination = Arc::clone(seen);
    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_fetch()
        .once()
        .returning(move |_source, destination, _cancel| {
            if let Ok(mut slot) = seen_destination.lock() {
                *slot = Some(destination.to_path_buf());
            }
            for marker in markers {
                fs::write(destination.join(marker), "name: fixture\n").expect("write marker");
            }
            Ok(())
        });
    fetcher
}

/// Builds a fetcher double that fails with `error()` and records the
/// destination it was given.
pub(crate) fn fetcher_failing(
    error: fn() -> FetchError,
    seen: &Arc<Mutex<Option<PathBuf>>>,
) -> MockFetcher {
    let seen_destination = Arc::clone(seen);
    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_fetch()
        .once()
        .returning(move |_source, destination, _cancel| {
            if let Ok(mut slot) = seen_destination.lock() {
                *slot = Some(destination.to_path_buf());
            }
            Err(error())
        });
    fetcher
}

pub(crate) fn unreachable_repository() -> FetchError {
    FetchError::Command {
        step: String::from("git fetch"),
        status: 128,
        stderr: String::from("fatal: repository not found"),
    }
}

/// The alias table used across scenarios.
pub(crate) fn scenario_aliases() -> AliasTable {
    let mut table = AliasTable::new();
    table.insert(
        "my-alias",
        AliasTarget::new("git://example/plugin-a", "abc123"),
    );
    table
}

/// Runs `reference` through a dispatcher whose workspaces live under
/// `workspace_root`, discarding plugin output.
pub(crate) fn dispatch_with<A: AliasResolver, F: SourceFetcher>(
    resolver: A,
    fetcher: F,
    executors: RecordingExecutors,
    workspace_root: &TempDir,
    reference: PluginReference,
    context: &InvocationContext,
) -> Result<ExecutionResult, DispatchError> {
    let dispatcher = Dispatcher::new(resolver, fetcher, executors)
        .with_workspace_root(Some(workspace_root.path().to_path_buf()));
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    dispatcher.run(
        reference,
        context,
        &CancelToken::new(),
        OutputSinks::new(&mut stdout, &mut stderr),
    )
}

/// Returns `true` when `root` holds no entries.
pub(crate) fn is_empty_dir(root: &Path) -> bool {
    fs::read_dir(root)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}

#[test]
fn alias_table_drives_a_full_dispatch() {
    let root = TempDir::new().expect("workspace root");
    let work = TempDir::new().expect("work dir");
    let seen = Arc::new(Mutex::new(None));
    let log = InvocationLog::default();
    let context = InvocationContext::new(work.path(), Environ::from_iter(["CI=true"]));

    let result = dispatch_with(
        scenario_aliases(),
        fetcher_writing(&["step.yml"], &seen),
        recording_executors(&log),
        &root,
        PluginReference::new("my-alias", "", "", ""),
        &context,
    )
    .expect("dispatch succeeds");

    assert_eq!(result.exit_code(), Some(0));
    let invocations = log.borrow();
    assert_eq!(invocations.len(), 1);
    assert!(invocations.iter().all(|call| call.format == PluginFormat::Bitrise));
    assert!(is_empty_dir(root.path()), "workspace leaked");
}
