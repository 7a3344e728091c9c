//! `git`-backed source fetcher.

use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::thread;

use tracing::{debug, info, warn};

use super::SourceFetcher;
use crate::cancel::CancelToken;
use crate::error::FetchError;
use crate::process::{
    Interrupt, WaitOutcome, drain_to_string, isolate_process_group, wait_interruptible,
};
use crate::reference::PluginSource;

/// Tracing target for fetch operations.
const FETCH_TARGET: &str = "skein_plugins::fetch";

/// Fetches plugin source with the `git` executable.
///
/// The destination is initialised as a fresh repository, the requested
/// commit or ref is fetched shallowly, and the result is checked out. When a
/// remote refuses a shallow fetch of a bare commit the fetcher falls back to
/// a full fetch before checking the commit out.
#[derive(Debug, Clone)]
pub struct GitFetcher {
    git: String,
}

impl GitFetcher {
    /// Creates a fetcher invoking `git` (a program name or path).
    #[must_use]
    pub fn new(git: impl Into<String>) -> Self {
        Self { git: git.into() }
    }

    fn git(
        &self,
        destination: &Path,
        args: &[&str],
        cancel: &CancelToken,
    ) -> Result<(), FetchError> {
        let step = format!("git {}", args.first().copied().unwrap_or_default());
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        if let Some(budget) = cancel.deadline_passed() {
            return Err(FetchError::TimedOut {
                timeout_secs: budget.as_secs(),
            });
        }

        debug!(target: FETCH_TARGET, ?args, "running git");
        let mut command = Command::new(&self.git);
        command
            .args(args)
            .current_dir(destination)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        // Transport helpers (`git-remote-*`, `index-pack`) join git's group
        // and are killed with it on interrupt.
        isolate_process_group(&mut command);
        let mut child = command
            .spawn()
            .map_err(|source| FetchError::Spawn {
                program: self.git.clone(),
                source: Arc::new(source),
            })?;

        // Detached so a lingering transport helper holding the pipe open
        // cannot block an interrupted fetch.
        let stderr_pipe = child.stderr.take();
        let reader = thread::spawn(move || drain_to_string(stderr_pipe));

        let outcome = wait_interruptible(&mut child, cancel).map_err(|source| FetchError::Io {
            source: Arc::new(source),
        })?;

        match outcome {
            WaitOutcome::Exited(status) => {
                let stderr = reader.join().unwrap_or_default();
                if status.success() {
                    return Ok(());
                }
                Err(FetchError::Command {
                    step,
                    status: status.code().unwrap_or(-1),
                    stderr,
                })
            }
            WaitOutcome::Interrupted(Interrupt::Cancelled) => Err(FetchError::Cancelled),
            WaitOutcome::Interrupted(Interrupt::TimedOut(budget)) => Err(FetchError::TimedOut {
                timeout_secs: budget.as_secs(),
            }),
        }
    }

    fn fetch_commit(
        &self,
        source: &PluginSource,
        commit: &str,
        destination: &Path,
        cancel: &CancelToken,
    ) -> Result<(), FetchError> {
        let shallow = self.git(
            destination,
            &["fetch", "--quiet", "--depth=1", "origin", commit],
            cancel,
        );
        match shallow {
            Ok(()) => {}
            Err(FetchError::Command { stderr, .. }) => {
                warn!(
                    target: FETCH_TARGET,
                    commit,
                    %stderr,
                    "shallow commit fetch refused, fetching full history"
                );
                let mut args = vec!["fetch", "--quiet", "origin"];
                args.extend(source.git_ref());
                self.git(destination, &args, cancel)?;
            }
            Err(other) => return Err(other),
        }
        self.git(destination, &["checkout", "--quiet", "--force", commit], cancel)
    }
}

impl Default for GitFetcher {
    fn default() -> Self {
        Self::new("git")
    }
}

impl SourceFetcher for GitFetcher {
    fn fetch(
        &self,
        source: &PluginSource,
        destination: &Path,
        cancel: &CancelToken,
    ) -> Result<(), FetchError> {
        info!(
            target: FETCH_TARGET,
            repository = source.repository(),
            locator = source.locator(),
            "fetching plugin source"
        );
        self.git(destination, &["init", "--quiet"], cancel)?;
        self.git(
            destination,
            &["remote", "add", "origin", source.repository()],
            cancel,
        )?;

        if let Some(commit) = source.commit() {
            return self.fetch_commit(source, commit, destination, cancel);
        }

        self.git(
            destination,
            &["fetch", "--quiet", "--depth=1", "origin", source.locator()],
            cancel,
        )?;
        self.git(
            destination,
            &["checkout", "--quiet", "--force", "FETCH_HEAD"],
            cancel,
        )
    }
}
