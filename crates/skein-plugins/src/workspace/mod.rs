//! Ephemeral workspace holding fetched plugin source.
//!
//! A [`Workspace`] owns a uniquely named directory for the duration of one
//! invocation. The directory is removed by [`Workspace::release`] or, if the
//! owner never calls it, when the guard is dropped. Removal failures are
//! logged and swallowed so cleanup never changes the invocation outcome.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::error::WorkspaceError;

/// Tracing target for workspace lifecycle events.
const WORKSPACE_TARGET: &str = "skein_plugins::workspace";

/// Prefix of every workspace directory name.
const WORKSPACE_PREFIX: &str = "skein-plugin-";

/// RAII guard over the plugin source directory.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    dir: Option<TempDir>,
}

impl Workspace {
    /// Creates a new empty workspace under `parent`, or under the system
    /// temporary directory when `parent` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::Create`] when the directory cannot be made.
    pub fn acquire(parent: Option<&Path>) -> Result<Self, WorkspaceError> {
        let parent_dir = parent.map_or_else(env::temp_dir, Path::to_path_buf);
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(&parent_dir)
            .map_err(|source| WorkspaceError::Create {
                parent: parent_dir.clone(),
                source: Arc::new(source),
            })?;
        let root = dir.path().to_path_buf();
        debug!(
            target: WORKSPACE_TARGET,
            path = %root.display(),
            "workspace acquired"
        );
        Ok(Self {
            root,
            dir: Some(dir),
        })
    }

    /// Directory the plugin source is fetched into.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    /// Returns `true` until the directory has been released.
    #[must_use]
    pub const fn is_held(&self) -> bool {
        self.dir.is_some()
    }

    /// Removes the workspace directory and everything in it.
    ///
    /// Calling this more than once is a no-op. Failures are logged at `warn`
    /// and returned for callers that want to report them.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::Remove`] when the directory cannot be deleted.
    pub fn release(&mut self) -> Result<(), WorkspaceError> {
        let Some(dir) = self.dir.take() else {
            return Ok(());
        };
        match dir.close() {
            Ok(()) => {
                debug!(
                    target: WORKSPACE_TARGET,
                    path = %self.root.display(),
                    "workspace released"
                );
                Ok(())
            }
            Err(source) => {
                warn!(
                    target: WORKSPACE_TARGET,
                    path = %self.root.display(),
                    error = %source,
                    "failed to remove workspace"
                );
                Err(WorkspaceError::Remove {
                    path: self.root.clone(),
                    source: Arc::new(source),
                })
            }
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        drop(self.release());
    }
}
