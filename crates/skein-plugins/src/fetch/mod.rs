//! Retrieval of plugin source into the workspace.
//!
//! [`SourceFetcher`] is the seam between the dispatcher and the network. The
//! production [`GitFetcher`] drives the `git` executable; tests substitute
//! doubles that write fixture trees.

use std::path::Path;

use crate::cancel::CancelToken;
use crate::error::FetchError;
use crate::reference::PluginSource;

mod git;

pub use self::git::GitFetcher;

/// Materialises plugin source in a directory.
pub trait SourceFetcher {
    /// Fetches `source` into `destination`, which exists and is empty.
    ///
    /// An exact commit wins over a symbolic ref; with neither the remote's
    /// default `HEAD` is used. Implementations must stop promptly once
    /// `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] when the source cannot be retrieved or the
    /// fetch was cancelled or timed out.
    fn fetch(
        &self,
        source: &PluginSource,
        destination: &Path,
        cancel: &CancelToken,
    ) -> Result<(), FetchError>;
}
