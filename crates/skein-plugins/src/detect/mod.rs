//! Classification of a fetched source tree into a plugin format.
//!
//! Detection inspects marker manifests at the root of the tree in a fixed
//! order and returns the first match. It never mutates the tree and never
//! fails: anything unrecognised is [`PluginFormat::Unknown`].

use std::path::{Path, PathBuf};

use tracing::debug;

const DETECT_TARGET: &str = "skein_plugins::detect";

/// Marker manifest of a Harness plugin.
pub const HARNESS_MANIFEST: &str = "plugin.yml";

/// Marker manifest of a Bitrise step.
pub const BITRISE_MANIFEST: &str = "step.yml";

/// Marker manifests of a GitHub Action, in lookup order.
pub const ACTION_MANIFESTS: [&str; 2] = ["action.yml", "action.yaml"];

/// Supported plugin authoring formats.
///
/// # Example
///
/// ```
/// use skein_plugins::PluginFormat;
///
/// assert_eq!(PluginFormat::GithubAction.as_str(), "github-action");
/// assert!(!PluginFormat::Unknown.is_known());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginFormat {
    /// Harness plugin (`plugin.yml`).
    Harness,
    /// Bitrise step (`step.yml`).
    Bitrise,
    /// GitHub Action (`action.yml` or `action.yaml`).
    GithubAction,
    /// No marker manifest was found.
    Unknown,
}

impl PluginFormat {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Harness => "harness",
            Self::Bitrise => "bitrise",
            Self::GithubAction => "github-action",
            Self::Unknown => "unknown",
        }
    }

    /// Returns `true` for every format that has an executor.
    #[must_use]
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl std::fmt::Display for PluginFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies the tree rooted at `source_dir`.
///
/// Precedence is Harness, then Bitrise, then GitHub Action. Only regular
/// files count as markers.
#[must_use]
pub fn detect(source_dir: &Path) -> PluginFormat {
    let format = if is_marker(&source_dir.join(HARNESS_MANIFEST)) {
        PluginFormat::Harness
    } else if is_marker(&source_dir.join(BITRISE_MANIFEST)) {
        PluginFormat::Bitrise
    } else if action_manifest(source_dir).is_some() {
        PluginFormat::GithubAction
    } else {
        PluginFormat::Unknown
    };
    debug!(
        target: DETECT_TARGET,
        path = %source_dir.display(),
        %format,
        "plugin format detected"
    );
    format
}

/// Returns the GitHub Action manifest in `source_dir`, if any.
#[must_use]
pub fn action_manifest(source_dir: &Path) -> Option<PathBuf> {
    ACTION_MANIFESTS
        .iter()
        .map(|name| source_dir.join(name))
        .find(|path| is_marker(path))
}

fn is_marker(path: &Path) -> bool {
    path.is_file()
}
