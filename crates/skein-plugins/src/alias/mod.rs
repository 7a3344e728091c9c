//! Alias resolution from short plugin names to pinned sources.
//!
//! An alias lets a pipeline refer to a plugin as `my-alias` instead of
//! spelling out a repository and commit. Resolution is a pure lookup:
//! unknown names are a normal outcome and never an error.
//!
//! The production table is loaded once at startup from a YAML document:
//!
//! ```yaml
//! aliases:
//!   my-alias:
//!     repository: https://github.com/example/plugin-a.git
//!     commit: 5e1f6b3c9d
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::error::AliasError;

/// Tracing target for alias resolution.
const ALIAS_TARGET: &str = "skein_plugins::alias";

/// Repository and commit an alias points at.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AliasTarget {
    repository: String,
    commit: String,
}

impl AliasTarget {
    /// Creates a target.
    #[must_use]
    pub fn new(repository: impl Into<String>, commit: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            commit: commit.into(),
        }
    }

    /// Repository URL or path.
    #[must_use]
    pub const fn repository(&self) -> &str {
        self.repository.as_str()
    }

    /// Pinned commit.
    #[must_use]
    pub const fn commit(&self) -> &str {
        self.commit.as_str()
    }

    pub(crate) fn into_parts(self) -> (String, String) {
        (self.repository, self.commit)
    }
}

/// Looks up a plugin name.
///
/// Implementations must be side-effect free: the dispatcher calls this once
/// per invocation and treats `None` as "use the caller's fields".
pub trait AliasResolver {
    /// Returns the pinned source for `name`, or `None` when it is not an alias.
    fn resolve(&self, name: &str) -> Option<AliasTarget>;
}

/// In-memory alias table.
///
/// # Example
///
/// ```
/// use skein_plugins::{AliasResolver, AliasTable, AliasTarget};
///
/// let mut table = AliasTable::new();
/// table.insert("my-alias", AliasTarget::new("git://example/plugin-a", "abc123"));
/// let target = table.resolve("my-alias").expect("alias is known");
/// assert_eq!(target.commit(), "abc123");
/// assert!(table.resolve("other").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    entries: HashMap<String, AliasTarget>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AliasDocument {
    #[serde(default)]
    aliases: BTreeMap<String, AliasTarget>,
}

impl AliasTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an alias.
    pub fn insert(&mut self, name: impl Into<String>, target: AliasTarget) {
        self.entries.insert(name.into(), target);
    }

    /// Number of aliases in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the table holds no aliases.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Loads a table from a YAML alias file.
    ///
    /// # Errors
    ///
    /// Returns [`AliasError::Read`] when the file cannot be read, and the
    /// errors of [`AliasTable::from_yaml`] otherwise.
    pub fn load(path: &Path) -> Result<Self, AliasError> {
        let text = std::fs::read_to_string(path).map_err(|source| AliasError::Read {
            path: path.to_path_buf(),
            source: Arc::new(source),
        })?;
        let table = Self::from_yaml(path, &text)?;
        debug!(
            target: ALIAS_TARGET,
            file = %path.display(),
            aliases = table.len(),
            "alias table loaded"
        );
        Ok(table)
    }

    /// Parses a table from YAML text; `origin` is used in diagnostics only.
    ///
    /// # Errors
    ///
    /// Returns [`AliasError::Parse`] for malformed documents and
    /// [`AliasError::Invalid`] for entries with a blank repository or commit.
    pub fn from_yaml(origin: &Path, text: &str) -> Result<Self, AliasError> {
        let document: AliasDocument =
            serde_saphyr::from_str(text).map_err(|error| AliasError::Parse {
                path: origin.to_path_buf(),
                message: error.to_string(),
            })?;

        let mut table = Self::new();
        for (name, target) in document.aliases {
            validate_entry(&name, &target)?;
            table.insert(name, target);
        }
        Ok(table)
    }
}

fn validate_entry(name: &str, target: &AliasTarget) -> Result<(), AliasError> {
    for (field, value) in [("repository", &target.repository), ("commit", &target.commit)] {
        if value.trim().is_empty() {
            return Err(AliasError::Invalid {
                name: name.to_owned(),
                message: format!("{field} must not be empty"),
            });
        }
    }
    Ok(())
}

impl AliasResolver for AliasTable {
    fn resolve(&self, name: &str) -> Option<AliasTarget> {
        let target = self.entries.get(name).cloned();
        debug!(
            target: ALIAS_TARGET,
            plugin = name,
            found = target.is_some(),
            "alias lookup"
        );
        target
    }
}

#[cfg(test)]
mod tests;
