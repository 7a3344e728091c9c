//! Plugin references as supplied by the caller and as validated for fetching.

use crate::alias::{AliasResolver, AliasTarget};

/// Caller-supplied description of which plugin to run.
///
/// Every field is optional; empty strings are treated as absent. A reference
/// is rewritten at most once, by [`PluginReference::resolve_alias`], and is
/// immutable afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginReference {
    name: String,
    repository: String,
    git_ref: String,
    commit: String,
}

impl PluginReference {
    /// Creates a reference from the four caller-supplied fields.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        repository: impl Into<String>,
        git_ref: impl Into<String>,
        commit: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            repository: repository.into(),
            git_ref: git_ref.into(),
            commit: commit.into(),
        }
    }

    /// Plugin alias, possibly empty.
    #[must_use]
    pub const fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Repository locator, possibly empty.
    #[must_use]
    pub const fn repository(&self) -> &str {
        self.repository.as_str()
    }

    /// Symbolic ref, possibly empty.
    #[must_use]
    pub const fn git_ref(&self) -> &str {
        self.git_ref.as_str()
    }

    /// Exact commit, possibly empty.
    #[must_use]
    pub const fn commit(&self) -> &str {
        self.commit.as_str()
    }

    /// Applies alias resolution.
    ///
    /// A matching alias replaces the repository and commit and clears the
    /// symbolic ref, so an alias always wins over explicit fields. An
    /// unrecognised or empty name returns the reference unchanged.
    #[must_use]
    pub fn resolve_alias<R: AliasResolver + ?Sized>(self, resolver: &R) -> Self {
        if self.name.is_empty() {
            return self;
        }
        let Some(target) = resolver.resolve(&self.name) else {
            return self;
        };
        self.with_target(target)
    }

    fn with_target(self, target: AliasTarget) -> Self {
        let (repository, commit) = target.into_parts();
        Self {
            name: self.name,
            repository,
            git_ref: String::new(),
            commit,
        }
    }

    /// Converts the reference into a fetch target.
    ///
    /// Returns `None` when no repository is known.
    #[must_use]
    pub fn to_source(&self) -> Option<PluginSource> {
        if self.repository.trim().is_empty() {
            return None;
        }
        Some(PluginSource {
            repository: self.repository.clone(),
            git_ref: non_empty(&self.git_ref),
            commit: non_empty(&self.commit),
        })
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// A validated fetch target: a repository plus the most specific locator
/// available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginSource {
    repository: String,
    git_ref: Option<String>,
    commit: Option<String>,
}

impl PluginSource {
    /// Builds a fetch target directly.
    #[must_use]
    pub fn new(
        repository: impl Into<String>,
        git_ref: Option<String>,
        commit: Option<String>,
    ) -> Self {
        Self {
            repository: repository.into(),
            git_ref,
            commit,
        }
    }

    /// Repository URL or path.
    #[must_use]
    pub const fn repository(&self) -> &str {
        self.repository.as_str()
    }

    /// Symbolic ref, when one was supplied.
    #[must_use]
    pub fn git_ref(&self) -> Option<&str> {
        self.git_ref.as_deref()
    }

    /// Exact commit, when one was supplied.
    #[must_use]
    pub fn commit(&self) -> Option<&str> {
        self.commit.as_deref()
    }

    /// The locator a fetch should use: commit, then ref, then `HEAD`.
    #[must_use]
    pub fn locator(&self) -> &str {
        self.commit()
            .or_else(|| self.git_ref())
            .unwrap_or("HEAD")
    }
}
