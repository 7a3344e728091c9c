//! Ordered `KEY=value` environment forwarded to plugin processes.

use std::env;
use std::ffi::OsString;

use tracing::warn;

const ENVIRON_TARGET: &str = "skein_plugins::executor::environ";

/// Ordered sequence of `KEY=value` strings.
///
/// The orchestrator forwards the inherited environment verbatim. Executors
/// may layer format-specific variables on top with [`Environ::set_default`],
/// which never overwrites a variable the caller already provided.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environ {
    entries: Vec<String>,
}

impl Environ {
    /// Captures the current process environment.
    ///
    /// Variables whose key or value is not valid UTF-8 are skipped with a
    /// warning rather than altered.
    #[must_use]
    pub fn from_process() -> Self {
        Self::from_os_vars(env::vars_os())
    }

    pub(crate) fn from_os_vars(vars: impl IntoIterator<Item = (OsString, OsString)>) -> Self {
        vars.into_iter()
            .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
                (Ok(text_key), Ok(text_value)) => Some(format!("{text_key}={text_value}")),
                (Ok(text_key), Err(_)) => {
                    warn!(
                        target: ENVIRON_TARGET,
                        key = text_key.as_str(),
                        "skipping variable with a non-UTF-8 value"
                    );
                    None
                }
                (Err(raw_key), _) => {
                    warn!(
                        target: ENVIRON_TARGET,
                        key = %raw_key.to_string_lossy(),
                        "skipping variable with a non-UTF-8 name"
                    );
                    None
                }
            })
            .collect()
    }

    /// The raw `KEY=value` entries in order.
    #[must_use]
    pub const fn as_slice(&self) -> &[String] {
        self.entries.as_slice()
    }

    /// Number of entries.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when there are no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the value of `key`; the last occurrence wins, as it would for
    /// a spawned process.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs()
            .filter(|(candidate, _)| *candidate == key)
            .map(|(_, value)| value)
            .last()
    }

    /// Returns `true` when `key` is defined.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Appends `key=value` unless `key` is already defined.
    ///
    /// Returns `true` when the variable was added.
    pub fn set_default(&mut self, key: &str, value: &str) -> bool {
        if self.contains(key) {
            return false;
        }
        self.entries.push(format!("{key}={value}"));
        true
    }

    /// Sets `key=value`, replacing any previous definition.
    pub fn set(&mut self, key: &str, value: &str) {
        self.entries
            .retain(|entry| entry.split_once('=').is_none_or(|(candidate, _)| candidate != key));
        self.entries.push(format!("{key}={value}"));
    }

    /// Iterates over `(key, value)` pairs, skipping malformed entries.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter_map(|entry| entry.split_once('='))
            .filter(|(key, _)| !key.is_empty())
    }
}

impl<S: Into<String>> FromIterator<S> for Environ {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Drone-style setting variable: `PLUGIN_` plus the upper-cased name, with
/// spaces and dashes folded to underscores.
pub(crate) fn plugin_variable(name: &str) -> String {
    format!("PLUGIN_{}", fold(name, &[' ', '-']))
}

/// GitHub Actions input variable: `INPUT_` plus the upper-cased name, with
/// spaces folded to underscores. Dashes are kept, matching the runner.
pub(crate) fn input_variable(name: &str) -> String {
    format!("INPUT_{}", fold(name, &[' ']))
}

fn fold(name: &str, separators: &[char]) -> String {
    name.trim()
        .chars()
        .map(|ch| {
            if separators.contains(&ch) {
                '_'
            } else {
                ch.to_ascii_uppercase()
            }
        })
        .collect()
}
