//! Shared configuration for the `skein` plugin orchestrator.
//!
//! Configuration is layered by `ortho_config`: built-in defaults, an optional
//! TOML file (`--config-path` or `SKEIN_CONFIG_PATH`), `SKEIN_*` environment
//! variables, and finally command-line flags. Every field is optional in the
//! merged representation; accessors apply the defaults from [`defaults`] so
//! callers never need to reason about absent values.

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

mod defaults;
mod logging;

pub use defaults::{
    DEFAULT_BASH_BINARY, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_GIT_BINARY, DEFAULT_GO_BINARY,
    DEFAULT_LOG_FILTER, DEFAULT_NODE_BINARY, DEFAULT_SH_BINARY, default_log_filter,
    default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Runtime configuration for a single `skein` invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "SKEIN")]
pub struct Config {
    /// Tracing filter expression, for example `info` or `skein_plugins=debug`.
    #[serde(default)]
    pub log_filter: Option<String>,
    /// Log output format.
    #[serde(default)]
    pub log_format: Option<LogFormat>,
    /// YAML file describing plugin aliases.
    #[serde(default)]
    pub alias_file: Option<Utf8PathBuf>,
    /// Parent directory for ephemeral plugin workspaces.
    #[serde(default)]
    pub workspace_root: Option<Utf8PathBuf>,
    /// Upper bound for source retrieval in seconds; `0` disables the limit.
    #[serde(default)]
    pub fetch_timeout_secs: Option<u64>,
    /// Path or name of the `git` executable.
    #[serde(default)]
    pub git_binary: Option<String>,
    /// Path or name of the `bash` executable.
    #[serde(default)]
    pub bash_binary: Option<String>,
    /// Path or name of the `go` executable.
    #[serde(default)]
    pub go_binary: Option<String>,
    /// Path or name of the `node` executable.
    #[serde(default)]
    pub node_binary: Option<String>,
    /// Path or name of the POSIX `sh` executable.
    #[serde(default)]
    pub sh_binary: Option<String>,
}

impl Config {
    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format.unwrap_or_else(default_log_format)
    }

    /// Alias table location, when one is configured.
    #[must_use]
    pub fn alias_file(&self) -> Option<&Utf8Path> {
        self.alias_file.as_deref()
    }

    /// Parent directory for workspaces; `None` selects the system temp dir.
    #[must_use]
    pub fn workspace_root(&self) -> Option<&Utf8Path> {
        self.workspace_root.as_deref()
    }

    /// Fetch deadline, or `None` when fetches may run indefinitely.
    #[must_use]
    pub fn fetch_timeout(&self) -> Option<Duration> {
        match self.fetch_timeout_secs.unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// The `git` executable.
    #[must_use]
    pub fn git_binary(&self) -> &str {
        self.git_binary.as_deref().unwrap_or(DEFAULT_GIT_BINARY)
    }

    /// The `bash` executable.
    #[must_use]
    pub fn bash_binary(&self) -> &str {
        self.bash_binary.as_deref().unwrap_or(DEFAULT_BASH_BINARY)
    }

    /// The `go` executable.
    #[must_use]
    pub fn go_binary(&self) -> &str {
        self.go_binary.as_deref().unwrap_or(DEFAULT_GO_BINARY)
    }

    /// The `node` executable.
    #[must_use]
    pub fn node_binary(&self) -> &str {
        self.node_binary.as_deref().unwrap_or(DEFAULT_NODE_BINARY)
    }

    /// The `sh` executable.
    #[must_use]
    pub fn sh_binary(&self) -> &str {
        self.sh_binary.as_deref().unwrap_or(DEFAULT_SH_BINARY)
    }
}
