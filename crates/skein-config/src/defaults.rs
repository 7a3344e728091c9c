//! Default values applied when configuration layers leave a field unset.

use crate::logging::LogFormat;

/// Default log filter expression used by the binary.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default upper bound on source retrieval.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 600;

/// Default `git` executable, resolved through `PATH`.
pub const DEFAULT_GIT_BINARY: &str = "git";

/// Default `bash` executable, resolved through `PATH`.
pub const DEFAULT_BASH_BINARY: &str = "bash";

/// Default `go` executable, resolved through `PATH`.
pub const DEFAULT_GO_BINARY: &str = "go";

/// Default `node` executable, resolved through `PATH`.
pub const DEFAULT_NODE_BINARY: &str = "node";

/// Default POSIX `sh` executable, resolved through `PATH`.
pub const DEFAULT_SH_BINARY: &str = "sh";

/// Default log filter expression used by the binary.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Default logging format for the binary.
#[must_use]
pub fn default_log_format() -> LogFormat {
    LogFormat::default()
}
