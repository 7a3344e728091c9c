//! Executor for Harness plugins described by `plugin.yml`.

use std::process::Command;

use serde::Deserialize;
use tracing::debug;

use super::manifest::{build_go_binary, read_manifest, resolve_in_source};
use super::{ExecutionRequest, ExecutionResult, FormatExecutor, Toolchain};
use crate::detect::HARNESS_MANIFEST;
use crate::error::ExecutorError;

const HARNESS_TARGET: &str = "skein_plugins::executor::harness";

#[derive(Debug, Default, Deserialize)]
struct HarnessManifest {
    #[serde(default)]
    run: RunSection,
}

#[derive(Debug, Default, Deserialize)]
struct RunSection {
    binary: Option<BinaryEntry>,
    go: Option<GoEntry>,
    bash: Option<BashEntry>,
}

#[derive(Debug, Deserialize)]
struct BinaryEntry {
    path: String,
}

#[derive(Debug, Deserialize)]
struct GoEntry {
    module: String,
}

#[derive(Debug, Deserialize)]
struct BashEntry {
    script: String,
}

/// Runs a Harness plugin.
///
/// The first runnable entry of `run` wins: a prebuilt `binary.path`, then a
/// `go.module` built on the spot, then a `bash.script`.
#[derive(Debug, Clone, Default)]
pub struct HarnessExecutor {
    toolchain: Toolchain,
}

impl HarnessExecutor {
    /// Creates an executor using `toolchain` for builds and scripts.
    #[must_use]
    pub const fn new(toolchain: Toolchain) -> Self {
        Self { toolchain }
    }
}

impl FormatExecutor for HarnessExecutor {
    fn execute(
        &self,
        mut request: ExecutionRequest<'_>,
    ) -> Result<ExecutionResult, ExecutorError> {
        let source_dir = request.source_dir();
        let manifest_path = source_dir.join(HARNESS_MANIFEST);
        let manifest: HarnessManifest = read_manifest(&manifest_path)?;
        let environ = request.environment();
        let run = manifest.run;

        if let Some(binary) = run.binary {
            let path = resolve_in_source(source_dir, &manifest_path, &binary.path)?;
            debug!(target: HARNESS_TARGET, path = %path.display(), "running prebuilt binary");
            return request.run(Command::new(path), environ);
        }

        if let Some(go) = run.go {
            debug!(target: HARNESS_TARGET, module = %go.module, "building go plugin");
            let binary = build_go_binary(&mut request, self.toolchain.go(), &go.module, environ)?;
            return request.run(Command::new(binary), environ);
        }

        if let Some(bash) = run.bash {
            let script = resolve_in_source(source_dir, &manifest_path, &bash.script)?;
            debug!(target: HARNESS_TARGET, script = %script.display(), "running bash plugin");
            let mut command = Command::new(self.toolchain.bash());
            command.arg(script);
            return request.run(command, environ);
        }

        Err(ExecutorError::Manifest {
            path: manifest_path,
            message: String::from("no runnable entry under 'run'"),
        })
    }
}
