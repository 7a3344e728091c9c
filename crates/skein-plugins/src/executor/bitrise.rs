//! Executor for Bitrise steps described by `step.yml`.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::environ::plugin_variable;
use super::manifest::{build_go_binary, read_manifest, resolve_in_source, scalar_text};
use super::{Environ, ExecutionRequest, ExecutionResult, FormatExecutor, Toolchain};
use crate::detect::BITRISE_MANIFEST;
use crate::error::ExecutorError;

const BITRISE_TARGET: &str = "skein_plugins::executor::bitrise";

/// Entry script used when the manifest names no bash toolkit entry.
const DEFAULT_ENTRY_FILE: &str = "step.sh";

/// Key holding input metadata rather than an input default.
const INPUT_OPTIONS_KEY: &str = "opts";

#[derive(Debug, Default, Deserialize)]
struct StepManifest {
    #[serde(default)]
    toolkit: Toolkit,
    #[serde(default)]
    inputs: Vec<BTreeMap<String, Value>>,
}

#[derive(Debug, Default, Deserialize)]
struct Toolkit {
    go: Option<GoToolkit>,
    bash: Option<BashToolkit>,
}

#[derive(Debug, Deserialize)]
struct GoToolkit {
    package_name: String,
}

#[derive(Debug, Deserialize)]
struct BashToolkit {
    entry_file: Option<String>,
}

/// Runs a Bitrise step.
///
/// Every declared input is exported under its own key. A variable the caller
/// already defines wins; otherwise the Drone-style `PLUGIN_<KEY>` setting is
/// used, then the declared default.
#[derive(Debug, Clone, Default)]
pub struct BitriseExecutor {
    toolchain: Toolchain,
}

impl BitriseExecutor {
    /// Creates an executor using `toolchain` for builds and scripts.
    #[must_use]
    pub const fn new(toolchain: Toolchain) -> Self {
        Self { toolchain }
    }
}

impl FormatExecutor for BitriseExecutor {
    fn execute(
        &self,
        mut request: ExecutionRequest<'_>,
    ) -> Result<ExecutionResult, ExecutorError> {
        let source_dir = request.source_dir();
        let manifest_path = source_dir.join(BITRISE_MANIFEST);
        let manifest: StepManifest = read_manifest(&manifest_path)?;
        let environ = step_environment(request.environment(), &manifest.inputs, &manifest_path)?;

        if let Some(go) = manifest.toolkit.go {
            debug!(
                target: BITRISE_TARGET,
                package = %go.package_name,
                "building go step"
            );
            let binary =
                build_go_binary(&mut request, self.toolchain.go(), &go.package_name, &environ)?;
            return request.run(Command::new(binary), &environ);
        }

        let entry_file = manifest
            .toolkit
            .bash
            .and_then(|bash| bash.entry_file)
            .unwrap_or_else(|| String::from(DEFAULT_ENTRY_FILE));
        let script = resolve_in_source(source_dir, &manifest_path, &entry_file)?;
        debug!(
            target: BITRISE_TARGET,
            script = %script.display(),
            "running bash step"
        );
        let mut command = Command::new(self.toolchain.bash());
        command.arg(script);
        request.run(command, &environ)
    }
}

/// Layers step inputs over the inherited environment.
fn step_environment(
    inherited: &Environ,
    inputs: &[BTreeMap<String, Value>],
    manifest_path: &Path,
) -> Result<Environ, ExecutorError> {
    let mut environ = inherited.clone();
    let declared = inputs
        .iter()
        .flat_map(|input| input.iter())
        .filter(|(key, _)| key.as_str() != INPUT_OPTIONS_KEY);

    for (key, default) in declared {
        if environ.contains(key) {
            continue;
        }
        let value = inherited
            .get(&plugin_variable(key))
            .map(str::to_owned)
            .or_else(|| scalar_text(default))
            .ok_or_else(|| ExecutorError::Manifest {
                path: manifest_path.to_path_buf(),
                message: format!("input '{key}' has a non-scalar default"),
            })?;
        environ.set_default(key, &value);
    }
    Ok(environ)
}
