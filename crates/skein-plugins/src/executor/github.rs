//! Executor for GitHub Actions described by `action.yml` or `action.yaml`.
//!
//! JavaScript actions run their `pre`, `main`, and `post` scripts with
//! `node`. Composite actions run each `run:` step through its shell, with
//! `${{ inputs.<name> }}` expressions substituted. Docker actions and
//! composite steps that `uses:` another action are not supported.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::environ::{input_variable, plugin_variable};
use super::manifest::{read_manifest, resolve_in_source, scalar_text};
use super::{Environ, ExecutionRequest, ExecutionResult, FormatExecutor, Toolchain};
use crate::detect::action_manifest;
use crate::error::ExecutorError;

const GITHUB_TARGET: &str = "skein_plugins::executor::github";

/// Shell used by composite steps that name none.
const DEFAULT_SHELL: &str = "bash";

#[derive(Debug, Deserialize)]
struct ActionManifest {
    #[serde(default)]
    inputs: BTreeMap<String, ActionInput>,
    runs: Runs,
}

#[derive(Debug, Default, Deserialize)]
struct ActionInput {
    #[serde(default)]
    default: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct Runs {
    using: String,
    main: Option<String>,
    pre: Option<String>,
    post: Option<String>,
    #[serde(default)]
    steps: Vec<CompositeStep>,
}

#[derive(Debug, Deserialize)]
struct CompositeStep {
    name: Option<String>,
    run: Option<String>,
    shell: Option<String>,
    uses: Option<String>,
}

/// Runs a GitHub Action.
#[derive(Debug, Clone, Default)]
pub struct GithubActionExecutor {
    toolchain: Toolchain,
}

impl GithubActionExecutor {
    /// Creates an executor using `toolchain` for `node` and shells.
    #[must_use]
    pub const fn new(toolchain: Toolchain) -> Self {
        Self { toolchain }
    }

    fn run_node(
        &self,
        request: &mut ExecutionRequest<'_>,
        manifest_path: &Path,
        runs: &Runs,
        environ: &Environ,
    ) -> Result<ExecutionResult, ExecutorError> {
        let Some(main) = runs.main.as_deref() else {
            return Err(ExecutorError::Manifest {
                path: manifest_path.to_path_buf(),
                message: format!("'{}' action has no 'runs.main'", runs.using),
            });
        };
        let source_dir = request.source_dir();
        let script = |relative: &str| resolve_in_source(source_dir, manifest_path, relative);
        let main_script = script(main)?;
        let pre_script = runs.pre.as_deref().map(script).transpose()?;
        let post_script = runs.post.as_deref().map(script).transpose()?;

        if let Some(path) = pre_script {
            request.run(self.node_command(&path), environ)?;
        }
        let outcome = request.run(self.node_command(&main_script), environ);
        if let Some(path) = post_script {
            let cleanup = request.run(self.node_command(&path), environ);
            if let Err(error) = cleanup {
                if outcome.is_err() {
                    warn!(target: GITHUB_TARGET, %error, "post script failed after main failure");
                } else {
                    return Err(error);
                }
            }
        }
        outcome
    }

    fn node_command(&self, script: &Path) -> Command {
        let mut command = Command::new(self.toolchain.node());
        command.arg(script);
        command
    }

    fn run_composite(
        &self,
        request: &mut ExecutionRequest<'_>,
        steps: &[CompositeStep],
        inputs: &BTreeMap<String, String>,
        environ: &Environ,
    ) -> Result<ExecutionResult, ExecutorError> {
        if let Some(uses) = steps.iter().find_map(|step| step.uses.as_deref()) {
            return Err(ExecutorError::UnsupportedRuntime {
                runtime: format!("composite step uses '{uses}'"),
            });
        }

        let mut last = ExecutionResult::new(Some(0));
        for (index, step) in steps.iter().enumerate() {
            let Some(template) = step.run.as_deref() else {
                continue;
            };
            let shell = step.shell.as_deref().unwrap_or(DEFAULT_SHELL);
            let script = substitute_inputs(template, inputs);
            debug!(
                target: GITHUB_TARGET,
                step = index,
                name = step.name.as_deref().unwrap_or_default(),
                shell,
                "running composite step"
            );
            last = request.run(self.shell_command(shell, &script)?, environ)?;
        }
        Ok(last)
    }

    fn shell_command(&self, shell: &str, script: &str) -> Result<Command, ExecutorError> {
        let mut command = match shell {
            "bash" => {
                let mut bash = Command::new(self.toolchain.bash());
                bash.args(["--noprofile", "--norc", "-eo", "pipefail"]);
                bash
            }
            "sh" => {
                let mut sh = Command::new(self.toolchain.sh());
                sh.arg("-e");
                sh
            }
            other => {
                return Err(ExecutorError::UnsupportedRuntime {
                    runtime: format!("shell '{other}'"),
                });
            }
        };
        command.arg("-c").arg(script);
        Ok(command)
    }
}

impl FormatExecutor for GithubActionExecutor {
    fn execute(
        &self,
        mut request: ExecutionRequest<'_>,
    ) -> Result<ExecutionResult, ExecutorError> {
        let source_dir = request.source_dir();
        let Some(manifest_path) = action_manifest(source_dir) else {
            return Err(ExecutorError::Manifest {
                path: source_dir.join("action.yml"),
                message: String::from("manifest not found"),
            });
        };
        let manifest: ActionManifest = read_manifest(&manifest_path)?;
        let inputs = input_values(request.environment(), &manifest.inputs, &manifest_path)?;
        let environ = action_environment(request.environment(), &inputs);
        let using = manifest.runs.using.as_str();

        debug!(target: GITHUB_TARGET, using, "running action");
        if using.starts_with("node") {
            self.run_node(&mut request, &manifest_path, &manifest.runs, &environ)
        } else if using == "composite" {
            self.run_composite(&mut request, &manifest.runs.steps, &inputs, &environ)
        } else {
            Err(ExecutorError::UnsupportedRuntime {
                runtime: using.to_owned(),
            })
        }
    }
}

/// Resolves every declared input to its value: the `PLUGIN_<NAME>` setting
/// when present, otherwise the declared default.
fn input_values(
    inherited: &Environ,
    declared: &BTreeMap<String, ActionInput>,
    manifest_path: &Path,
) -> Result<BTreeMap<String, String>, ExecutorError> {
    let mut values = BTreeMap::new();
    for (name, input) in declared {
        let value = inherited
            .get(&plugin_variable(name))
            .map(str::to_owned)
            .or_else(|| input.default.as_ref().map_or_else(|| Some(String::new()), scalar_text))
            .ok_or_else(|| ExecutorError::Manifest {
                path: manifest_path.to_path_buf(),
                message: format!("input '{name}' has a non-scalar default"),
            })?;
        values.insert(name.clone(), value);
    }
    Ok(values)
}

/// Exports inputs as `INPUT_<NAME>` without overwriting caller variables.
fn action_environment(inherited: &Environ, inputs: &BTreeMap<String, String>) -> Environ {
    let mut environ = inherited.clone();
    for (name, value) in inputs {
        environ.set_default(&input_variable(name), value);
    }
    environ
}

/// Replaces `${{ inputs.<name> }}` expressions with input values.
///
/// Unknown inputs expand to the empty string. Other expressions are left
/// untouched.
fn substitute_inputs(script: &str, inputs: &BTreeMap<String, String>) -> String {
    let mut rendered = String::with_capacity(script.len());
    let mut rest = script;
    while let Some((before, opened)) = rest.split_once("${{") {
        let Some((expression, after)) = opened.split_once("}}") else {
            break;
        };
        let replacement = expression.trim().strip_prefix("inputs.").map_or_else(
            || Cow::Owned(["${{", expression, "}}"].concat()),
            |name| Cow::Borrowed(inputs.get(name.trim()).map_or("", String::as_str)),
        );
        rendered.push_str(before);
        rendered.push_str(&replacement);
        rest = after;
    }
    rendered.push_str(rest);
    rendered
}
