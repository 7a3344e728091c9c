//! Helpers shared by the manifest-driven executors.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{Environ, ExecutionRequest};
use crate::error::ExecutorError;

/// Directory inside the fetched tree that receives build outputs.
const BUILD_DIR: &str = ".skein";

/// Reads and parses a YAML manifest.
pub(super) fn read_manifest<T: DeserializeOwned>(path: &Path) -> Result<T, ExecutorError> {
    let text = fs::read_to_string(path).map_err(|error| ExecutorError::Manifest {
        path: path.to_path_buf(),
        message: format!("cannot read manifest: {error}"),
    })?;
    serde_saphyr::from_str(&text).map_err(|error| ExecutorError::Manifest {
        path: path.to_path_buf(),
        message: error.to_string(),
    })
}

/// Resolves a manifest-relative path inside the source tree.
///
/// Absolute paths, parent traversal, and empty paths are rejected so a
/// manifest can never point outside the fetched tree.
pub(super) fn resolve_in_source(
    source_dir: &Path,
    manifest: &Path,
    relative: &str,
) -> Result<PathBuf, ExecutorError> {
    let invalid = |message: &str| ExecutorError::Manifest {
        path: manifest.to_path_buf(),
        message: format!("'{relative}': {message}"),
    };

    let candidate = Path::new(relative);
    if candidate.is_absolute() {
        return Err(invalid("absolute paths are not allowed"));
    }
    let components = candidate.components().collect::<Vec<_>>();
    if components
        .iter()
        .all(|component| matches!(component, Component::CurDir))
    {
        return Err(invalid("path must not be empty or only '.'"));
    }
    if components
        .iter()
        .any(|component| matches!(component, Component::ParentDir | Component::Prefix(_)))
    {
        return Err(invalid("path traversal is not allowed"));
    }
    Ok(source_dir.join(candidate))
}

/// Builds a Go package from the source tree and returns the binary path.
///
/// The build runs inside the source tree with the invocation environment so
/// module caches and proxies configured by the caller apply.
pub(super) fn build_go_binary(
    request: &mut ExecutionRequest<'_>,
    go: &str,
    package: &str,
    environ: &Environ,
) -> Result<PathBuf, ExecutorError> {
    let source_dir = request.source_dir();
    let output_dir = source_dir.join(BUILD_DIR);
    fs::create_dir_all(&output_dir).map_err(|source| ExecutorError::Io {
        program: go.to_owned(),
        source: Arc::new(source),
    })?;
    let binary = output_dir.join("plugin");

    let mut command = Command::new(go);
    command.arg("build").arg("-o").arg(&binary).arg(package);
    request.run_in(source_dir, command, environ)?;
    Ok(binary)
}

/// Renders a YAML scalar as an environment value.
///
/// Strings are used verbatim, numbers and booleans in their canonical text
/// form, and null as the empty string. Sequences and mappings have no
/// environment representation.
pub(super) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::String(text) => Some(text.clone()),
        Value::Array(_) | Value::Object(_) => None,
    }
}
