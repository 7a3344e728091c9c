//! Precedence tests for the layered `skein` configuration.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use once_cell::sync::Lazy;
use ortho_config::OrthoConfig;
use tempfile::TempDir;

use skein_config::{Config, LogFormat};

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

struct EnvOverride {
    key: &'static str,
    previous: Option<OsString>,
    guard: Option<MutexGuard<'static, ()>>,
}

impl EnvOverride {
    fn set_var(key: &'static str, value: &OsStr) -> Self {
        let guard = ENV_MUTEX.lock().expect("env mutex poisoned");
        let previous = std::env::var_os(key);
        // Environment mutation is `unsafe` on the 2024 edition; the override
        // is undone in `Drop` while the mutex is still held.
        unsafe { std::env::set_var(key, value) };
        Self {
            key,
            previous,
            guard: Some(guard),
        }
    }
}

impl Drop for EnvOverride {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(value) => unsafe { std::env::set_var(self.key, value) },
            None => unsafe { std::env::remove_var(self.key) },
        }
        drop(self.guard.take());
    }
}

fn write_config(dir: &Path, body: &str) -> OsString {
    let path = dir.join("skein.toml");
    fs::write(&path, body).expect("write configuration file");
    path.into_os_string()
}

fn args(extra: &[OsString]) -> Vec<OsString> {
    let mut args = vec![OsString::from("skein")];
    args.extend(extra.iter().cloned());
    args
}

#[test]
fn file_values_are_loaded() {
    let _lock = ENV_MUTEX.lock().expect("env mutex poisoned");
    let temp_dir = TempDir::new().expect("create temp dir");
    let path = write_config(
        temp_dir.path(),
        "log_format = \"json\"\nfetch_timeout_secs = 15\ngit_binary = \"/usr/local/bin/git\"\n",
    );

    let config = Config::load_from_iter(args(&[OsString::from("--config-path"), path]))
        .expect("configuration loads");

    assert_eq!(config.log_format(), LogFormat::Json);
    assert_eq!(config.fetch_timeout_secs, Some(15));
    assert_eq!(config.git_binary(), "/usr/local/bin/git");
}

#[test]
fn environment_overrides_file() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let path = write_config(temp_dir.path(), "log_filter = \"warn\"\n");
    let _env = EnvOverride::set_var("SKEIN_LOG_FILTER", OsStr::new("debug"));

    let config = Config::load_from_iter(args(&[OsString::from("--config-path"), path]))
        .expect("configuration loads");

    assert_eq!(config.log_filter(), "debug");
}

#[test]
fn cli_flags_override_environment() {
    let _env = EnvOverride::set_var("SKEIN_LOG_FILTER", OsStr::new("debug"));

    let config = Config::load_from_iter(args(&[
        OsString::from("--log-filter"),
        OsString::from("trace"),
    ]))
    .expect("configuration loads");

    assert_eq!(config.log_filter(), "trace");
}
