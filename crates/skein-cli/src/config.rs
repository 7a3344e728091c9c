//! Configuration loading helpers for the `skein` CLI.
//!
//! Arguments listed in [`CONFIG_CLI_FLAGS`](crate::CONFIG_CLI_FLAGS) are routed
//! to `ortho_config`; everything else names the plugin and is parsed by
//! [`Cli`](crate::cli::Cli). Unlike a subcommand CLI there is no command
//! boundary, so configuration flags may appear anywhere.

use std::ffi::{OsStr, OsString};

use ortho_config::OrthoConfig;
use skein_config::Config;

use crate::AppError;

pub(crate) trait ConfigLoader {
    /// Loads configuration from the configuration arguments.
    fn load(&self, args: &[OsString]) -> Result<Config, AppError>;
}

pub(crate) struct OrthoConfigLoader;

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError> {
        Config::load_from_iter(args.iter().cloned()).map_err(AppError::LoadConfiguration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagAction {
    Include { needs_value: bool },
    Skip,
}

fn process_config_flag(argument: &OsStr) -> FlagAction {
    let text = argument.to_string_lossy();
    if !text.starts_with("--") {
        return FlagAction::Skip;
    }
    let (flag, has_inline_value) = text
        .split_once('=')
        .map_or((text.as_ref(), false), |(flag, _)| (flag, true));
    if crate::CONFIG_CLI_FLAGS.contains(&flag) {
        FlagAction::Include {
            needs_value: !has_inline_value,
        }
    } else {
        FlagAction::Skip
    }
}

/// Arguments partitioned between the configuration loader and the flag
/// parser. Both lists start with the program name.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ConfigArgumentSplit {
    pub(crate) config_arguments: Vec<OsString>,
    pub(crate) plugin_arguments: Vec<OsString>,
}

pub(crate) fn split_config_arguments(args: &[OsString]) -> ConfigArgumentSplit {
    let mut tokens = args.iter();
    let Some(program) = tokens.next() else {
        return ConfigArgumentSplit::default();
    };
    let mut split = ConfigArgumentSplit {
        config_arguments: vec![program.clone()],
        plugin_arguments: vec![program.clone()],
    };

    while let Some(argument) = tokens.next() {
        match process_config_flag(argument) {
            FlagAction::Include { needs_value } => {
                split.config_arguments.push(argument.clone());
                if needs_value {
                    split.config_arguments.extend(tokens.next().cloned());
                }
            }
            FlagAction::Skip => split.plugin_arguments.push(argument.clone()),
        }
    }
    split
}
