//! Configuration loading helpers for the `mantle` binary.
//!
//! Configuration flags must precede the scenario argument. The split below
//! hands every leading flag listed in [`CONFIG_CLI_FLAGS`] (and its value) to
//! `ortho-config`, leaving the rest for the binary's own parser.

use std::ffi::{OsStr, OsString};

use mantle_config::{CONFIG_CLI_FLAGS, Config};
use ortho_config::OrthoConfig;

use crate::errors::AppError;

pub(crate) trait ConfigLoader {
    /// Loads configuration from the filtered configuration arguments.
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
    Stop,
}

fn classify(argument: &OsStr) -> FlagAction {
    let text = argument.to_string_lossy();
    if !text.starts_with("--") {
        return FlagAction::Stop;
    }
    let (flag, inline_value) = match text.split_once('=') {
        Some((flag, _)) => (flag, true),
        None => (&*text, false),
    };
    if CONFIG_CLI_FLAGS.contains(&flag) {
        FlagAction::Include {
            needs_value: !inline_value,
        }
    } else {
        FlagAction::Stop
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ConfigArgumentSplit {
    pub(crate) config_arguments: Vec<OsString>,
    pub(crate) cli_arguments: Vec<OsString>,
}

pub(crate) fn split_config_arguments(args: &[OsString]) -> ConfigArgumentSplit {
    let Some((program, rest)) = args.split_first() else {
        return ConfigArgumentSplit::default();
    };

    let mut config_arguments = vec![program.clone()];
    let mut remaining = rest.iter();
    let mut cli_arguments = vec![program.clone()];

    while let Some(argument) = remaining.next() {
        match classify(argument) {
            FlagAction::Include { needs_value } => {
                config_arguments.push(argument.clone());
                if needs_value {
                    config_arguments.extend(remaining.next().cloned());
                }
            }
            FlagAction::Stop => {
                cli_arguments.push(argument.clone());
                cli_arguments.extend(remaining.by_ref().cloned());
                break;
            }
        }
    }

    ConfigArgumentSplit {
        config_arguments,
        cli_arguments,
    }
}
