//! Shared configuration for the Mantle dispatch runtime.
//!
//! Configuration is layered by [`ortho_config`]: built-in defaults, then an
//! optional configuration file, then `MANTLE_*` environment variables, then
//! command-line flags. The resulting [`Config`] carries the telemetry settings
//! consumed by the `mantle` binary and the [`AccessPolicy`] the dispatch
//! engine applies whenever it invokes a method handle.

mod access;
mod defaults;
mod logging;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use self::access::{AccessPolicy, AccessPolicyParseError};
pub use self::defaults::{
    DEFAULT_LOG_FILTER, default_log_filter, default_log_filter_string, default_log_format,
    default_method_access,
};
pub use self::logging::{LogFormat, LogFormatParseError};

/// Command-line flags consumed by the configuration loader.
///
/// Binaries use this list to separate configuration flags from their own
/// positional arguments before handing the former to [`Config::load_from_iter`].
pub const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--log-filter",
    "--log-format",
    "--method-access",
];

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "MANTLE")]
pub struct Config {
    /// Tracing filter expression applied to the global subscriber.
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format for structured logs.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Accessibility policy used when invoking method handles.
    #[ortho_config(default = default_method_access())]
    pub method_access: AccessPolicy,
}

impl Config {
    /// Returns the configured log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Returns the configured log format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Returns the accessibility policy for method invocation.
    #[must_use]
    pub const fn method_access(&self) -> AccessPolicy {
        self.method_access
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            method_access: default_method_access(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_documented_defaults() {
        let config = Config::default();
        assert_eq!(config.log_filter(), DEFAULT_LOG_FILTER);
        assert_eq!(config.log_format(), LogFormat::Json);
        assert_eq!(config.method_access(), AccessPolicy::Permissive);
    }

    #[test]
    fn config_flags_cover_every_field() {
        for flag in ["--log-filter", "--log-format", "--method-access"] {
            assert!(CONFIG_CLI_FLAGS.contains(&flag), "missing flag {flag}");
        }
    }
}
