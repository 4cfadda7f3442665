//! CLI argument definitions for the `mantle` binary.

use clap::{Parser, ValueEnum};

/// Component graph assembled around the demonstration greeter.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum Scenario {
    /// An auditing interceptor only.
    Intercepted,
    /// A decorator that delegates back to the proxy only.
    Decorated,
    /// Both the interceptor and the decorator.
    #[default]
    Stacked,
    /// Neither; every call falls through to the original method.
    Plain,
}

impl Scenario {
    /// Stable name used in reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Intercepted => "intercepted",
            Self::Decorated => "decorated",
            Self::Stacked => "stacked",
            Self::Plain => "plain",
        }
    }

    pub(crate) const fn intercepts(self) -> bool {
        matches!(self, Self::Intercepted | Self::Stacked)
    }

    pub(crate) const fn decorates(self) -> bool {
        matches!(self, Self::Decorated | Self::Stacked)
    }
}

/// Command-line interface for the Mantle dispatch demonstration.
#[derive(Parser, Debug)]
#[command(name = "mantle", version, about)]
pub(crate) struct Cli {
    /// Which component graph to assemble.
    #[arg(value_enum, default_value_t = Scenario::Stacked)]
    pub(crate) scenario: Scenario,
    /// Name passed to the greeter.
    #[arg(long, default_value = "world")]
    pub(crate) name: String,
}
