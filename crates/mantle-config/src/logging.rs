//! Output formats for the `mantle` binary's dispatch and routing events.
//!
//! The format is chosen through the `log_format` setting (for example
//! `MANTLE_LOG_FORMAT=compact`) and only affects how events are rendered on
//! standard error. Filtering is handled separately by `log_filter`.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How routing and lifecycle events are rendered.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One flattened JSON object per event, with span fields such as the
    /// dispatcher identity inlined.
    #[default]
    Json,
    /// Single-line text for reading a scenario run in a terminal.
    Compact,
}

impl LogFormat {
    /// Whether events should carry ANSI colour codes when written to a
    /// stream that is (or is not) a terminal.
    ///
    /// JSON output never carries escape codes so that it stays parseable.
    #[must_use]
    pub const fn uses_ansi(self, terminal: bool) -> bool {
        match self {
            Self::Json => false,
            Self::Compact => terminal,
        }
    }
}

/// Errors encountered while parsing a [`LogFormat`] from text.
pub type LogFormatParseError = strum::ParseError;

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("json", LogFormat::Json)]
    #[case("JSON", LogFormat::Json)]
    #[case("Compact", LogFormat::Compact)]
    fn parses_case_insensitively(#[case] text: &str, #[case] expected: LogFormat) {
        let parsed = LogFormat::from_str(text).expect("format should parse");
        assert_eq!(parsed, expected);
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(LogFormat::from_str("pretty").is_err());
    }

    #[rstest]
    #[case(LogFormat::Json, true, false)]
    #[case(LogFormat::Json, false, false)]
    #[case(LogFormat::Compact, true, true)]
    #[case(LogFormat::Compact, false, false)]
    fn colour_only_for_compact_output_on_terminals(
        #[case] format: LogFormat,
        #[case] terminal: bool,
        #[case] expected: bool,
    ) {
        assert_eq!(format.uses_ansi(terminal), expected);
    }
}
