//! Log output formats understood by the CLI telemetry layer.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Supported logging output formats.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Structured JSON suitable for ingestion by logging stacks.
    Json,
    /// Human-readable single line output, interleaved with plugin output in
    /// the CI log.
    #[default]
    Compact,
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
    #[case("COMPACT", LogFormat::Compact)]
    fn parses_case_insensitively(#[case] input: &str, #[case] expected: LogFormat) {
        assert_eq!(LogFormat::from_str(input).expect("format parses"), expected);
    }

    #[test]
    fn rejects_unknown_formats() {
        assert!(LogFormat::from_str("pretty").is_err());
    }
}
