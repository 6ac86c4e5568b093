use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic severity level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}

/// A structured diagnostic message produced while filtering or loading a
/// schema. The library never logs; non-fatal observations are returned as
/// diagnostics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub message: String,
}

/// Error kind for schema parse failures.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorKind {
    Syntax,
    TypeMismatch,
    UnknownKey,
}

/// Produced by `parse` when a schema document cannot be loaded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let (Some(line), Some(col)) = (self.line, self.column) {
            write!(f, "{}:{}: {}", line, col, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for ParseError {}

/// Produced during evaluation when a declared rule name has no built-in or
/// registered implementation. This is the only error that escapes the
/// validator's public surface; rule failures are reported through the
/// outcome and error maps instead.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigError {
    /// The unresolvable rule name (negation marker stripped).
    pub rule: String,
    /// The field path whose declaration referenced the rule.
    pub field: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rule '{}' declared for field '{}' does not exist",
            self.rule, self.field
        )
    }
}

impl std::error::Error for ConfigError {}

/// Reported by a filter implementation when it cannot transform a value.
/// Faults never abort the pipeline; the owning step is skipped and the
/// fault is surfaced as a [`Diagnostic`] warning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterFault {
    pub message: String,
}

impl FilterFault {
    pub fn new(message: impl Into<String>) -> Self {
        FilterFault {
            message: message.into(),
        }
    }
}

impl fmt::Display for FilterFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for FilterFault {}

/// Combined error type for the `load` entry point.
#[derive(Clone, Debug)]
pub enum FormError {
    Parse(ParseError),
    Config(ConfigError),
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormError::Parse(e) => write!(f, "Parse error: {}", e),
            FormError::Config(e) => write!(f, "Configuration error: {}", e),
        }
    }
}

impl std::error::Error for FormError {}

impl From<ParseError> for FormError {
    fn from(e: ParseError) -> Self {
        FormError::Parse(e)
    }
}

impl From<ConfigError> for FormError {
    fn from(e: ConfigError) -> Self {
        FormError::Config(e)
    }
}
