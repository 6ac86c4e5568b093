//! Schema loading: a YAML document bundling one session's configuration —
//! rules, filters, messages, quick flag, defaults and whitelist.
//!
//! Parsing performs YAML deserialization and shape checks only; rule names
//! are not resolved here (an unknown rule surfaces as a `ConfigError` at
//! evaluation time).

use crate::error::{ParseError, ParseErrorKind};
use crate::form::Form;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A parsed schema document. All sections are optional.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Schema {
    /// Field path → rule declaration.
    #[serde(default)]
    pub rules: Option<Map<String, Value>>,
    /// Field path → filter declaration.
    #[serde(default)]
    pub filters: Option<Map<String, Value>>,
    /// Message templates by rule name or `"<field>.<rule>"` key.
    #[serde(default)]
    pub messages: Option<HashMap<String, String>>,
    #[serde(default)]
    pub quick: Option<bool>,
    /// Default values merged beneath submitted data.
    #[serde(default)]
    pub defaults: Option<Value>,
    /// Whitelisted top-level field names.
    #[serde(default)]
    pub whitelist: Option<Vec<String>>,
}

impl Schema {
    /// Build a ready [`Form`] session from this schema.
    pub fn into_form(self) -> Form {
        let mut form = Form::new();
        if let Some(whitelist) = self.whitelist {
            form.add_whitelisted_fields(whitelist);
        }
        if let Some(defaults) = self.defaults {
            form.add_default_values(&defaults);
        }
        if let Some(filters) = self.filters {
            form.add_filters(&Value::Object(filters));
        }
        if let Some(rules) = self.rules {
            form.add_rule_set(&Value::Object(rules));
        }
        if let Some(messages) = self.messages {
            form.add_error_messages(messages);
        }
        if let Some(quick) = self.quick {
            form.set_quick(quick);
        }
        form
    }
}

/// Parse a YAML string into a [`Schema`].
///
/// # Errors
///
/// Returns [`ParseError`] on empty input, YAML syntax errors, a
/// non-mapping root, unknown top-level keys, or mistyped sections.
pub fn parse(input: &str) -> Result<Schema, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError {
            kind: ParseErrorKind::Syntax,
            message: "empty input".to_string(),
            path: None,
            line: None,
            column: None,
        });
    }

    // Deserialize via serde_json::Value as intermediate so mapping order
    // inside rule declarations survives.
    let value: Value = serde_saphyr::from_str(input).map_err(|e| {
        let msg = e.to_string();
        ParseError {
            kind: classify_saphyr_error(&msg),
            message: msg,
            path: None,
            line: None,
            column: None,
        }
    })?;

    let Some(root) = value.as_object() else {
        return Err(ParseError {
            kind: ParseErrorKind::TypeMismatch,
            message: "schema root must be a YAML mapping".to_string(),
            path: None,
            line: None,
            column: None,
        });
    };

    // Only the documented sections are allowed at the top level.
    for key in root.keys() {
        match key.as_str() {
            "rules" | "filters" | "messages" | "quick" | "defaults" | "whitelist" => {}
            other => {
                return Err(ParseError {
                    kind: ParseErrorKind::UnknownKey,
                    message: format!("unknown top-level field: {}", other),
                    path: Some(other.to_string()),
                    line: None,
                    column: None,
                });
            }
        }
    }

    let schema: Schema = serde_json::from_value(value).map_err(|e| {
        let msg = e.to_string();
        ParseError {
            kind: classify_json_error(&msg),
            message: msg,
            path: None,
            line: None,
            column: None,
        }
    })?;

    Ok(schema)
}

fn classify_saphyr_error(msg: &str) -> ParseErrorKind {
    let lower = msg.to_lowercase();
    if lower.contains("type") || lower.contains("invalid") || lower.contains("expected") {
        ParseErrorKind::TypeMismatch
    } else {
        ParseErrorKind::Syntax
    }
}

fn classify_json_error(msg: &str) -> ParseErrorKind {
    let lower = msg.to_lowercase();
    if lower.contains("unknown field") {
        ParseErrorKind::UnknownKey
    } else if lower.contains("missing field") || lower.contains("invalid type") {
        ParseErrorKind::TypeMismatch
    } else {
        ParseErrorKind::Syntax
    }
}
