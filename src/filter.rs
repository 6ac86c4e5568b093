//! Built-in filter library.
//!
//! Filters share one signature: `(value, params, field_path, record)`
//! returning the transformed value or a [`FilterFault`]. The record passed
//! in is the *filtered* record accumulated so far, so parameters that
//! reference sibling fields see already-transformed values. A fault never
//! aborts the pipeline; the owning step is skipped.

use crate::error::FilterFault;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Signature shared by built-in and caller-registered filters.
pub type FilterFn = fn(&Value, &[Value], &str, &Value) -> Result<Value, FilterFault>;

/// Caller-registered filter implementation.
pub type CustomFilter = Box<dyn Fn(&Value, &[Value], &str, &Value) -> Result<Value, FilterFault>>;

/// An entry in the built-in filter registry.
#[derive(Clone, Copy)]
pub struct FilterEntry {
    pub name: &'static str,
    pub apply: FilterFn,
}

/// The built-in filter catalog. Open-ended: callers extend per session via
/// `register_filter`, and custom names take precedence on dispatch.
pub static FILTER_REGISTRY: &[FilterEntry] = &[
    FilterEntry { name: "trim", apply: filter_trim },
    FilterEntry { name: "lower", apply: filter_lower },
    FilterEntry { name: "upper", apply: filter_upper },
    FilterEntry { name: "ucfirst", apply: filter_ucfirst },
    FilterEntry { name: "ucwords", apply: filter_ucwords },
    FilterEntry { name: "digits", apply: filter_digits },
    FilterEntry { name: "person_name", apply: filter_person_name },
    FilterEntry { name: "replace", apply: filter_replace },
];

/// Look up a built-in filter by name.
pub fn lookup_filter(name: &str) -> Option<FilterFn> {
    FILTER_REGISTRY
        .iter()
        .find(|e| e.name == name)
        .map(|e| e.apply)
}

/// Coerce a scalar value to its string form for text filters.
fn string_input(value: &Value) -> Result<String, FilterFault> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(FilterFault::new(format!(
            "expected a scalar value, got {}",
            type_name(other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

// ─── Filter implementations ─────────────────────────────────────────────────

fn filter_trim(value: &Value, _params: &[Value], _field: &str, _record: &Value) -> Result<Value, FilterFault> {
    Ok(Value::String(string_input(value)?.trim().to_string()))
}

fn filter_lower(value: &Value, _params: &[Value], _field: &str, _record: &Value) -> Result<Value, FilterFault> {
    Ok(Value::String(string_input(value)?.to_lowercase()))
}

fn filter_upper(value: &Value, _params: &[Value], _field: &str, _record: &Value) -> Result<Value, FilterFault> {
    Ok(Value::String(string_input(value)?.to_uppercase()))
}

fn filter_ucfirst(value: &Value, _params: &[Value], _field: &str, _record: &Value) -> Result<Value, FilterFault> {
    Ok(Value::String(ucfirst(&string_input(value)?)))
}

fn filter_ucwords(value: &Value, _params: &[Value], _field: &str, _record: &Value) -> Result<Value, FilterFault> {
    Ok(Value::String(capitalize_after(
        &string_input(value)?,
        |c| c.is_whitespace(),
    )))
}

/// Strips every character that is not an ASCII digit.
fn filter_digits(value: &Value, _params: &[Value], _field: &str, _record: &Value) -> Result<Value, FilterFault> {
    let digits: String = string_input(value)?
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    Ok(Value::String(digits))
}

static WHITESPACE_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static HYPHEN_SPACING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*-\s*").unwrap());
static APOSTROPHE_SPACING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"'\s*").unwrap());

/// Tidies a person's name: trims, collapses whitespace, removes spacing
/// around hyphens and after apostrophes, and capitalizes word starts
/// (including after `-` and `'`).
fn filter_person_name(value: &Value, _params: &[Value], _field: &str, _record: &Value) -> Result<Value, FilterFault> {
    let name = string_input(value)?.trim().to_lowercase();
    let name = WHITESPACE_RUN_RE.replace_all(&name, " ");
    let name = HYPHEN_SPACING_RE.replace_all(&name, "-");
    let name = APOSTROPHE_SPACING_RE.replace_all(&name, "'");
    Ok(Value::String(capitalize_after(&name, |c| {
        c == ' ' || c == '-' || c == '\''
    })))
}

/// Regex search and replace: `params[0]` is the pattern, `params[1]` the
/// replacement, and an optional `params[2]` the subject (defaults to the
/// field's current value).
fn filter_replace(value: &Value, params: &[Value], _field: &str, _record: &Value) -> Result<Value, FilterFault> {
    let pattern = params
        .first()
        .and_then(Value::as_str)
        .ok_or_else(|| FilterFault::new("replace needs a pattern parameter"))?;
    let replacement = params
        .get(1)
        .and_then(Value::as_str)
        .ok_or_else(|| FilterFault::new("replace needs a replacement parameter"))?;
    let subject = match params.get(2) {
        Some(v) => string_input(v)?,
        None => string_input(value)?,
    };
    let re = Regex::new(pattern)
        .map_err(|e| FilterFault::new(format!("invalid replace pattern: {}", e)))?;
    Ok(Value::String(re.replace_all(&subject, replacement).into_owned()))
}

// ─── Text helpers ───────────────────────────────────────────────────────────

fn ucfirst(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Uppercase the first letter of the string and every letter following a
/// boundary character.
fn capitalize_after(input: &str, is_boundary: impl Fn(char) -> bool) -> String {
    let mut result = String::with_capacity(input.len());
    let mut at_boundary = true;
    for c in input.chars() {
        if at_boundary {
            result.extend(c.to_uppercase());
        } else {
            result.push(c);
        }
        at_boundary = is_boundary(c);
    }
    result
}
