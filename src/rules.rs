//! Built-in rule library.
//!
//! Every rule shares one signature: `(value, params, field_path, record)`
//! returning a pass/fail boolean. Malformed parameters (unparsable
//! intervals, bad date strings, invalid patterns) make the owning rule
//! fail; they never raise. The `array` rule is not in this table — it
//! recurses into the engine and is dispatched there.

use crate::primitives::{loose_equal, resolve_path, value_to_string};
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Signature shared by built-in and caller-registered rules.
pub type RuleFn = fn(&Value, &Value, &str, &Value) -> bool;

/// An entry in the built-in rule registry.
#[derive(Clone, Copy)]
pub struct RuleEntry {
    pub name: &'static str,
    pub check: RuleFn,
}

/// The built-in rule catalog as a compile-time constant, immutable after
/// initialization. Callers extend per session via `register_validator`.
pub static RULE_REGISTRY: &[RuleEntry] = &[
    RuleEntry { name: "required", check: rule_required },
    RuleEntry { name: "eq", check: rule_eq },
    RuleEntry { name: "eq_strict", check: rule_eq_strict },
    RuleEntry { name: "in", check: rule_in },
    RuleEntry { name: "in_strict", check: rule_in_strict },
    RuleEntry { name: "same", check: rule_same },
    RuleEntry { name: "int", check: rule_int },
    RuleEntry { name: "numeric", check: rule_numeric },
    RuleEntry { name: "email", check: rule_email },
    RuleEntry { name: "url", check: rule_url },
    RuleEntry { name: "regex", check: rule_regex },
    RuleEntry { name: "strlen", check: rule_strlen },
    RuleEntry { name: "fl_range", check: rule_fl_range },
    RuleEntry { name: "count", check: rule_count },
    RuleEntry { name: "date", check: rule_date },
    RuleEntry { name: "date_after", check: rule_date_after },
    RuleEntry { name: "date_before", check: rule_date_before },
    RuleEntry { name: "upload", check: rule_upload },
    RuleEntry { name: "imagetype", check: rule_imagetype },
];

/// Look up a built-in rule by name.
pub fn lookup_rule(name: &str) -> Option<RuleFn> {
    RULE_REGISTRY
        .iter()
        .find(|e| e.name == name)
        .map(|e| e.check)
}

// ─── Cached patterns ────────────────────────────────────────────────────────

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .unwrap()
});

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:https?|ftp)://(?:\S+(?::\S*)?@)?(?:\d{1,3}(?:\.\d{1,3}){3}|(?:[a-z0-9\x{00a1}-\x{ffff}](?:[a-z0-9\x{00a1}-\x{ffff}-]*[a-z0-9\x{00a1}-\x{ffff}])?\.)+[a-z\x{00a1}-\x{ffff}]{2,})(?::\d{2,5})?(?:/\S*)?$",
    )
    .unwrap()
});

/// Interval expression with inclusive/exclusive bound markers, e.g.
/// `[0,100)` or `]2,8]`. Both `(` and `]` open an exclusive lower bound.
static INTERVAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([(\[\]])\s*(\d*)\s*,\s*(\d*)\s*([)\]\[])$").unwrap());

static STRLEN_RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d*)\s*,\s*(\d*)$").unwrap());

// ─── Rule implementations ───────────────────────────────────────────────────

fn rule_required(value: &Value, _params: &Value, _field: &str, _record: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(m) => !m.is_empty(),
        _ => true,
    }
}

fn rule_eq(value: &Value, params: &Value, _field: &str, _record: &Value) -> bool {
    loose_equal(value, params)
}

fn rule_eq_strict(value: &Value, params: &Value, _field: &str, _record: &Value) -> bool {
    value == params
}

fn rule_in(value: &Value, params: &Value, _field: &str, _record: &Value) -> bool {
    params
        .as_array()
        .is_some_and(|haystack| haystack.iter().any(|item| loose_equal(value, item)))
}

fn rule_in_strict(value: &Value, params: &Value, _field: &str, _record: &Value) -> bool {
    params
        .as_array()
        .is_some_and(|haystack| haystack.iter().any(|item| item == value))
}

/// Compares against the value of another field; the parameter is that
/// field's dot-path.
fn rule_same(value: &Value, params: &Value, _field: &str, record: &Value) -> bool {
    params.as_str().is_some_and(|path| {
        let other = resolve_path(path, record).unwrap_or(Value::Null);
        loose_equal(value, &other)
    })
}

fn rule_int(value: &Value, _params: &Value, _field: &str, _record: &Value) -> bool {
    match value {
        Value::Number(n) => {
            n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
        }
        Value::String(s) => s.trim().parse::<i64>().is_ok(),
        _ => false,
    }
}

fn rule_numeric(value: &Value, _params: &Value, _field: &str, _record: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => {
            let trimmed = s.trim();
            !trimmed.is_empty()
                && trimmed
                    .parse::<f64>()
                    .map(|f| f.is_finite())
                    .unwrap_or(false)
        }
        _ => false,
    }
}

fn rule_email(value: &Value, _params: &Value, _field: &str, _record: &Value) -> bool {
    value.as_str().is_some_and(|s| EMAIL_RE.is_match(s))
}

fn rule_url(value: &Value, _params: &Value, _field: &str, _record: &Value) -> bool {
    value.as_str().is_some_and(|s| URL_RE.is_match(s))
}

fn rule_regex(value: &Value, params: &Value, _field: &str, _record: &Value) -> bool {
    let Some(pattern) = params.as_str() else {
        return false;
    };
    let subject = match value {
        Value::String(s) => s.clone(),
        Value::Number(_) | Value::Bool(_) => value_to_string(value),
        _ => return false,
    };
    match Regex::new(pattern) {
        Ok(re) => re.is_match(&subject),
        Err(_) => false, // invalid pattern → rule failure
    }
}

fn rule_strlen(value: &Value, params: &Value, _field: &str, _record: &Value) -> bool {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return false,
    };
    let len = text.chars().count();

    // A bare numeric parameter demands an exact length.
    if let Some(exact) = exact_length(params) {
        return len == exact;
    }

    let Some(interval) = params.as_str() else {
        return false;
    };
    let Some(caps) = STRLEN_RANGE_RE.captures(interval.trim()) else {
        return false;
    };
    let min: usize = caps[1].parse().unwrap_or(0);
    let max: usize = caps[2].parse().unwrap_or(0);
    if min > 0 && len < min {
        return false;
    }
    if max > 0 && len > max {
        return false;
    }
    true
}

fn exact_length(params: &Value) -> Option<usize> {
    match params {
        Value::Number(n) => n.as_u64().map(|n| n as usize),
        Value::String(s) => {
            let t = s.trim();
            if !t.is_empty() && t.bytes().all(|b| b.is_ascii_digit()) {
                t.parse().ok()
            } else {
                None
            }
        }
        _ => None,
    }
}

fn rule_fl_range(value: &Value, params: &Value, _field: &str, _record: &Value) -> bool {
    let num = match value {
        Value::Array(a) => a.len() as f64,
        Value::Number(n) => match n.as_f64() {
            Some(f) => f,
            None => return false,
        },
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(f) => f,
            Err(_) => return false,
        },
        _ => return false,
    };

    let Some(interval) = params.as_str() else {
        return false;
    };
    let Some(caps) = INTERVAL_RE.captures(interval.trim()) else {
        return false; // malformed interval → rule failure
    };

    let lower_inclusive = &caps[1] == "[";
    let upper_inclusive = &caps[4] == "]";

    if !caps[2].is_empty() {
        let min: f64 = caps[2].parse().unwrap_or(0.0);
        if lower_inclusive {
            if num < min {
                return false;
            }
        } else if num <= min {
            return false;
        }
    }
    if !caps[3].is_empty() {
        let max: f64 = caps[3].parse().unwrap_or(0.0);
        if upper_inclusive {
            if num > max {
                return false;
            }
        } else if num >= max {
            return false;
        }
    }
    true
}

fn rule_count(value: &Value, params: &Value, _field: &str, _record: &Value) -> bool {
    let n = match value {
        Value::Array(a) => a.len(),
        Value::Object(m) => m.len(),
        _ => return false,
    };
    params.as_u64() == Some(n as u64)
}

const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

fn parse_date(input: &str, format: &str) -> Option<NaiveDateTime> {
    // Datetime formats first; date-only formats fail there and fall back
    // to a midnight timestamp.
    if let Ok(datetime) = NaiveDateTime::parse_from_str(input, format) {
        return Some(datetime);
    }
    NaiveDate::parse_from_str(input, format)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

fn rule_date(value: &Value, params: &Value, _field: &str, _record: &Value) -> bool {
    let Some(input) = value.as_str() else {
        return false;
    };
    let format = params.as_str().unwrap_or(DEFAULT_DATE_FORMAT);
    parse_date(input, format).is_some()
}

/// Compare parameter for `date_after`/`date_before`: either a bare date
/// string (default format) or a `[compare, format]` pair.
fn date_compare_params(params: &Value) -> Option<(String, String)> {
    match params {
        Value::String(s) => Some((s.clone(), DEFAULT_DATE_FORMAT.to_string())),
        Value::Array(list) => {
            let compare = list.first()?.as_str()?.to_string();
            let format = list
                .get(1)
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_DATE_FORMAT)
                .to_string();
            Some((compare, format))
        }
        _ => None,
    }
}

fn rule_date_after(value: &Value, params: &Value, _field: &str, _record: &Value) -> bool {
    let Some(input) = value.as_str() else {
        return false;
    };
    let Some((compare, format)) = date_compare_params(params) else {
        return false;
    };
    match (parse_date(input, &format), parse_date(&compare, &format)) {
        (Some(val), Some(cmp)) => val > cmp,
        _ => false,
    }
}

fn rule_date_before(value: &Value, params: &Value, _field: &str, _record: &Value) -> bool {
    let Some(input) = value.as_str() else {
        return false;
    };
    let Some((compare, format)) = date_compare_params(params) else {
        return false;
    };
    match (parse_date(input, &format), parse_date(&compare, &format)) {
        (Some(val), Some(cmp)) => val < cmp,
        _ => false,
    }
}

/// Keys of an upload descriptor map, as assembled by the request layer.
static UPLOAD_KEYS: &[&str] = &["name", "type", "tmp_name", "error", "size"];

fn rule_upload(value: &Value, _params: &Value, _field: &str, _record: &Value) -> bool {
    let Some(map) = value.as_object() else {
        return false;
    };
    map.len() == UPLOAD_KEYS.len()
        && UPLOAD_KEYS.iter().all(|k| map.contains_key(*k))
        && map.get("error").and_then(Value::as_i64) == Some(0)
}

/// An entry in the image-type registry, mapping a short type name to the
/// MIME type reported in an upload descriptor.
struct ImageTypeEntry {
    name: &'static str,
    mime: &'static str,
}

static IMAGE_TYPE_REGISTRY: &[ImageTypeEntry] = &[
    ImageTypeEntry { name: "bmp", mime: "image/bmp" },
    ImageTypeEntry { name: "gif", mime: "image/gif" },
    ImageTypeEntry { name: "ico", mime: "image/x-icon" },
    ImageTypeEntry { name: "jpg", mime: "image/jpeg" },
    ImageTypeEntry { name: "png", mime: "image/png" },
    ImageTypeEntry { name: "psd", mime: "image/vnd.adobe.photoshop" },
];

fn lookup_image_mime(name: &str) -> Option<&'static str> {
    let lowered = name.to_ascii_lowercase();
    IMAGE_TYPE_REGISTRY
        .iter()
        .find(|e| e.name == lowered)
        .map(|e| e.mime)
}

/// Checks an upload descriptor's MIME type against a set of allowed image
/// type names (`"jpg"`, `["jpg", "png"]`, ...). Unknown names are ignored.
fn rule_imagetype(value: &Value, params: &Value, _field: &str, _record: &Value) -> bool {
    let Some(mime) = value.get("type").and_then(Value::as_str) else {
        return false;
    };
    let names: Vec<&str> = match params {
        Value::String(s) => vec![s.as_str()],
        Value::Array(list) => list.iter().filter_map(Value::as_str).collect(),
        _ => return false,
    };
    names
        .iter()
        .any(|name| lookup_image_mime(name) == Some(mime))
}
