//! Shared primitives: dot-path addressing over nested records, masked
//! field-reference resolution, and the value comparison/stringification
//! helpers used by both the validation engine and the filter pipeline.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

/// Matches a masked field reference, e.g. `~{drinks.softdrink}~`.
static MASK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"~\{(.+?)\}~").unwrap());

/// Upper bound on re-scan passes while substituting masked references.
/// A referenced value may itself contain masks; the bound keeps resolution
/// terminating on self-referential records.
const MAX_RESOLVE_PASSES: usize = 64;

// ─── Path addressing ────────────────────────────────────────────────────────

/// Resolves a dot-path against a value tree.
///
/// Each segment descends one level: a mapping segment is a key lookup, a
/// numeric segment indexes a sequence when the current node is a sequence.
/// Returns `None` when any segment fails to resolve; out-of-range indices
/// and type mismatches degrade to `None` rather than erroring. An empty
/// path returns the root value.
pub fn resolve_path(path: &str, value: &Value) -> Option<Value> {
    if path.is_empty() {
        return Some(value.clone());
    }

    let mut current = value;
    for segment in path.split('.') {
        current = match current {
            Value::Object(obj) => obj.get(segment)?,
            Value::Array(arr) => {
                let idx: usize = segment.parse().ok()?;
                arr.get(idx)?
            }
            _ => return None,
        };
    }
    Some(current.clone())
}

/// Writes `new_value` at a dot-path, creating intermediate mappings for
/// absent segments. Numeric segments assign in-range sequence positions and
/// append at an index equal to the length; any other segment shape replaces
/// the current node with a mapping. An empty path replaces the root.
pub fn set_path(target: &mut Value, path: &str, new_value: Value) {
    if path.is_empty() {
        *target = new_value;
        return;
    }
    match path.split_once('.') {
        None => set_segment(target, path, new_value),
        Some((head, rest)) => set_path(descend_or_create(target, head), rest, new_value),
    }
}

/// An addressable sequence position: an in-range index assigns, an index
/// equal to the length appends. Anything else means mapping semantics.
fn sequence_index(target: &Value, segment: &str) -> Option<usize> {
    let arr = target.as_array()?;
    let idx: usize = segment.parse().ok()?;
    (idx <= arr.len()).then_some(idx)
}

fn set_segment(target: &mut Value, segment: &str, new_value: Value) {
    match sequence_index(target, segment) {
        Some(idx) => {
            let arr = target.as_array_mut().unwrap();
            if idx < arr.len() {
                arr[idx] = new_value;
            } else {
                arr.push(new_value);
            }
        }
        None => {
            if !target.is_object() {
                *target = Value::Object(Map::new());
            }
            target
                .as_object_mut()
                .unwrap()
                .insert(segment.to_string(), new_value);
        }
    }
}

fn descend_or_create<'a>(target: &'a mut Value, segment: &str) -> &'a mut Value {
    match sequence_index(target, segment) {
        Some(idx) => {
            let arr = target.as_array_mut().unwrap();
            if idx == arr.len() {
                arr.push(Value::Object(Map::new()));
            }
            &mut arr[idx]
        }
        None => {
            if !target.is_object() {
                *target = Value::Object(Map::new());
            }
            target
                .as_object_mut()
                .unwrap()
                .entry(segment.to_string())
                .or_insert(Value::Null)
        }
    }
}

/// Removes the entry addressed by a dot-path if present. Missing paths and
/// type mismatches are silently ignored.
pub fn unset_path(target: &mut Value, path: &str) {
    let Some((parent_path, leaf)) = split_leaf(path) else {
        return;
    };

    let parent = if parent_path.is_empty() {
        Some(target)
    } else {
        resolve_path_mut(parent_path, target)
    };

    match parent {
        Some(Value::Object(obj)) => {
            obj.shift_remove(leaf);
        }
        Some(Value::Array(arr)) => {
            if let Ok(idx) = leaf.parse::<usize>()
                && idx < arr.len()
            {
                arr.remove(idx);
            }
        }
        _ => {}
    }
}

fn split_leaf(path: &str) -> Option<(&str, &str)> {
    if path.is_empty() {
        return None;
    }
    match path.rfind('.') {
        Some(pos) => Some((&path[..pos], &path[pos + 1..])),
        None => Some(("", path)),
    }
}

fn resolve_path_mut<'a>(path: &str, value: &'a mut Value) -> Option<&'a mut Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = match current {
            Value::Object(obj) => obj.get_mut(segment)?,
            Value::Array(arr) => {
                let idx: usize = segment.parse().ok()?;
                arr.get_mut(idx)?
            }
            _ => return None,
        };
    }
    Some(current)
}

// ─── Masked reference resolution ────────────────────────────────────────────

/// Builds the masked form of a field reference: `name` → `~{name}~`.
pub fn mask_reference(path: &str) -> String {
    format!("~{{{}}}~", path)
}

/// Resolves masked field references inside a parameter value against a
/// source record, recursing through nested mappings and sequences.
///
/// A string that consists of nothing but one mask is replaced by the exact
/// value at the referenced path, preserving its type (missing paths become
/// null). A mask embedded in a longer string is replaced by the referenced
/// value's string form and scanning repeats until no masks remain, so a
/// single string may splice several references. Non-string scalars pass
/// through unchanged.
pub fn resolve_references(param: &Value, source: &Value) -> Value {
    match param {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), resolve_references(v, source)))
                .collect(),
        ),
        Value::Array(arr) => Value::Array(arr.iter().map(|v| resolve_references(v, source)).collect()),
        Value::String(s) => resolve_string_references(s, source),
        _ => param.clone(),
    }
}

fn resolve_string_references(input: &str, source: &Value) -> Value {
    let mut current = input.to_string();
    for _ in 0..MAX_RESOLVE_PASSES {
        let Some(caps) = MASK_RE.captures(&current) else {
            return Value::String(current);
        };
        let whole = caps.get(0).unwrap();
        let referenced = resolve_path(&caps[1], source).unwrap_or(Value::Null);

        if whole.start() == 0 && whole.end() == current.len() {
            match referenced {
                // A referenced string may itself contain masks; re-scan it.
                Value::String(s) => current = s,
                other => return other,
            }
        } else {
            let range = whole.range();
            let replacement = splice_string(&referenced);
            current.replace_range(range, &replacement);
        }
    }
    Value::String(current)
}

/// String form used when splicing a referenced value into a longer string.
/// Missing references splice as the empty string.
fn splice_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        other => value_to_string(other),
    }
}

// ─── Value helpers ──────────────────────────────────────────────────────────

/// Serialize a value to text for message composition and scalar coercion.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        // Objects and arrays serialize to compact JSON
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// Loose equality: integer 42 equals float 42.0, numeric strings compare
/// equal to numbers, containers compare element-wise with the same rules.
pub fn loose_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(fx), Some(fy)) => fx == fy,
            _ => x == y,
        },
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            match (n.as_f64(), s.trim().parse::<f64>()) {
                (Some(fx), Ok(fy)) => fx == fy,
                _ => false,
            }
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(x, y)| loose_equal(x, y))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).is_some_and(|yv| loose_equal(v, yv)))
        }
        _ => false,
    }
}
