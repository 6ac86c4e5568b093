//! Declaration normalization: the mixed shorthand shapes accepted for rule
//! and filter declarations expand into one canonical, insertion-ordered
//! form before evaluation. Declaration order is observable (quick-stop and
//! `required` gating depend on it), so every expansion preserves it.

use crate::primitives::value_to_string;
use serde_json::{Map, Value};

/// Normalize a rule declaration into an ordered rule-name → params mapping.
///
/// Accepted shapes:
/// - a bare name: `"required"` → `{"required": null}`
/// - a sequence mixing bare names and name→params mappings:
///   `["required", {"strlen": "3,8"}]`
/// - an already-canonical mapping (kept as-is, order preserved)
///
/// Bare entries normalize to `null` params. Anything else normalizes to an
/// empty declaration. Normalization is idempotent.
pub fn normalize_rule_decl(decl: &Value) -> Map<String, Value> {
    let mut normalized = Map::new();
    match decl {
        Value::String(name) => {
            normalized.insert(name.clone(), Value::Null);
        }
        Value::Array(entries) => {
            for entry in entries {
                match entry {
                    Value::Object(map) => {
                        for (name, params) in map {
                            normalized.insert(name.clone(), params.clone());
                        }
                    }
                    Value::Null => {}
                    scalar => {
                        normalized.insert(value_to_string(scalar), Value::Null);
                    }
                }
            }
        }
        Value::Object(map) => {
            for (name, params) in map {
                normalized.insert(name.clone(), params.clone());
            }
        }
        _ => {}
    }
    normalized
}

/// One registered filter application: a callable name plus its parameter
/// list, bound to the field whose value it rewrites.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterStep {
    pub field: String,
    pub callable: String,
    pub params: Vec<Value>,
}

/// Flatten one field's filter declaration into ordered steps.
///
/// The declaration takes the same shapes as a rule declaration; each
/// entry's params normalize to a list: `null` → no params, a scalar → a
/// one-element list, a sequence → the list itself, a mapping → a single
/// mapping argument.
pub fn normalize_filter_decl(field: &str, decl: &Value) -> Vec<FilterStep> {
    normalize_rule_decl(decl)
        .into_iter()
        .map(|(callable, params)| FilterStep {
            field: field.to_string(),
            callable,
            params: normalize_filter_params(params),
        })
        .collect()
}

fn normalize_filter_params(params: Value) -> Vec<Value> {
    match params {
        Value::Null => Vec::new(),
        Value::Array(list) => list,
        other => vec![other],
    }
}
