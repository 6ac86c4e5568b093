//! The validation engine.
//!
//! A [`Validator`] is one session: one record, one rule-set, one outcome.
//! Evaluation is lazy — `is_valid`, `validate` and `errors` trigger a full
//! run on first access and reuse the cached result until a new record is
//! assigned with [`Validator::set_data`]. Every declared field is evaluated
//! exactly once per run; the pending work list is drained as fields
//! complete.
//!
//! One inherited behavior is worth calling out: the `required` gate is
//! consulted per rule, in declaration order. While a field's value is empty
//! (`""` or `[]`) and `required` has not yet been reached, rules are
//! skipped — so a rule declared *before* `required` is skipped on empty
//! input while `required` itself and everything after it still run.
//! Surprising, but observable, and kept for compatibility.

use crate::error::ConfigError;
use crate::normalize::normalize_rule_decl;
use crate::primitives::{mask_reference, resolve_path, resolve_references, value_to_string};
use crate::rules::lookup_rule;
use serde_json::{Map, Value};
use std::collections::{HashMap, VecDeque};

/// Caller-registered rule implementation.
pub type CustomRule = Box<dyn Fn(&Value, &Value, &str, &Value) -> bool>;

/// Default message templates per built-in rule, installed at construction.
/// `%s` receives the stringified rule parameters; `~{INPUT}~` the field's
/// current value. Callers override per rule name or per
/// `"<field>.<rule>"` key.
static DEFAULT_MESSAGES: &[(&str, &str)] = &[
    ("array", "One or more entries are invalid."),
    ("count", "Exactly %s entries are required."),
    ("date", "'~{INPUT}~' is not a valid date."),
    ("date_after", "The date must be after %s."),
    ("date_before", "The date must be before %s."),
    ("email", "'~{INPUT}~' is not a valid email address."),
    ("eq", "This value must equal %s."),
    ("eq_strict", "This value must exactly equal %s."),
    ("fl_range", "The value must lie within %s."),
    ("imagetype", "The file must be an image of type %s."),
    ("in", "This value must be one of %s."),
    ("in_strict", "This value must be exactly one of %s."),
    ("int", "'~{INPUT}~' is not a whole number."),
    ("numeric", "'~{INPUT}~' is not a number."),
    ("regex", "This value has an invalid format."),
    ("required", "This field is required."),
    ("same", "This value must match the value of %s."),
    ("strlen", "The length must lie within %s."),
    ("upload", "The file upload failed."),
    ("url", "'~{INPUT}~' is not a valid URL."),
];

/// Declarative rule validator for one nested record.
pub struct Validator {
    data: Value,
    rules: Map<String, Value>,
    messages: HashMap<String, String>,
    custom: HashMap<String, CustomRule>,
    quick: bool,
    validated: bool,
    outcomes: HashMap<String, bool>,
    errors: HashMap<String, Vec<String>>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    pub fn new() -> Self {
        Validator {
            data: Value::Null,
            rules: Map::new(),
            messages: DEFAULT_MESSAGES
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            custom: HashMap::new(),
            quick: false,
            validated: false,
            outcomes: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    /// Toggle quick mode: the first failing rule for a field aborts further
    /// rule evaluation for that field (and element iteration inside the
    /// `array` rule).
    pub fn set_quick(&mut self, quick: bool) {
        self.quick = quick;
    }

    /// Register the rule declaration for a field path. The declaration is
    /// normalized immediately; a later registration for the same field path
    /// replaces the earlier one — each field owns exactly one rule list.
    pub fn add_rules(&mut self, field: &str, decl: &Value) {
        self.rules
            .insert(field.to_string(), Value::Object(normalize_rule_decl(decl)));
    }

    /// Bulk form of [`Validator::add_rules`] over a field → declaration
    /// mapping. Non-mapping input is ignored.
    pub fn add_rule_set(&mut self, decls: &Value) {
        if let Some(map) = decls.as_object() {
            for (field, decl) in map {
                self.add_rules(field, decl);
            }
        }
    }

    /// Register a message template, keyed by rule name or by
    /// `"<field>.<rule>"` for a field-specific override (which wins on
    /// lookup).
    pub fn add_error_message(&mut self, key: &str, template: &str) {
        self.messages.insert(key.to_string(), template.to_string());
    }

    pub fn add_error_messages<I>(&mut self, messages: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.messages.extend(messages);
    }

    /// Register a custom rule. Built-in names take precedence on dispatch.
    pub fn register_validator<F>(&mut self, name: &str, check: F)
    where
        F: Fn(&Value, &Value, &str, &Value) -> bool + 'static,
    {
        self.custom.insert(name.to_string(), Box::new(check));
    }

    /// Assign the record to validate, invalidating any cached outcome.
    pub fn set_data(&mut self, data: Value) {
        self.data = data;
        self.validated = false;
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    /// True iff no field produced an error. Triggers evaluation on first
    /// access.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a declared rule name has no
    /// implementation.
    pub fn is_valid(&mut self) -> Result<bool, ConfigError> {
        self.ensure_validated()?;
        Ok(self.errors.is_empty())
    }

    /// The pass/fail outcome per declared field.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a declared rule name has no
    /// implementation.
    pub fn validate(&mut self) -> Result<HashMap<String, bool>, ConfigError> {
        self.ensure_validated()?;
        Ok(self.outcomes.clone())
    }

    /// Composed error messages per field, in rule evaluation order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a declared rule name has no
    /// implementation.
    pub fn errors(&mut self) -> Result<&HashMap<String, Vec<String>>, ConfigError> {
        self.ensure_validated()?;
        Ok(&self.errors)
    }

    fn ensure_validated(&mut self) -> Result<(), ConfigError> {
        if self.validated {
            return Ok(());
        }
        self.run_validation()
    }

    fn run_validation(&mut self) -> Result<(), ConfigError> {
        self.errors.clear();
        self.outcomes.clear();

        // Drain a pending work list so each field is evaluated exactly once
        // per session, even while the `array` rule re-enters field
        // validation for elements.
        let mut pending: VecDeque<(String, Map<String, Value>)> = self
            .rules
            .iter()
            .map(|(field, decl)| {
                (
                    field.clone(),
                    decl.as_object().cloned().unwrap_or_default(),
                )
            })
            .collect();

        let mut ctx = EvalCtx {
            data: &self.data,
            quick: self.quick,
            custom: &self.custom,
            messages: &self.messages,
            errors: &mut self.errors,
        };

        while let Some((field, decl)) = pending.pop_front() {
            let value = resolve_path(&field, ctx.data).unwrap_or(Value::Null);
            let valid = validate_field(&mut ctx, &field, &value, &decl)?;
            self.outcomes.insert(field, valid);
        }

        self.validated = true;
        Ok(())
    }
}

/// Borrowed evaluation state for one run. Splitting the session's fields
/// lets the `array` rule recurse into field validation while error
/// insertion keeps a mutable handle on the error map.
struct EvalCtx<'a> {
    data: &'a Value,
    quick: bool,
    custom: &'a HashMap<String, CustomRule>,
    messages: &'a HashMap<String, String>,
    errors: &'a mut HashMap<String, Vec<String>>,
}

/// Empty inputs gate non-required rules: the empty string and the empty
/// sequence. An absent field resolves to null, which is not gated — rules
/// on a missing field still run.
fn is_empty_input(value: &Value) -> bool {
    match value {
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        _ => false,
    }
}

fn is_scalar(value: &Value) -> bool {
    matches!(
        value,
        Value::String(_) | Value::Number(_) | Value::Bool(_)
    )
}

/// Pull the reserved `invalidates` entry out of a declaration. It is a
/// directive, never an evaluable rule. Defaults to the field itself.
fn extract_invalidated_fields(decl: &mut Map<String, Value>, field: &str) -> Vec<String> {
    let mut targets = Vec::new();
    if let Some(spec) = decl.shift_remove("invalidates") {
        match spec {
            Value::String(target) => targets.push(target),
            Value::Array(list) => {
                targets.extend(
                    list.into_iter()
                        .filter_map(|v| v.as_str().map(str::to_string)),
                );
            }
            _ => {}
        }
    }
    if targets.is_empty() {
        targets.push(field.to_string());
    }
    targets
}

fn validate_field(
    ctx: &mut EvalCtx<'_>,
    field: &str,
    value: &Value,
    decl: &Map<String, Value>,
) -> Result<bool, ConfigError> {
    let mut decl = decl.clone();
    let targets = extract_invalidated_fields(&mut decl, field);

    let mut required_seen = false;
    let mut field_valid = true;

    for (name, params) in &decl {
        if name.as_str() == "required" {
            required_seen = true;
        }

        // Skip while the field is empty and not (yet) required.
        if !required_seen && is_empty_input(value) {
            continue;
        }

        let negated = name.contains('!');
        let base_name = if negated {
            name.replace('!', "")
        } else {
            name.clone()
        };

        let params = resolve_references(params, ctx.data);

        let mut passed = execute_rule(ctx, &base_name, value, &params, field)?;

        // The displayed name keeps the negation marker for message lookup.
        let display_name = if negated {
            passed = !passed;
            format!("!{}", base_name)
        } else {
            base_name
        };

        if !passed {
            field_valid = false;
            for target in &targets {
                insert_error_message(ctx, target, value, &display_name, &params);
            }
            if ctx.quick {
                break;
            }
        }
    }

    Ok(field_valid)
}

fn execute_rule(
    ctx: &mut EvalCtx<'_>,
    name: &str,
    value: &Value,
    params: &Value,
    field: &str,
) -> Result<bool, ConfigError> {
    // `array` recurses into field validation and is dispatched here rather
    // than through the registry table.
    if name == "array" {
        return rule_array(ctx, value, params, field);
    }
    if let Some(check) = lookup_rule(name) {
        return Ok(check(value, params, field, ctx.data));
    }
    if let Some(custom) = ctx.custom.get(name) {
        return Ok(custom(value, params, field, ctx.data));
    }
    Err(ConfigError {
        rule: name.to_string(),
        field: field.to_string(),
    })
}

/// Applies the rest of the declaration to every element of a sequence
/// value. Fails immediately on non-null, non-sequence values; a null value
/// passes vacuously. Quick mode short-circuits across elements.
fn rule_array(
    ctx: &mut EvalCtx<'_>,
    value: &Value,
    params: &Value,
    field: &str,
) -> Result<bool, ConfigError> {
    if !value.is_null() && !value.is_array() {
        return Ok(false);
    }

    let element_decl = normalize_rule_decl(params);
    let mut all_valid = true;
    if let Some(items) = value.as_array() {
        for item in items {
            if !validate_field(ctx, field, item, &element_decl)? {
                all_valid = false;
                if ctx.quick {
                    break;
                }
            }
        }
    }
    Ok(all_valid)
}

/// Compose and record one error message.
///
/// Template lookup: `"<field>.<rule>"` override, then the bare rule name,
/// then the literal lookup key itself. Scalar inputs substitute the
/// `~{INPUT}~` placeholder, masked references resolve against the full
/// record, and a single `%s` receives the stringified rule parameters.
fn insert_error_message(
    ctx: &mut EvalCtx<'_>,
    field: &str,
    input: &Value,
    rule_name: &str,
    params: &Value,
) {
    let specific_key = format!("{}.{}", field, rule_name);
    let mut message = ctx
        .messages
        .get(&specific_key)
        .or_else(|| ctx.messages.get(rule_name))
        .cloned()
        .unwrap_or(specific_key);

    if is_scalar(input) {
        let input_mask = mask_reference("INPUT");
        if message.contains(&input_mask) {
            message = message.replace(&input_mask, &value_to_string(input));
        }
    }

    message = match resolve_references(&Value::String(message), ctx.data) {
        Value::String(s) => s,
        other => value_to_string(&other),
    };

    if message.contains("%s") {
        message = message.replacen("%s", &stringify_params(params), 1);
    }

    ctx.errors
        .entry(field.to_string())
        .or_default()
        .push(message);
}

fn stringify_params(params: &Value) -> String {
    match params {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(_) | Value::Number(_) => value_to_string(params),
        // Nested structures serialize to compact JSON
        _ => serde_json::to_string(params).unwrap_or_default(),
    }
}
