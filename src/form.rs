//! The `Form` session facade.
//!
//! A [`Form`] owns one record's journey: raw data in (whitelisted, with
//! default values merged beneath it), the filter pipeline over it, and the
//! validation engine bound to the filtered product. How the raw record is
//! obtained — request payload, decoded body, test fixture — is the
//! caller's concern; the form only ever sees an in-memory value.

use crate::error::{ConfigError, Diagnostic, DiagnosticSeverity};
use crate::filter::{CustomFilter, lookup_filter};
use crate::normalize::{FilterStep, normalize_filter_decl};
use crate::primitives::{resolve_path, resolve_references, set_path};
use crate::validate::Validator;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// One form session: record preparation, filter pipeline, validation.
pub struct Form {
    validator: Validator,
    raw: Value,
    filtered: Value,
    defaults: Value,
    whitelist: Vec<String>,
    filters: Vec<FilterStep>,
    custom_filters: HashMap<String, CustomFilter>,
    warnings: Vec<Diagnostic>,
    data_bound: bool,
}

impl Default for Form {
    fn default() -> Self {
        Self::new()
    }
}

impl Form {
    pub fn new() -> Self {
        Form {
            validator: Validator::new(),
            raw: Value::Object(Map::new()),
            filtered: Value::Object(Map::new()),
            defaults: Value::Object(Map::new()),
            whitelist: Vec::new(),
            filters: Vec::new(),
            custom_filters: HashMap::new(),
            warnings: Vec::new(),
            data_bound: false,
        }
    }

    // ─── Record preparation ─────────────────────────────────────────────

    /// Accumulate default values. Defaults appear beneath submitted data:
    /// mapping entries merge recursively, sequences append missing
    /// elements, and submitted scalars always win.
    pub fn add_default_values(&mut self, defaults: &Value) {
        self.defaults = merge_beneath(&self.defaults, defaults);
    }

    /// Accumulate whitelisted top-level field names. While the whitelist is
    /// empty no restriction applies; once any entry exists, only listed
    /// fields survive [`Form::set_raw_data`].
    pub fn add_whitelisted_fields<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for field in fields {
            let field = field.into();
            if !self.whitelist.contains(&field) {
                self.whitelist.push(field);
            }
        }
    }

    /// Assign the raw record for this session. Applies the whitelist, lays
    /// defaults beneath the submitted data, and resets the filtered record
    /// and any cached validation outcome.
    pub fn set_raw_data(&mut self, record: Value) {
        let restricted = self.apply_whitelist(record);
        self.raw = merge_beneath(&self.defaults, &restricted);
        self.filtered = self.raw.clone();
        self.warnings.clear();
        self.data_bound = false;
    }

    fn apply_whitelist(&self, record: Value) -> Value {
        if self.whitelist.is_empty() {
            return record;
        }
        match record {
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .filter(|(key, _)| self.whitelist.contains(key))
                    .collect(),
            ),
            other => other,
        }
    }

    pub fn raw_data(&self) -> &Value {
        &self.raw
    }

    /// The filtered record — the session's canonical output. Before
    /// [`Form::apply_filters`] runs this is the prepared raw record.
    pub fn filtered_data(&self) -> &Value {
        &self.filtered
    }

    /// Resolve a dot-path against the filtered record.
    pub fn get(&self, path: &str) -> Option<Value> {
        resolve_path(path, &self.filtered)
    }

    // ─── Filter pipeline ────────────────────────────────────────────────

    /// Register field filters. The declaration maps field paths to filter
    /// declarations (a callable name, a list of names and name→params
    /// mappings, or a mapping); steps run in registration order.
    pub fn add_filters(&mut self, decls: &Value) {
        if let Some(map) = decls.as_object() {
            for (field, decl) in map {
                self.filters.extend(normalize_filter_decl(field, decl));
            }
        }
    }

    /// Register a custom filter. Custom names take precedence over the
    /// built-in catalog on dispatch.
    pub fn register_filter<F>(&mut self, name: &str, apply: F)
    where
        F: Fn(&Value, &[Value], &str, &Value) -> Result<Value, crate::error::FilterFault> + 'static,
    {
        self.custom_filters.insert(name.to_string(), Box::new(apply));
    }

    /// Execute every registered filter step in order against the
    /// accumulating filtered record and return the result. Steps are
    /// consumed: the transformation is single-pass and a second call
    /// without new registrations returns the record unchanged.
    ///
    /// A step whose callable cannot be resolved, or whose invocation
    /// reports a fault, is skipped with a [`Diagnostic`] warning; the
    /// pipeline never aborts.
    pub fn apply_filters(&mut self) -> &Value {
        let steps: Vec<FilterStep> = self.filters.drain(..).collect();
        for step in steps {
            self.apply_filter_step(&step);
        }
        self.data_bound = false;
        &self.filtered
    }

    fn apply_filter_step(&mut self, step: &FilterStep) {
        // Masked references resolve against the filtered record as
        // transformed so far, not the raw input.
        let params: Vec<Value> = step
            .params
            .iter()
            .map(|p| resolve_references(p, &self.filtered))
            .collect();

        // A leading '@' marks a custom filter reference; bare names try
        // custom filters first anyway.
        let name = step.callable.strip_prefix('@').unwrap_or(&step.callable);

        let value = resolve_path(&step.field, &self.filtered).unwrap_or(Value::Null);

        let result = if let Some(custom) = self.custom_filters.get(name) {
            custom(&value, &params, &step.field, &self.filtered)
        } else if let Some(builtin) = lookup_filter(name) {
            builtin(&value, &params, &step.field, &self.filtered)
        } else {
            self.warnings.push(Diagnostic {
                severity: DiagnosticSeverity::Warning,
                code: "F-001".to_string(),
                path: Some(step.field.clone()),
                message: format!("unresolvable filter callable: '{}'", step.callable),
            });
            return;
        };

        match result {
            Ok(transformed) => set_path(&mut self.filtered, &step.field, transformed),
            Err(fault) => {
                self.warnings.push(Diagnostic {
                    severity: DiagnosticSeverity::Warning,
                    code: "F-002".to_string(),
                    path: Some(step.field.clone()),
                    message: format!("filter '{}' skipped: {}", step.callable, fault),
                });
            }
        }
    }

    /// Non-fatal warnings collected while filtering.
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    // ─── Validation ─────────────────────────────────────────────────────

    /// See [`Validator::add_rules`].
    pub fn add_rules(&mut self, field: &str, decl: &Value) {
        self.validator.add_rules(field, decl);
    }

    /// See [`Validator::add_rule_set`].
    pub fn add_rule_set(&mut self, decls: &Value) {
        self.validator.add_rule_set(decls);
    }

    /// See [`Validator::add_error_message`].
    pub fn add_error_message(&mut self, key: &str, template: &str) {
        self.validator.add_error_message(key, template);
    }

    pub fn add_error_messages<I>(&mut self, messages: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.validator.add_error_messages(messages);
    }

    /// See [`Validator::set_quick`].
    pub fn set_quick(&mut self, quick: bool) {
        self.validator.set_quick(quick);
    }

    /// See [`Validator::register_validator`].
    pub fn register_validator<F>(&mut self, name: &str, check: F)
    where
        F: Fn(&Value, &Value, &str, &Value) -> bool + 'static,
    {
        self.validator.register_validator(name, check);
    }

    /// Validate the filtered record.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a declared rule name has no
    /// implementation.
    pub fn is_valid(&mut self) -> Result<bool, ConfigError> {
        self.bind_data();
        self.validator.is_valid()
    }

    /// Per-field outcomes against the filtered record.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a declared rule name has no
    /// implementation.
    pub fn validate(&mut self) -> Result<HashMap<String, bool>, ConfigError> {
        self.bind_data();
        self.validator.validate()
    }

    /// Error messages against the filtered record.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a declared rule name has no
    /// implementation.
    pub fn errors(&mut self) -> Result<&HashMap<String, Vec<String>>, ConfigError> {
        self.bind_data();
        self.validator.errors()
    }

    /// Bind the current filtered record to the validator once per change;
    /// rebinding invalidates the validator's cached outcome.
    fn bind_data(&mut self) {
        if !self.data_bound {
            self.validator.set_data(self.filtered.clone());
            self.data_bound = true;
        }
    }
}

/// Lay `base` (defaults) beneath `overlay` (submitted data): mapping
/// entries recurse, sequences append elements missing from the base,
/// anything else is taken from the overlay.
fn merge_beneath(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(b), Value::Object(o)) => {
            let mut merged = b.clone();
            for (key, value) in o {
                let entry = match merged.get(key) {
                    Some(existing) => merge_beneath(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), entry);
            }
            Value::Object(merged)
        }
        (Value::Array(b), Value::Array(o)) => {
            let mut merged = b.clone();
            for value in o {
                if !merged.contains(value) {
                    merged.push(value.clone());
                }
            }
            Value::Array(merged)
        }
        _ => overlay.clone(),
    }
}
