use formval::Form;
use formval::error::DiagnosticSeverity;
use serde_json::{Value, json};
use std::cell::Cell;
use std::rc::Rc;

/// Helper: a form with filters registered and raw data assigned.
fn form_with(filters: Value, data: Value) -> Form {
    let mut form = Form::new();
    form.add_filters(&filters);
    form.set_raw_data(data);
    form
}

// ─── Declaration shapes ─────────────────────────────────────────────────────

#[test]
fn bare_name_declaration() {
    let mut form = form_with(json!({"name": "trim"}), json!({"name": "  x  "}));
    form.apply_filters();
    assert_eq!(form.get("name"), Some(json!("x")));
}

#[test]
fn list_declaration_runs_in_order() {
    let mut form = form_with(
        json!({"name": ["trim", "upper"]}),
        json!({"name": "  abc  "}),
    );
    form.apply_filters();
    assert_eq!(form.get("name"), Some(json!("ABC")));
}

#[test]
fn parameterized_declaration() {
    let mut form = form_with(
        json!({"bio": {"replace": [r"\s+", " "]}}),
        json!({"bio": "too   many    spaces"}),
    );
    form.apply_filters();
    assert_eq!(form.get("bio"), Some(json!("too many spaces")));
}

#[test]
fn nested_field_paths_are_filtered_in_place() {
    let mut form = form_with(
        json!({"person.name": "trim"}),
        json!({"person": {"name": " ada ", "role": "engineer"}}),
    );
    form.apply_filters();
    assert_eq!(
        form.filtered_data(),
        &json!({"person": {"name": "ada", "role": "engineer"}})
    );
}

// ─── Reference resolution against the accumulating record ───────────────────

#[test]
fn params_resolve_against_already_filtered_values() {
    // "a" is trimmed first; the replacement for "b" references the
    // transformed value, not the raw one.
    let mut form = form_with(
        json!({
            "a": "trim",
            "b": {"replace": ["^placeholder$", "~{a}~"]},
        }),
        json!({"a": "  x  ", "b": "placeholder"}),
    );
    form.apply_filters();
    assert_eq!(form.get("b"), Some(json!("x")));
}

// ─── Custom filters ─────────────────────────────────────────────────────────

#[test]
fn custom_filter_with_marker_and_bare_name() {
    let mut form = Form::new();
    form.register_filter("shout", |value, _, _, _| {
        Ok(json!(format!("{}!", value.as_str().unwrap_or_default())))
    });
    form.add_filters(&json!({"a": "@shout", "b": "shout"}));
    form.set_raw_data(json!({"a": "hi", "b": "ho"}));
    form.apply_filters();
    assert_eq!(form.get("a"), Some(json!("hi!")));
    assert_eq!(form.get("b"), Some(json!("ho!")));
}

#[test]
fn custom_filter_wins_over_builtin_name() {
    let mut form = Form::new();
    form.register_filter("trim", |_, _, _, _| Ok(json!("custom")));
    form.add_filters(&json!({"a": "trim"}));
    form.set_raw_data(json!({"a": "  x  "}));
    form.apply_filters();
    assert_eq!(form.get("a"), Some(json!("custom")));
}

// ─── Skip semantics ─────────────────────────────────────────────────────────

#[test]
fn unknown_filter_is_skipped_with_warning() {
    let mut form = form_with(
        json!({"a": ["no_such_filter", "trim"]}),
        json!({"a": "  x  "}),
    );
    form.apply_filters();

    // The value is untouched by the unknown step, later steps still ran.
    assert_eq!(form.get("a"), Some(json!("x")));
    assert_eq!(form.warnings().len(), 1);
    assert_eq!(form.warnings()[0].code, "F-001");
    assert_eq!(form.warnings()[0].severity, DiagnosticSeverity::Warning);
}

#[test]
fn faulting_filter_leaves_value_unmodified() {
    // trim faults on a sequence value; the field keeps its value.
    let mut form = form_with(json!({"tags": "trim"}), json!({"tags": ["a", "b"]}));
    form.apply_filters();

    assert_eq!(form.get("tags"), Some(json!(["a", "b"])));
    assert_eq!(form.warnings().len(), 1);
    assert_eq!(form.warnings()[0].code, "F-002");
}

#[test]
fn filters_are_consumed_on_application() {
    let calls = Rc::new(Cell::new(0));
    let seen = calls.clone();

    let mut form = Form::new();
    form.register_filter("counting", move |value, _, _, _| {
        seen.set(seen.get() + 1);
        Ok(value.clone())
    });
    form.add_filters(&json!({"a": "counting"}));
    form.set_raw_data(json!({"a": "x"}));

    form.apply_filters();
    form.apply_filters();
    assert_eq!(calls.get(), 1);
}

// ─── Built-in filters ───────────────────────────────────────────────────────

#[test]
fn digits_strips_everything_else() {
    let mut form = form_with(json!({"phone": "digits"}), json!({"phone": "+49 (0) 123-456"}));
    form.apply_filters();
    assert_eq!(form.get("phone"), Some(json!("490123456")));
}

#[test]
fn person_name_tidies_spacing_and_capitalization() {
    let mut form = form_with(
        json!({"name": "person_name"}),
        json!({"name": "  jean-luc   o' connor "}),
    );
    form.apply_filters();
    assert_eq!(form.get("name"), Some(json!("Jean-Luc O'Connor")));
}

#[test]
fn ucfirst_and_ucwords() {
    let mut form = form_with(
        json!({"a": "ucfirst", "b": "ucwords"}),
        json!({"a": "hello there", "b": "hello there"}),
    );
    form.apply_filters();
    assert_eq!(form.get("a"), Some(json!("Hello there")));
    assert_eq!(form.get("b"), Some(json!("Hello There")));
}

#[test]
fn scalar_coercion_stringifies_numbers() {
    let mut form = form_with(json!({"zip": "trim"}), json!({"zip": 12345}));
    form.apply_filters();
    assert_eq!(form.get("zip"), Some(json!("12345")));
}

/// Idempotence is a property of individual filters, not of the pipeline;
/// each text-normalizing built-in is checked on a second pass.
#[test]
fn text_filters_are_idempotent() {
    let cases = [
        ("trim", "  padded  "),
        ("lower", "MiXeD"),
        ("upper", "MiXeD"),
        ("ucfirst", "hello there"),
        ("ucwords", "hello there"),
        ("digits", "a1b2c3"),
        ("person_name", "  jean-luc   o' connor "),
    ];

    for (name, input) in cases {
        let mut first = form_with(json!({"f": name}), json!({"f": input}));
        first.apply_filters();
        let once = first.get("f").unwrap();

        let mut second = form_with(json!({"f": name}), json!({"f": once.clone()}));
        second.apply_filters();
        let twice = second.get("f").unwrap();

        assert_eq!(once, twice, "filter '{}' is not idempotent", name);
    }
}

// ─── Record preparation ─────────────────────────────────────────────────────

#[test]
fn whitelist_drops_unlisted_fields() {
    let mut form = Form::new();
    form.add_whitelisted_fields(["name", "email"]);
    form.set_raw_data(json!({"name": "x", "email": "a@b.com", "evil": "y"}));

    assert_eq!(form.raw_data(), &json!({"name": "x", "email": "a@b.com"}));
}

#[test]
fn empty_whitelist_means_no_restriction() {
    let mut form = Form::new();
    form.set_raw_data(json!({"anything": "goes"}));
    assert_eq!(form.raw_data(), &json!({"anything": "goes"}));
}

#[test]
fn defaults_appear_beneath_submitted_data() {
    let mut form = Form::new();
    form.add_default_values(&json!({"country": "DE", "name": "unnamed"}));
    form.set_raw_data(json!({"name": "ada"}));

    assert_eq!(form.get("country"), Some(json!("DE")));
    assert_eq!(form.get("name"), Some(json!("ada")));
}

#[test]
fn defaults_merge_recursively() {
    let mut form = Form::new();
    form.add_default_values(&json!({"prefs": {"theme": "light", "lang": "en"}}));
    form.set_raw_data(json!({"prefs": {"theme": "dark"}}));

    assert_eq!(
        form.get("prefs"),
        Some(json!({"theme": "dark", "lang": "en"}))
    );
}

// ─── Validation sees the filtered record ────────────────────────────────────

#[test]
fn validation_runs_against_filtered_values() {
    let mut form = form_with(json!({"code": "trim"}), json!({"code": " 1234 "}));
    form.add_rules("code", &json!({"strlen": 4}));

    form.apply_filters();
    assert!(form.is_valid().unwrap());
}

#[test]
fn refiltering_after_new_raw_data_revalidates() {
    let mut form = Form::new();
    form.add_rules("age", &json!(["numeric"]));

    form.set_raw_data(json!({"age": "abc"}));
    assert!(!form.is_valid().unwrap());

    form.set_raw_data(json!({"age": "42"}));
    assert!(form.is_valid().unwrap());
}
