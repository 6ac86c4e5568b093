use formval::normalize::{normalize_filter_decl, normalize_rule_decl};
use proptest::prelude::*;
use serde_json::{Value, json};

/// Unique rule names for order-preservation checks.
fn arb_rule_names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::hash_set("[a-z_]{1,10}", 1..8)
        .prop_map(|set| set.into_iter().collect::<Vec<_>>())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn bare_name_wraps_to_null_params(name in "[a-z_]{1,12}") {
        let normalized = normalize_rule_decl(&json!(name));
        prop_assert_eq!(normalized.len(), 1);
        prop_assert_eq!(normalized.get(&name), Some(&Value::Null));
    }

    #[test]
    fn list_declaration_preserves_order(names in arb_rule_names()) {
        let decl = json!(names);
        let normalized = normalize_rule_decl(&decl);
        let keys: Vec<&String> = normalized.keys().collect();
        prop_assert_eq!(keys, names.iter().collect::<Vec<_>>());
    }

    #[test]
    fn normalization_is_idempotent(names in arb_rule_names()) {
        let decl = json!(names);
        let once = normalize_rule_decl(&decl);
        let twice = normalize_rule_decl(&Value::Object(once.clone()));
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn mixed_shapes_flatten_in_order(
        bare in "[a-z]{1,8}",
        named in "[A-Z]{1,8}",
        param in any::<i64>(),
    ) {
        let decl = json!([bare, { named.clone(): param }]);
        let normalized = normalize_rule_decl(&decl);
        let keys: Vec<&String> = normalized.keys().collect();
        prop_assert_eq!(keys, vec![&bare, &named]);
        prop_assert_eq!(normalized.get(&named), Some(&json!(param)));
    }

    #[test]
    fn filter_steps_bind_field_and_wrap_params(
        field in "[a-z]{1,8}",
        callable in "[a-z_]{1,8}",
        param in "[a-z]{1,8}",
    ) {
        let steps = normalize_filter_decl(&field, &json!({ callable.clone(): param.clone() }));
        prop_assert_eq!(steps.len(), 1);
        prop_assert_eq!(&steps[0].field, &field);
        prop_assert_eq!(&steps[0].callable, &callable);
        prop_assert_eq!(&steps[0].params, &vec![json!(param)]);
    }

    #[test]
    fn null_filter_params_normalize_to_empty_list(
        field in "[a-z]{1,8}",
        callable in "[a-z_]{1,8}",
    ) {
        let steps = normalize_filter_decl(&field, &json!(callable));
        prop_assert_eq!(steps.len(), 1);
        prop_assert!(steps[0].params.is_empty());
    }
}
