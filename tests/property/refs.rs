use formval::primitives::{mask_reference, resolve_references};
use proptest::prelude::*;
use serde_json::{Value, json};

/// Mask-free JSON values: strings never contain `~`, so resolution must
/// leave them untouched.
fn arb_plain_json(depth: u32) -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|i| json!(i)),
        "[a-z ]{0,8}".prop_map(Value::String),
    ];

    leaf.prop_recursive(depth, 64, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec(("[a-z][a-z0-9]{0,5}", inner), 1..5).prop_map(|pairs| {
                let map: serde_json::Map<String, Value> = pairs.into_iter().collect();
                Value::Object(map)
            }),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn resolution_never_panics(
        param in "\\PC{0,40}",
        source in arb_plain_json(2),
    ) {
        let _ = resolve_references(&json!(param), &source);
    }

    #[test]
    fn mask_free_values_pass_through(value in arb_plain_json(3)) {
        let source = json!({"unrelated": 1});
        prop_assert_eq!(resolve_references(&value, &source), value);
    }

    #[test]
    fn whole_value_mask_preserves_type(
        key in "[a-z]{1,6}",
        value in arb_plain_json(2),
    ) {
        let source = json!({ key.clone(): value.clone() });
        let param = json!(mask_reference(&key));
        prop_assert_eq!(resolve_references(&param, &source), value);
    }

    #[test]
    fn embedded_mask_splices_string_form(
        key in "[a-z]{1,6}",
        referenced in "[a-z]{1,8}",
    ) {
        let source = json!({ key.clone(): referenced.clone() });
        let param = json!(format!("pre-{}-post", mask_reference(&key)));
        let expected = json!(format!("pre-{}-post", referenced));
        prop_assert_eq!(resolve_references(&param, &source), expected);
    }

    #[test]
    fn missing_reference_splices_empty_string(key in "[a-z]{1,6}") {
        let source = json!({});
        let param = json!(format!("pre-{}-post", mask_reference(&key)));
        prop_assert_eq!(resolve_references(&param, &source), json!("pre--post"));
    }

    #[test]
    fn resolution_recurses_through_containers(
        key in "[a-z]{1,6}",
        referenced in any::<i64>(),
    ) {
        let source = json!({ key.clone(): referenced });
        let param = json!({
            "list": [mask_reference(&key)],
            "nested": { "value": mask_reference(&key) },
        });
        let resolved = resolve_references(&param, &source);
        prop_assert_eq!(&resolved["list"][0], &json!(referenced));
        prop_assert_eq!(&resolved["nested"]["value"], &json!(referenced));
    }
}
