use formval::primitives::{resolve_path, set_path, unset_path};
use proptest::prelude::*;
use serde_json::{Value, json};

/// Strategy for arbitrary JSON values nested up to `depth` levels.
fn arb_json(depth: u32) -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|i| json!(i)),
        "[a-z]{1,8}".prop_map(Value::String),
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

/// Strategy for non-numeric dot-paths (so segments always address mappings).
fn arb_key_path() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z][a-z0-9]{0,5}", 1..5).prop_map(|segments| segments.join("."))
}

/// Extract all valid dot-paths from a JSON value (objects only, up to max_depth).
fn extract_paths(value: &Value, prefix: &str, paths: &mut Vec<String>, max_depth: u32) {
    if max_depth == 0 {
        return;
    }
    if let Some(obj) = value.as_object() {
        for (key, child) in obj {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", prefix, key)
            };
            paths.push(path.clone());
            extract_paths(child, &path, paths, max_depth - 1);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn empty_path_returns_root(value in arb_json(3)) {
        let result = resolve_path("", &value);
        prop_assert_eq!(result, Some(value));
    }

    #[test]
    fn extracted_paths_resolve(value in arb_json(3)) {
        let mut paths = Vec::new();
        extract_paths(&value, "", &mut paths, 4);
        for path in &paths {
            let result = resolve_path(path, &value);
            prop_assert!(result.is_some(), "resolve_path({:?}) returned None on value {:?}", path, value);
        }
    }

    #[test]
    fn resolve_never_panics(
        path in "\\PC{0,30}",
        value in arb_json(2),
    ) {
        let _ = resolve_path(&path, &value);
    }

    #[test]
    fn set_then_resolve_round_trips(
        path in arb_key_path(),
        value in arb_json(2),
    ) {
        let mut record = json!({});
        set_path(&mut record, &path, value.clone());
        prop_assert_eq!(resolve_path(&path, &record), Some(value));
    }

    #[test]
    fn set_then_unset_removes(
        path in arb_key_path(),
        value in arb_json(2),
    ) {
        let mut record = json!({});
        set_path(&mut record, &path, value);
        unset_path(&mut record, &path);
        prop_assert_eq!(resolve_path(&path, &record), None);
    }

    #[test]
    fn set_never_panics(
        path in "\\PC{0,30}",
        value in arb_json(2),
    ) {
        let mut record = json!({});
        set_path(&mut record, &path, value);
    }

    #[test]
    fn numeric_segments_index_sequences(
        items in prop::collection::vec(arb_json(1), 1..6),
    ) {
        let record = json!({"items": items.clone()});
        for (i, item) in items.iter().enumerate() {
            let path = format!("items.{}", i);
            prop_assert_eq!(resolve_path(&path, &record), Some(item.clone()));
        }
        let out_of_range = format!("items.{}", items.len());
        prop_assert_eq!(resolve_path(&out_of_range, &record), None);
    }
}
