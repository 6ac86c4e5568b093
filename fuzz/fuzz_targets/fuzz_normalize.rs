#![no_main]

use formval::normalize::{normalize_filter_decl, normalize_rule_decl};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(decl) = serde_json::from_slice::<serde_json::Value>(data) {
        let normalized = normalize_rule_decl(&decl);
        // Idempotence: normalizing the canonical form is a no-op.
        let again = normalize_rule_decl(&serde_json::Value::Object(normalized.clone()));
        assert_eq!(normalized, again);

        let _ = normalize_filter_decl("field", &decl);
    }
});
