#![no_main]

use formval::primitives::resolve_references;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // Use the first byte to determine the split point between parameter and record.
    let split = data[0] as usize % data.len().max(1);
    let (param_bytes, record_bytes) = data.split_at(split.min(data.len()));

    let param = serde_json::Value::String(String::from_utf8_lossy(param_bytes).into_owned());

    if let Ok(record) = serde_json::from_slice::<serde_json::Value>(record_bytes) {
        // Must terminate even on self-referential records.
        let _ = resolve_references(&param, &record);
        let _ = resolve_references(&record, &record);
    }
});
