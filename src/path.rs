//! Placing values into nested JSON objects by dotted name.

use serde_json::{Map, Value as JsonValue};

/// Insert `value` at the path named by `dotted_key` (`a.b.c` → `{a: {b: {c: ..}}}`).
pub fn assign(target: &mut Map<String, JsonValue>, dotted_key: &str, value: JsonValue) {
    let segments: Vec<&str> = dotted_key.split('.').collect();
    assign_path(target, &segments, value);
}

/// Insert `value` at `segments`, creating intermediate objects as needed.
///
/// Existing objects along the way are reused so siblings survive. Any
/// non-object found on an intermediate segment is replaced by a fresh object;
/// the last segment is always overwritten.
pub fn assign_path(target: &mut Map<String, JsonValue>, segments: &[&str], value: JsonValue) {
    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    let mut current = target;
    for segment in parents {
        let slot = current
            .entry(segment.to_string())
            .or_insert_with(|| JsonValue::Object(Map::new()));
        if !slot.is_object() {
            *slot = JsonValue::Object(Map::new());
        }
        current = match slot {
            JsonValue::Object(map) => map,
            _ => unreachable!("slot was just made an object"),
        };
    }
    current.insert(last.to_string(), value);
}

/// Merge `partial` into `target`: objects meeting objects are merged key by
/// key with the same rule, anything else overwrites.
pub fn merge(target: &mut Map<String, JsonValue>, partial: Map<String, JsonValue>) {
    for (key, value) in partial {
        match (target.get_mut(&key), value) {
            (Some(JsonValue::Object(existing)), JsonValue::Object(incoming)) => {
                merge(existing, incoming);
            }
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}
