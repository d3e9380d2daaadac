//! Pruning of empty values before they reach an ECS document.

use crate::value::Value;
use std::collections::BTreeMap;

/// Strip empty strings, empty maps and empty sequences from `value`.
///
/// Returns `None` when the whole value is empty (or null). Maps drop the
/// entries that sanitize to `None`; sequences keep their length and turn such
/// elements into [`Value::Null`], so a sequence only disappears when it had no
/// elements to begin with. Scalars and errors come back unchanged.
pub fn sanitize(value: &Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::Map(map) => {
            let cleaned: BTreeMap<String, Value> = map
                .iter()
                .filter_map(|(k, v)| sanitize(v).map(|v| (k.clone(), v)))
                .collect();
            if cleaned.is_empty() {
                None
            } else {
                Some(Value::Map(cleaned))
            }
        }
        Value::Sequence(items) => {
            if items.is_empty() {
                return None;
            }
            Some(Value::Sequence(
                items.iter().map(|v| sanitize(v).unwrap_or(Value::Null)).collect(),
            ))
        }
        other => Some(other.clone()),
    }
}
