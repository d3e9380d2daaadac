use crate::value::Value;
use serde_json::{json, Map, Value as JsonValue};

/// Seconds to nanoseconds.
pub const SECONDS: f64 = 1_000_000_000.0;
/// Milliseconds to nanoseconds.
pub const MILLISECONDS: f64 = 1_000_000.0;
/// Microseconds to nanoseconds.
pub const MICROSECONDS: f64 = 1_000.0;

/// Emit `value` as `event.duration` in nanoseconds.
///
/// Numbers are scaled by `multiplier` and rounded half away from zero.
/// Anything else, and numbers whose scaled value is not finite or does not
/// fit an `i64`, is passed through as-is.
pub fn format_duration(value: &Value, multiplier: f64) -> Map<String, JsonValue> {
    let duration = match value.as_f64().and_then(|n| to_nanos(n, multiplier)) {
        Some(nanos) => json!(nanos),
        None => value.to_json(),
    };

    let mut out = Map::new();
    out.insert("event".to_string(), json!({ "duration": duration }));
    out
}

fn to_nanos(value: f64, multiplier: f64) -> Option<i64> {
    let scaled = (value * multiplier).round();
    // i64::MAX as f64 rounds up to 2^63, which no longer fits.
    if scaled.is_finite() && scaled >= i64::MIN as f64 && scaled < i64::MAX as f64 {
        Some(scaled as i64)
    } else {
        None
    }
}
