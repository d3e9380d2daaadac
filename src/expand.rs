use crate::options::FormatterOptions;
use crate::value::ErrorValue;
use serde_json::{Map, Value as JsonValue};

/// Expand an error into the ECS `error` object: `type`, then `message` and
/// `stack_trace` when the error carries them.
///
/// The frame list goes through the configured backtrace cleaner first.
pub fn expand_error(error: &ErrorValue, options: &FormatterOptions) -> JsonValue {
    let mut out = Map::new();
    out.insert("type".to_string(), JsonValue::String(error.kind.clone()));

    if let Some(message) = &error.message {
        out.insert("message".to_string(), JsonValue::String(message.clone()));
    }

    if let Some(frames) = &error.backtrace {
        let frames = match &options.backtrace_cleaner {
            Some(cleaner) => cleaner(frames.as_slice()),
            None => frames.clone(),
        };
        out.insert(
            "stack_trace".to_string(),
            JsonValue::Array(frames.into_iter().map(JsonValue::String).collect()),
        );
    }

    JsonValue::Object(out)
}
