use crate::expand::expand_error;
use crate::options::FormatterOptions;
use crate::value::Value;
use serde_json::{Map, Value as JsonValue};

/// Format the record message into `{"message": ..}`, adding an `error`
/// object when the message is itself an error.
///
/// Maps pass through untouched, null stays null, everything else is rendered
/// as a string and cut to `max_message_length` characters.
pub fn format_message(message: &Value, options: &FormatterOptions) -> Map<String, JsonValue> {
    let mut out = Map::new();

    match message {
        Value::Error(err) => {
            out.insert("message".to_string(), JsonValue::String(err.to_string()));
            out.insert("error".to_string(), expand_error(err, options));
        }
        Value::Map(_) => {
            out.insert("message".to_string(), message.to_json());
        }
        Value::Null => {
            out.insert("message".to_string(), JsonValue::Null);
        }
        other => {
            let mut text = other.to_string();
            if let Some(max) = options.max_message_length {
                truncate_chars(&mut text, max.get());
            }
            out.insert("message".to_string(), JsonValue::String(text));
        }
    }

    out
}

fn truncate_chars(text: &mut String, max_chars: usize) {
    if let Some((idx, _)) = text.char_indices().nth(max_chars) {
        text.truncate(idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ErrorValue;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::num::NonZeroUsize;

    fn format(message: Value, options: &FormatterOptions) -> JsonValue {
        JsonValue::Object(format_message(&message, options))
    }

    #[test]
    fn strings_pass_through() {
        assert_eq!(
            format("hello".into(), &FormatterOptions::default()),
            json!({"message": "hello"})
        );
    }

    #[test]
    fn non_string_scalars_are_stringified() {
        assert_eq!(format(42.into(), &FormatterOptions::default()), json!({"message": "42"}));
        assert_eq!(format(true.into(), &FormatterOptions::default()), json!({"message": "true"}));
    }

    #[test]
    fn null_message_stays_null() {
        assert_eq!(format(Value::Null, &FormatterOptions::default()), json!({"message": null}));
    }

    #[test]
    fn maps_are_not_sanitized() {
        let mut map = BTreeMap::new();
        map.insert("text".to_string(), Value::from(""));
        map.insert("id".to_string(), Value::from(7));
        assert_eq!(
            format(Value::Map(map), &FormatterOptions::default()),
            json!({"message": {"text": "", "id": 7}})
        );
    }

    #[test]
    fn errors_expand_into_message_and_error() {
        let err = ErrorValue::new("RuntimeError", "boom").with_backtrace(["app.rb:3"]);
        assert_eq!(
            format(err.into(), &FormatterOptions::default()),
            json!({
                "message": "RuntimeError: boom",
                "error": {"type": "RuntimeError", "message": "boom", "stack_trace": ["app.rb:3"]}
            })
        );
    }

    #[test]
    fn long_messages_are_cut_by_characters() {
        let options = FormatterOptions::default().with_max_message_length(NonZeroUsize::new(3).unwrap());
        assert_eq!(format("héllo".into(), &options), json!({"message": "hél"}));
        assert_eq!(format("hé".into(), &options), json!({"message": "hé"}));
    }

    #[test]
    fn errors_are_not_truncated() {
        let options = FormatterOptions::default().with_max_message_length(NonZeroUsize::new(2).unwrap());
        let err = ErrorValue::new("RuntimeError", "boom");
        assert_eq!(format(err.into(), &options)["message"], json!("RuntimeError: boom"));
    }
}
