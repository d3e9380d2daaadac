use crate::expand::expand_error;
use crate::options::FormatterOptions;
use crate::path;
use crate::sanitize::sanitize;
use crate::value::Value;
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

/// Attribute name that carries an error in ECS.
pub const ERROR_ATTRIBUTE: &str = "error";

/// Turn free-form record attributes into top-level ECS fields.
///
/// Empty values are dropped, dotted names become nested objects, and an
/// `error` attribute holding an error is expanded into the ECS `error` object.
/// Later names overwrite earlier ones on collision.
pub fn format_attributes(
    attributes: &BTreeMap<String, Value>,
    options: &FormatterOptions,
) -> Map<String, JsonValue> {
    let mut out = Map::new();

    for (name, value) in attributes {
        let Some(value) = sanitize(value) else {
            continue;
        };

        match &value {
            Value::Error(err) if name == ERROR_ATTRIBUTE => {
                out.insert(name.clone(), expand_error(err, options));
            }
            _ if name.contains('.') => path::assign(&mut out, name, value.to_json()),
            _ => {
                out.insert(name.clone(), value.to_json());
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ErrorValue;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn attrs(entries: Vec<(&str, Value)>) -> BTreeMap<String, Value> {
        entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn plain_and_dotted_names() {
        let out = format_attributes(
            &attrs(vec![
                ("foo", Value::from("bar")),
                ("http.request.method", Value::from("GET")),
                ("http.response.status_code", Value::from(200)),
            ]),
            &FormatterOptions::default(),
        );
        assert_eq!(
            JsonValue::Object(out),
            json!({
                "foo": "bar",
                "http": {"request": {"method": "GET"}, "response": {"status_code": 200}}
            })
        );
    }

    #[test]
    fn empty_values_are_dropped() {
        let out = format_attributes(
            &attrs(vec![
                ("blank", Value::from("")),
                ("none", Value::Null),
                ("list", Value::Sequence(vec![])),
                ("kept", Value::from(0)),
            ]),
            &FormatterOptions::default(),
        );
        assert_eq!(JsonValue::Object(out), json!({"kept": 0}));
    }

    #[test]
    fn error_attribute_is_expanded() {
        let err = ErrorValue::new("IOError", "disk full").with_backtrace(["x.rs:1"]);
        let out = format_attributes(&attrs(vec![("error", err.into())]), &FormatterOptions::default());
        assert_eq!(
            JsonValue::Object(out),
            json!({"error": {"type": "IOError", "message": "disk full", "stack_trace": ["x.rs:1"]}})
        );
    }

    #[test]
    fn error_attribute_string_passes_through() {
        let out = format_attributes(
            &attrs(vec![("error", Value::from("error string"))]),
            &FormatterOptions::default(),
        );
        assert_eq!(JsonValue::Object(out), json!({"error": "error string"}));
    }

    #[test]
    fn errors_under_other_names_use_their_string_form() {
        let err = ErrorValue::new("IOError", "disk full");
        let out = format_attributes(&attrs(vec![("cause", err.into())]), &FormatterOptions::default());
        assert_eq!(JsonValue::Object(out), json!({"cause": "IOError: disk full"}));
    }

    #[test]
    fn dotted_error_fields_nest_under_error() {
        let out = format_attributes(
            &attrs(vec![("error.code", Value::from("E42"))]),
            &FormatterOptions::default(),
        );
        assert_eq!(JsonValue::Object(out), json!({"error": {"code": "E42"}}));
    }

    #[test]
    fn later_dotted_name_replaces_earlier_scalar() {
        // "a" sorts before "a.b", so the scalar is written first and then replaced.
        let out = format_attributes(
            &attrs(vec![("a", Value::from("scalar")), ("a.b", Value::from(1))]),
            &FormatterOptions::default(),
        );
        assert_eq!(JsonValue::Object(out), json!({"a": {"b": 1}}));
    }
}
