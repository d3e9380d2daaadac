use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;

/// Dynamically typed value carried by a [`LogRecord`](crate::record::LogRecord)
/// message or attribute.
///
/// The variants are closed on purpose: every formatter in this crate matches
/// them exhaustively instead of inspecting types at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Sequence(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Error(ErrorValue),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Convert into a plain JSON value.
    ///
    /// Errors found below the top level have no schema slot of their own and
    /// are rendered with their `Kind: message` string form. Non-finite floats
    /// become `null`.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Integer(i) => JsonValue::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Sequence(items) => JsonValue::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(map) => JsonValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Value::Error(err) => JsonValue::String(err.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::String(s) => f.write_str(s),
            Value::Error(err) => err.fmt(f),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(i) => Value::Integer(i),
            Err(_) => Value::Float(value as f64),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<ErrorValue> for Value {
    fn from(value: ErrorValue) -> Self {
        Value::Error(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::Sequence(value.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(value: BTreeMap<String, Value>) -> Self {
        Value::Map(value)
    }
}

impl From<JsonValue> for Value {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => Value::String(s),
            JsonValue::Array(items) => Value::Sequence(items.into_iter().map(Value::from).collect()),
            JsonValue::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

/// Captured error: its kind name, optional message and optional frame list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorValue {
    pub kind: String,
    pub message: Option<String>,
    pub backtrace: Option<Vec<String>>,
}

impl ErrorValue {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: kind.into(),
            message: if message.is_empty() { None } else { Some(message) },
            backtrace: None,
        }
    }

    /// Error that carries only a kind.
    pub fn kind_only(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: None,
            backtrace: None,
        }
    }

    pub fn with_backtrace<I, S>(mut self, frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.backtrace = Some(frames.into_iter().map(Into::into).collect());
        self
    }

    /// Capture a typed Rust error. The kind is the unqualified type name of `E`.
    pub fn from_error<E: std::error::Error + ?Sized>(err: &E) -> Self {
        Self::new(short_type_name(std::any::type_name::<E>()), err.to_string())
    }

    /// Capture a type-erased error.
    ///
    /// Only the type is lost behind `dyn Error`, so the kind is recovered by
    /// downcasting to the common std error types and is `Error` otherwise.
    pub fn from_dyn_error(err: &(dyn std::error::Error + 'static)) -> Self {
        Self::new(dyn_error_kind(err), err.to_string())
    }

    /// Attach the backtrace of the calling thread, regardless of the
    /// `RUST_BACKTRACE` setting. Platforms without backtrace support leave
    /// the error unchanged.
    pub fn capture_backtrace(mut self) -> Self {
        let bt = std::backtrace::Backtrace::force_capture();
        if bt.status() == std::backtrace::BacktraceStatus::Captured {
            let frames: Vec<String> = bt
                .to_string()
                .lines()
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .collect();
            self.backtrace = Some(frames);
        }
        self
    }
}

fn dyn_error_kind(err: &(dyn std::error::Error + 'static)) -> &'static str {
    if err.is::<std::io::Error>() {
        "io::Error"
    } else if err.is::<std::num::ParseIntError>() {
        "ParseIntError"
    } else if err.is::<std::num::ParseFloatError>() {
        "ParseFloatError"
    } else if err.is::<std::str::ParseBoolError>() {
        "ParseBoolError"
    } else if err.is::<std::str::Utf8Error>() {
        "Utf8Error"
    } else if err.is::<std::string::FromUtf8Error>() {
        "FromUtf8Error"
    } else if err.is::<std::fmt::Error>() {
        "fmt::Error"
    } else if err.is::<serde_json::Error>() {
        "serde_json::Error"
    } else if err.is::<chrono::ParseError>() {
        "chrono::ParseError"
    } else {
        "Error"
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {}", self.kind, message),
            None => f.write_str(&self.kind),
        }
    }
}

fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
