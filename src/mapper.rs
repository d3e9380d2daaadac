use crate::attributes::format_attributes;
use crate::duration::{self, format_duration};
use crate::error::ConfigError;
use crate::message::format_message;
use crate::options::{BacktraceCleaner, FormatterOptions};
use crate::path;
use crate::record::LogRecord;
use crate::sanitize::sanitize;
use crate::value::Value;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Utc};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::num::NonZeroUsize;
use std::ops::Deref;

/// Default `@timestamp` format: microsecond precision with a literal `Z`.
pub const DEFAULT_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Where a record field ends up in the ECS document.
#[derive(Debug, Clone, Copy, PartialEq)]
enum FieldFormat {
    /// Deposited verbatim at a fixed path.
    Path(&'static [&'static str]),
    Message,
    /// Numeric duration scaled to nanoseconds.
    Duration(f64),
    Attributes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordField {
    Time,
    Severity,
    Progname,
    Pid,
    Message,
    Duration,
    DurationMs,
    DurationMicros,
    DurationNs,
    Attributes,
}

impl RecordField {
    /// Attribute name the field is read from, for fields carried as attributes.
    fn attribute_name(self) -> Option<&'static str> {
        match self {
            RecordField::Duration => Some("duration"),
            RecordField::DurationMs => Some("duration_ms"),
            RecordField::DurationMicros => Some("duration_micros"),
            RecordField::DurationNs => Some("duration_ns"),
            _ => None,
        }
    }
}

const FIELD_MAPPING: &[(RecordField, FieldFormat)] = &[
    (RecordField::Time, FieldFormat::Path(&["@timestamp"])),
    (RecordField::Severity, FieldFormat::Path(&["log", "level"])),
    (RecordField::Progname, FieldFormat::Path(&["process", "name"])),
    (RecordField::Pid, FieldFormat::Path(&["process", "pid"])),
    (RecordField::Message, FieldFormat::Message),
    (RecordField::Duration, FieldFormat::Duration(duration::SECONDS)),
    (RecordField::DurationMs, FieldFormat::Duration(duration::MILLISECONDS)),
    (RecordField::DurationMicros, FieldFormat::Duration(duration::MICROSECONDS)),
    (RecordField::DurationNs, FieldFormat::Path(&["event", "duration"])),
    (RecordField::Attributes, FieldFormat::Attributes),
];

/// Maps [`LogRecord`]s onto ECS documents.
///
/// The field table is fixed; only the formatter options and the timestamp
/// format are configurable. Mapping a record never fails.
#[derive(Debug, Clone)]
pub struct EcsMapper {
    options: FormatterOptions,
    datetime_format: String,
    utc: bool,
}

impl Default for EcsMapper {
    fn default() -> Self {
        Self {
            options: FormatterOptions::default(),
            datetime_format: DEFAULT_DATETIME_FORMAT.to_string(),
            utc: true,
        }
    }
}

impl EcsMapper {
    /// Build a mapper for the given options and `@timestamp` format.
    ///
    /// **Returns**
    /// - `Err(ConfigError::InvalidDatetimeFormat)` if `datetime_format` holds a
    ///   specifier chrono does not understand.
    pub fn new(options: FormatterOptions, datetime_format: impl Into<String>) -> Result<Self, ConfigError> {
        let datetime_format = datetime_format.into();
        if StrftimeItems::new(&datetime_format).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::InvalidDatetimeFormat(datetime_format));
        }
        let utc = has_literal_zulu(&datetime_format);
        tracing::debug!(format = %datetime_format, utc, "built ECS mapper");
        Ok(Self { options, datetime_format, utc })
    }

    pub fn options(&self) -> &FormatterOptions {
        &self.options
    }

    pub fn datetime_format(&self) -> &str {
        &self.datetime_format
    }

    /// Whether `@timestamp` is rendered from the UTC instant.
    pub fn normalizes_to_utc(&self) -> bool {
        self.utc
    }

    pub fn set_backtrace_cleaner(&mut self, cleaner: Option<BacktraceCleaner>) {
        self.options.backtrace_cleaner = cleaner;
    }

    pub fn set_max_message_length(&mut self, length: Option<NonZeroUsize>) {
        self.options.max_message_length = length;
    }

    /// Map `record` into an ECS document.
    ///
    /// The record's time is left as it was on return.
    pub fn map(&self, record: &mut LogRecord) -> Map<String, JsonValue> {
        let scoped = ScopedTime::acquire(record, self.utc);
        self.build(&scoped)
    }

    /// Map `record` and hand the document to `f` while the record still
    /// carries its normalized time.
    ///
    /// The original time is restored once `f` returns, whether it succeeded,
    /// failed or panicked; an error from `f` is returned unchanged.
    pub fn map_with<T, E, F>(&self, record: &mut LogRecord, f: F) -> Result<T, E>
    where
        F: FnOnce(Map<String, JsonValue>) -> Result<T, E>,
    {
        let scoped = ScopedTime::acquire(record, self.utc);
        let document = self.build(&scoped);
        let result = f(document);
        drop(scoped);
        result
    }

    fn build(&self, record: &LogRecord) -> Map<String, JsonValue> {
        let mut document = Map::new();

        for (field, format) in FIELD_MAPPING {
            match format {
                FieldFormat::Path(segments) => {
                    if let Some(value) = self.literal(record, *field) {
                        path::assign_path(&mut document, segments, value);
                    }
                }
                FieldFormat::Message => {
                    path::merge(&mut document, format_message(&record.message, &self.options));
                }
                FieldFormat::Duration(multiplier) => {
                    let value = field
                        .attribute_name()
                        .and_then(|name| record.attributes.get(name))
                        .and_then(sanitize);
                    if let Some(value) = value {
                        path::merge(&mut document, format_duration(&value, *multiplier));
                    }
                }
                FieldFormat::Attributes => {
                    let attributes = if record.attributes.keys().any(|k| is_field_attribute(k)) {
                        let rest: BTreeMap<String, Value> = record
                            .attributes
                            .iter()
                            .filter(|(k, _)| !is_field_attribute(k))
                            .map(|(k, v)| (k.clone(), v.clone()))
                            .collect();
                        format_attributes(&rest, &self.options)
                    } else {
                        format_attributes(&record.attributes, &self.options)
                    };
                    path::merge(&mut document, attributes);
                }
            }
        }

        document
    }

    fn literal(&self, record: &LogRecord, field: RecordField) -> Option<JsonValue> {
        match field {
            RecordField::Time => Some(JsonValue::String(self.format_time(&record.time))),
            RecordField::Severity => Some(JsonValue::String(record.severity.label().to_string())),
            RecordField::Progname => record.progname.clone().map(JsonValue::String),
            RecordField::Pid => record.pid.map(JsonValue::from),
            other => other
                .attribute_name()
                .and_then(|name| record.attributes.get(name))
                .and_then(sanitize)
                .map(|v| v.to_json()),
        }
    }

    fn format_time(&self, time: &DateTime<FixedOffset>) -> String {
        let mut out = String::new();
        if write!(out, "{}", time.format(&self.datetime_format)).is_err() {
            // Formats are validated up front; keep a usable timestamp anyway.
            return time.to_rfc3339();
        }
        out
    }
}

fn is_field_attribute(name: &str) -> bool {
    FIELD_MAPPING
        .iter()
        .any(|(field, _)| field.attribute_name() == Some(name))
}

/// True when `format` contains a `Z` that is not part of a `%` specifier.
fn has_literal_zulu(format: &str) -> bool {
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        match c {
            '%' => {
                chars.next();
            }
            'Z' => return true,
            _ => {}
        }
    }
    false
}

/// Holds a record whose time may have been switched to UTC and switches it
/// back on drop.
struct ScopedTime<'a> {
    record: &'a mut LogRecord,
    original: DateTime<FixedOffset>,
}

impl<'a> ScopedTime<'a> {
    fn acquire(record: &'a mut LogRecord, utc: bool) -> Self {
        let original = record.time;
        if utc {
            record.time = original.with_timezone(&Utc).fixed_offset();
        }
        Self { record, original }
    }
}

impl Deref for ScopedTime<'_> {
    type Target = LogRecord;

    fn deref(&self) -> &LogRecord {
        self.record
    }
}

impl Drop for ScopedTime<'_> {
    fn drop(&mut self) {
        self.record.time = self.original;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Severity;
    use crate::value::ErrorValue;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn local_time() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 9, 15, 4, 5)
            .unwrap()
            + chrono::Duration::microseconds(123_456)
    }

    #[test]
    fn zulu_detection_skips_specifiers() {
        assert!(has_literal_zulu(DEFAULT_DATETIME_FORMAT));
        assert!(!has_literal_zulu("%Y-%m-%dT%H:%M:%S%Z"));
        assert!(!has_literal_zulu("%Y-%m-%dT%H:%M:%S%:z"));
        assert!(has_literal_zulu("%%Z"));
    }

    #[test]
    fn invalid_datetime_format_is_rejected() {
        let err = EcsMapper::new(FormatterOptions::default(), "%Y %!").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDatetimeFormat(_)));
    }

    #[test]
    fn timestamp_is_rendered_in_utc_and_restored() {
        let mapper = EcsMapper::default();
        let mut record = LogRecord::new(Severity::Info, "hi").with_time(local_time());
        let doc = mapper.map(&mut record);
        assert_eq!(doc["@timestamp"], json!("2024-03-09T12:04:05.123456Z"));
        assert_eq!(record.time(), local_time());
        assert_eq!(record.time().offset().local_minus_utc(), 3 * 3600);
    }

    #[test]
    fn formats_without_literal_z_keep_the_local_offset() {
        let mapper = EcsMapper::new(FormatterOptions::default(), "%Y-%m-%dT%H:%M:%S%:z").unwrap();
        assert!(!mapper.normalizes_to_utc());
        let mut record = LogRecord::new(Severity::Info, "hi").with_time(local_time());
        assert_eq!(mapper.map(&mut record)["@timestamp"], json!("2024-03-09T15:04:05+03:00"));
    }

    #[test]
    fn time_is_restored_when_the_consumer_fails() {
        let mapper = EcsMapper::default();
        let mut record = LogRecord::new(Severity::Info, "hi").with_time(local_time());
        let result: Result<(), &str> = mapper.map_with(&mut record, |_| Err("encoder failed"));
        assert_eq!(result, Err("encoder failed"));
        assert_eq!(record.time(), local_time());
        assert_eq!(record.time().offset().local_minus_utc(), 3 * 3600);
    }

    #[test]
    fn consumer_sees_the_normalized_document() {
        let mapper = EcsMapper::default();
        let mut record = LogRecord::new(Severity::Warn, "hi").with_time(local_time());
        let ts = mapper
            .map_with(&mut record, |doc| Ok::<_, ()>(doc["@timestamp"].clone()))
            .unwrap();
        assert_eq!(ts, json!("2024-03-09T12:04:05.123456Z"));
    }

    #[test]
    fn duration_fields_are_not_repeated_as_attributes() {
        let mapper = EcsMapper::default();
        let mut record = LogRecord::new(Severity::Info, "done")
            .with_time(local_time())
            .with_attribute("duration_ms", 1200)
            .with_attribute("event.action", "export");
        let doc = mapper.map(&mut record);
        assert_eq!(
            JsonValue::Object(doc),
            json!({
                "@timestamp": "2024-03-09T12:04:05.123456Z",
                "log": {"level": "INFO"},
                "message": "done",
                "event": {"duration": 1_200_000_000, "action": "export"}
            })
        );
    }

    #[test]
    fn duration_ns_is_copied_verbatim() {
        let mapper = EcsMapper::default();
        let mut record = LogRecord::new(Severity::Info, "done").with_attribute("duration_ns", 12000);
        assert_eq!(mapper.map(&mut record)["event"], json!({"duration": 12000}));
    }

    #[test]
    fn message_error_and_error_attribute_share_the_error_object() {
        let mapper = EcsMapper::default();
        let mut record = LogRecord::new(Severity::Error, ErrorValue::new("RuntimeError", "boom"))
            .with_attribute("error.code", "E1");
        let doc = mapper.map(&mut record);
        assert_eq!(
            doc["error"],
            json!({"type": "RuntimeError", "message": "boom", "code": "E1"})
        );
    }

    #[test]
    fn setters_replace_options() {
        let mut mapper = EcsMapper::default();
        mapper.set_max_message_length(NonZeroUsize::new(4));
        let mut record = LogRecord::new(Severity::Info, "truncated");
        assert_eq!(mapper.map(&mut record)["message"], json!("trun"));

        mapper.set_max_message_length(None);
        assert_eq!(mapper.map(&mut record)["message"], json!("truncated"));
        assert_eq!(record.message, Value::from("truncated"));
    }
}
