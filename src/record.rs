use crate::value::Value;
use chrono::{DateTime, FixedOffset, Local};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Severity of a [`LogRecord`], ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
    Unknown,
}

impl Severity {
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
            Severity::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<tracing::Level> for Severity {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE | tracing::Level::DEBUG => Severity::Debug,
            tracing::Level::INFO => Severity::Info,
            tracing::Level::WARN => Severity::Warn,
            tracing::Level::ERROR => Severity::Error,
        }
    }
}

/// A single structured log entry handed to the mapper.
///
/// `time` is only readable from the outside; the mapper may swap it for its
/// UTC equivalent while a document is being built and always puts the
/// original back afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub(crate) time: DateTime<FixedOffset>,
    pub severity: Severity,
    pub message: Value,
    pub progname: Option<String>,
    pub pid: Option<u32>,
    pub attributes: BTreeMap<String, Value>,
}

impl LogRecord {
    /// New record stamped with the current local time.
    pub fn new(severity: Severity, message: impl Into<Value>) -> Self {
        Self {
            time: Local::now().fixed_offset(),
            severity,
            message: message.into(),
            progname: None,
            pid: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn time(&self) -> DateTime<FixedOffset> {
        self.time
    }

    pub fn with_time<Tz: chrono::TimeZone>(mut self, time: DateTime<Tz>) -> Self {
        self.time = time.fixed_offset();
        self
    }

    pub fn with_progname(mut self, progname: impl Into<String>) -> Self {
        self.progname = Some(progname.into());
        self
    }

    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = Some(pid);
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn severity_labels_and_order() {
        assert_eq!(Severity::Warn.label(), "WARN");
        assert_eq!(Severity::from(tracing::Level::TRACE), Severity::Debug);
        assert!(Severity::Error > Severity::Info);
        assert_eq!(Severity::Fatal.ordinal(), 4);
    }

    #[test]
    fn builder_keeps_the_given_offset() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let time = offset.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let record = LogRecord::new(Severity::Info, "hi")
            .with_time(time)
            .with_pid(42)
            .with_attribute("foo", "bar");
        assert_eq!(record.time(), time);
        assert_eq!(record.time().offset().local_minus_utc(), 7200);
        assert_eq!(record.pid, Some(42));
        assert_eq!(record.attributes.get("foo"), Some(&Value::from("bar")));
    }
}
