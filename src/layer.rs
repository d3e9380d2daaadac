use crate::device::EcsDevice;
use crate::record::{LogRecord, Severity};
use crate::sink::DocumentSink;
use crate::value::{ErrorValue, Value};
use chrono::Local;
use std::cell::Cell;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// `tracing_subscriber` layer that turns events into [`LogRecord`]s and
/// writes them as ECS documents through an [`EcsDevice`].
///
/// Event fields become record attributes (dotted field names nest in the
/// output), the `message` field becomes the record message and the event
/// target is reported as `log.logger`. Writing happens on the calling thread
/// under a mutex; events raised on that thread while a write is in progress
/// (for instance by a sink that logs) are skipped.
pub struct EcsLayer<S> {
    device: Mutex<EcsDevice<S>>,
    progname: Option<String>,
    max_level: Level,
    error_backtraces: bool,
    /// Total events seen by the layer (before filtering by level).
    pub total_events: Arc<AtomicU64>,
    /// Events that the device failed to write.
    pub failed_events: Arc<AtomicU64>,
    /// Events skipped because they were raised from inside a write.
    pub reentrant_events: Arc<AtomicU64>,
}

thread_local! {
    static WRITING: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as writing until dropped.
struct WriteGuard;

impl WriteGuard {
    fn enter() -> Option<Self> {
        if WRITING.with(|w| w.replace(true)) {
            None
        } else {
            Some(WriteGuard)
        }
    }
}

impl Drop for WriteGuard {
    fn drop(&mut self) {
        WRITING.with(|w| w.set(false));
    }
}

impl<S: DocumentSink> EcsLayer<S> {
    pub fn new(device: EcsDevice<S>) -> Self {
        Self {
            device: Mutex::new(device),
            progname: None,
            max_level: Level::TRACE,
            error_backtraces: false,
            total_events: Arc::new(AtomicU64::new(0)),
            failed_events: Arc::new(AtomicU64::new(0)),
            reentrant_events: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Name reported as `process.name`.
    pub fn with_progname(mut self, progname: impl Into<String>) -> Self {
        self.progname = Some(progname.into());
        self
    }

    /// Most verbose level that is still written.
    pub fn with_max_level(mut self, level: Level) -> Self {
        self.max_level = level;
        self
    }

    /// Attach the backtrace of the logging call site to error fields, so they
    /// carry an ECS `error.stack_trace`.
    pub fn with_error_backtraces(mut self, enabled: bool) -> Self {
        self.error_backtraces = enabled;
        self
    }

    fn record_for(&self, event: &Event<'_>) -> LogRecord {
        let mut attributes = BTreeMap::new();
        let mut message = Value::Null;
        let mut visitor = FieldVisitor {
            attributes: &mut attributes,
            message: &mut message,
            capture_backtraces: self.error_backtraces,
        };
        event.record(&mut visitor);

        let meta = event.metadata();
        attributes
            .entry("log.logger".to_string())
            .or_insert_with(|| Value::from(meta.target()));
        if let Some(file) = meta.file() {
            attributes
                .entry("log.origin.file.name".to_string())
                .or_insert_with(|| Value::from(file));
        }
        if let Some(line) = meta.line() {
            attributes
                .entry("log.origin.file.line".to_string())
                .or_insert_with(|| Value::from(line));
        }

        LogRecord {
            time: Local::now().fixed_offset(),
            severity: Severity::from(*meta.level()),
            message,
            progname: self.progname.clone(),
            pid: Some(std::process::id()),
            attributes,
        }
    }
}

impl<S, R> Layer<R> for EcsLayer<S>
where
    S: DocumentSink + 'static,
    R: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, R>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        if *event.metadata().level() > self.max_level {
            return;
        }

        // The global dispatcher does not guard against re-entry; taking the
        // device lock again on this thread would deadlock.
        let Some(_writing) = WriteGuard::enter() else {
            self.reentrant_events.fetch_add(1, Ordering::Relaxed);
            return;
        };

        let mut record = self.record_for(event);
        let mut device = match self.device.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Err(e) = device.write(&mut record) {
            self.failed_events.fetch_add(1, Ordering::Relaxed);
            eprintln!("failed to write ECS log record: {}", e);
        }
    }
}

pub struct FieldVisitor<'a> {
    pub attributes: &'a mut BTreeMap<String, Value>,
    pub message: &'a mut Value,
    /// Attach the current backtrace to recorded errors.
    pub capture_backtraces: bool,
}

impl<'a> FieldVisitor<'a> {
    fn insert(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            *self.message = value;
        } else {
            self.attributes.insert(field.name().to_string(), value);
        }
    }
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        let mut error = ErrorValue::from_dyn_error(value);
        if self.capture_backtraces {
            error = error.capture_backtrace();
        }
        self.insert(field, Value::Error(error));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.insert(field, Value::String(format!("{:?}", value)));
    }
}
