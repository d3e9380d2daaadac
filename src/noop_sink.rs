use crate::error::DeviceError;
use crate::sink::DocumentSink;
use serde_json::{Map, Value};

/// A sink that simply drops all documents.
///
/// Useful for measuring the cost of mapping alone, and for tests that only
/// care about the record side.
#[derive(Clone, Debug, Default)]
pub struct NoopSink;

impl DocumentSink for NoopSink {
    fn write_document(&mut self, _document: &Map<String, Value>) -> Result<(), DeviceError> {
        Ok(())
    }
}
