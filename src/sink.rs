use crate::error::DeviceError;
use serde_json::{Map, Value};
use std::io::Write;

/// Destination for mapped ECS documents.
///
/// Implementations turn a document into bytes and put them somewhere (a
/// stream, a file, a test buffer). The [`EcsDevice`](crate::device::EcsDevice)
/// calls `write_document` while the source record still carries its
/// normalized time.
pub trait DocumentSink: Send {
    /// Write a single document.
    ///
    /// **Returns**
    /// - `Ok(())` if the document was accepted.
    /// - `Err(..)` if it could not be serialized or written. The error is
    ///   handed back to the caller of the device unchanged.
    fn write_document(&mut self, document: &Map<String, Value>) -> Result<(), DeviceError>;

    /// Flush any buffered output.
    ///
    /// Default implementation is a no-op.
    fn flush(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }
}

/// Writes each document as one line of compact JSON.
#[derive(Debug)]
pub struct JsonLineSink<W> {
    writer: W,
}

impl<W: Write> JsonLineSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> DocumentSink for JsonLineSink<W> {
    fn write_document(&mut self, document: &Map<String, Value>) -> Result<(), DeviceError> {
        let mut line = serde_json::to_vec(document)?;
        line.push(b'\n');
        self.writer.write_all(&line)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), DeviceError> {
        self.writer.flush()?;
        Ok(())
    }
}
