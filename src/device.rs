use crate::error::DeviceError;
use crate::mapper::EcsMapper;
use crate::record::LogRecord;
use crate::sink::{DocumentSink, JsonLineSink};
use std::io::Write;

/// Logging device that maps records to ECS and writes them to a
/// [`DocumentSink`].
pub struct EcsDevice<S> {
    mapper: EcsMapper,
    sink: S,
}

impl<W: Write + Send> EcsDevice<JsonLineSink<W>> {
    /// Device writing JSON lines to `writer`.
    pub fn json_lines(mapper: EcsMapper, writer: W) -> Self {
        Self::new(mapper, JsonLineSink::new(writer))
    }
}

impl<S: DocumentSink> EcsDevice<S> {
    pub fn new(mapper: EcsMapper, sink: S) -> Self {
        Self { mapper, sink }
    }

    pub fn mapper(&self) -> &EcsMapper {
        &self.mapper
    }

    /// Mutable access for reconfiguring the formatter options between writes.
    pub fn mapper_mut(&mut self) -> &mut EcsMapper {
        &mut self.mapper
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Map `record` and write the resulting document.
    ///
    /// The record's time is restored before this returns, including when
    /// the sink fails.
    pub fn write(&mut self, record: &mut LogRecord) -> Result<(), DeviceError> {
        let sink = &mut self.sink;
        self.mapper.map_with(record, |document| sink.write_document(&document))
    }

    pub fn flush(&mut self) -> Result<(), DeviceError> {
        self.sink.flush()
    }
}
