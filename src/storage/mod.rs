//! Destinations for feature records: the CSV table, or a JSON-lines log for
//! inspection runs.

mod csv_sink;

pub use csv_sink::FeatureSink;

use crate::error::SinkError;
use crate::features::FeatureRecord;
use crate::logging::StructuredLogger;
use std::io::Write;

/// Anything the capture loop can forward feature records to.
pub trait RecordSink {
    fn accept(&mut self, record: &FeatureRecord) -> Result<(), SinkError>;
}

impl RecordSink for FeatureSink {
    fn accept(&mut self, record: &FeatureRecord) -> Result<(), SinkError> {
        self.append(record)
    }
}

impl RecordSink for Vec<FeatureRecord> {
    fn accept(&mut self, record: &FeatureRecord) -> Result<(), SinkError> {
        self.push(record.clone());
        Ok(())
    }
}

impl<T: RecordSink + ?Sized> RecordSink for Box<T> {
    fn accept(&mut self, record: &FeatureRecord) -> Result<(), SinkError> {
        (**self).accept(record)
    }
}

/// Writes each record as one JSON object per line instead of persisting it.
pub struct LogSink<W: Write> {
    out: W,
}

impl LogSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self {
            out: std::io::stdout(),
        }
    }
}

impl<W: Write> LogSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RecordSink for LogSink<W> {
    fn accept(&mut self, record: &FeatureRecord) -> Result<(), SinkError> {
        StructuredLogger::emit_json(record, &mut self.out)?;
        Ok(())
    }
}
