//! Record output: CSV with the schema header, or one JSON object per line.

use crate::features::FeatureRecord;
use crate::logging::StructuredLogger;
use serde::Serialize;
use std::io::{self, Write};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("io: {0}")]
    Io(#[from] io::Error),
}

/// Header row (exactly [`FeatureRecord::COLUMNS`]) followed by one row per record.
/// The header is written even when `records` is empty.
pub fn write_csv<'a, I, W>(records: I, writer: W) -> Result<(), csv::Error>
where
    I: IntoIterator<Item = &'a FeatureRecord>,
    W: Write,
{
    let mut out = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    out.write_record(FeatureRecord::COLUMNS)?;
    for record in records {
        out.serialize(record)?;
    }
    out.flush()?;
    Ok(())
}

enum Sink<W: Write> {
    Csv(csv::Writer<W>),
    Jsonl(W),
}

/// Incremental writer for serializable rows; CSV headers come from the first row's field names.
pub struct RecordSink<W: Write> {
    sink: Sink<W>,
    written: usize,
}

impl<W: Write> RecordSink<W> {
    pub fn csv(writer: W) -> Self {
        Self {
            sink: Sink::Csv(csv::Writer::from_writer(writer)),
            written: 0,
        }
    }

    pub fn jsonl(writer: W) -> Self {
        Self {
            sink: Sink::Jsonl(writer),
            written: 0,
        }
    }

    pub fn write<T: Serialize>(&mut self, row: &T) -> Result<(), ExportError> {
        match &mut self.sink {
            Sink::Csv(w) => w.serialize(row)?,
            Sink::Jsonl(w) => StructuredLogger::emit_json(row, w)?,
        }
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn finish(self) -> Result<usize, ExportError> {
        match self.sink {
            Sink::Csv(mut w) => w.flush()?,
            Sink::Jsonl(mut w) => w.flush()?,
        }
        Ok(self.written)
    }
}
