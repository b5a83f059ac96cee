//! Streaming JSONL sink for validated compositions.
//!
//! Results are appended one self-contained JSON record per line as they
//! arrive, so peak memory stays bounded by the in-flight batch rather than
//! the total result count. A run owns a fresh file (truncate on create);
//! each write is a complete, newline-terminated record, so an interrupted
//! run leaves a well-formed prefix behind.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// One output record: sorted champion names and the activated tier of every
/// activated synergy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionRecord {
    pub champions: Vec<String>,
    pub synergies: BTreeMap<String, u32>,
}

/// Destination for validated composition records.
///
/// The search runners write through this trait so tests can collect records
/// in memory while production runs stream to disk.
pub trait RecordWriter {
    fn write_record(&mut self, record: CompositionRecord) -> Result<()>;
}

impl RecordWriter for Vec<CompositionRecord> {
    fn write_record(&mut self, record: CompositionRecord) -> Result<()> {
        self.push(record);
        Ok(())
    }
}

/// Disk-backed JSONL sink, one record per line.
pub struct CompositionSink {
    path: PathBuf,
    writer: BufWriter<std::fs::File>,
    written: u64,
}

impl CompositionSink {
    /// Create the sink, truncating any previous run's output at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;
        Ok(CompositionSink {
            path,
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    /// Path of the output file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flush buffered records to disk.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flush and close, returning the total record count.
    pub fn finish(mut self) -> Result<u64> {
        self.writer.flush()?;
        Ok(self.written)
    }
}

impl RecordWriter for CompositionSink {
    fn write_record(&mut self, record: CompositionRecord) -> Result<()> {
        serde_json::to_writer(&mut self.writer, &record)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }
}
