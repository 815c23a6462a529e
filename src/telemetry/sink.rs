use chrono::NaiveDateTime;
use parking_lot::Mutex;
use std::{
    fs::{File, OpenOptions},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use super::record::TelemetryRecord;

/// Tag written in front of every telemetry line.
pub const DER_DATA_TAG: &str = "DER_Data";

/// File name of the telemetry log inside the configured log directory.
pub const DER_DATA_FILE: &str = "der_data.log";

/// Append-only destination for telemetry records.
pub trait TelemetrySink: Send {
    fn append(&mut self, at: NaiveDateTime, record: &TelemetryRecord) -> io::Result<()>;
}

/// Tab-separated telemetry appended to `<dir>/der_data.log`.
pub struct FileSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl FileSink {
    pub fn open(dir: &Path) -> io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(DER_DATA_FILE);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TelemetrySink for FileSink {
    fn append(&mut self, at: NaiveDateTime, record: &TelemetryRecord) -> io::Result<()> {
        writeln!(
            self.writer,
            "{}\t{}\t{}",
            at.format("%Y-%m-%d %H:%M:%S"),
            DER_DATA_TAG,
            record
        )?;
        self.writer.flush()
    }
}

/// In-memory sink; clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<(NaiveDateTime, TelemetryRecord)>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(NaiveDateTime, TelemetryRecord)> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl TelemetrySink for MemorySink {
    fn append(&mut self, at: NaiveDateTime, record: &TelemetryRecord) -> io::Result<()> {
        self.records.lock().push((at, record.clone()));
        Ok(())
    }
}
