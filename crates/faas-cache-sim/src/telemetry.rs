//! Invocation records and the sinks that collect them.
//!
//! The CSV performance log uses the header `lambda,time,meta`, one row per dispatched invocation,
//! with `meta` equal to `hit` or `miss`. Dropped invocations are not logged.
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::stats::HitMissCount;
use crate::util::FxIndexMap;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Hit,
    Miss,
}

/// One dispatched invocation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InvocationRecord {
    #[serde(rename = "lambda")]
    pub kind: String,
    pub time: f64,
    #[serde(rename = "meta")]
    pub event: EventKind,
}

/// Receives a record for every dispatched invocation.
pub trait TelemetrySink {
    fn record(&mut self, record: &InvocationRecord) -> Result<(), Error>;

    /// Flushes buffered records, if any.
    fn flush(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

/// Keeps all records in memory.
#[derive(Default)]
pub struct MemorySink {
    pub records: Vec<InvocationRecord>,
}

impl TelemetrySink for MemorySink {
    fn record(&mut self, record: &InvocationRecord) -> Result<(), Error> {
        self.records.push(record.clone());
        Ok(())
    }
}

/// Discards all records.
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn record(&mut self, _record: &InvocationRecord) -> Result<(), Error> {
        Ok(())
    }
}

/// Writes records as CSV.
pub struct PerfLog<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> PerfLog<W> {
    /// Creates a log and writes its header right away, so a log without records is still valid.
    pub fn new(inner: W) -> Result<Self, Error> {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(inner);
        writer.write_record(["lambda", "time", "meta"])?;
        Ok(Self { writer })
    }

    /// Flushes the log and returns the underlying writer.
    pub fn into_inner(self) -> Result<W, Error> {
        self.writer
            .into_inner()
            .map_err(|e| Error::Io(io::Error::new(e.error().kind(), e.error().to_string())))
    }
}

impl PerfLog<File> {
    pub fn create(path: &Path) -> Result<Self, Error> {
        Self::new(File::create(path)?)
    }
}

impl<W: Write> TelemetrySink for PerfLog<W> {
    fn record(&mut self, record: &InvocationRecord) -> Result<(), Error> {
        self.writer.serialize(record)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Error> {
        self.writer.flush()?;
        Ok(())
    }
}

/// File name of the performance log of one experiment.
pub fn perf_log_file_name(policy: &str, num_funcs: usize, capacity: u64, run: &str) -> String {
    format!("{}-{}-{}-{}-performancelog.csv", policy, num_funcs, capacity, run)
}

/// Counts hits and misses per function kind.
pub fn summarize<'a, I>(records: I) -> FxIndexMap<String, HitMissCount>
where
    I: IntoIterator<Item = &'a InvocationRecord>,
{
    let mut summary: FxIndexMap<String, HitMissCount> = FxIndexMap::default();
    for record in records {
        let entry = summary.entry(record.kind.clone()).or_default();
        match record.event {
            EventKind::Hit => entry.hits += 1,
            EventKind::Miss => entry.misses += 1,
        }
    }
    summary
}

/// Reads a performance log written by [`PerfLog`] and counts hits and misses per function kind.
pub fn summarize_perf_log(path: &Path) -> Result<FxIndexMap<String, HitMissCount>, Error> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for rec in reader.deserialize() {
        let record: InvocationRecord = rec?;
        records.push(record);
    }
    Ok(summarize(records.iter()))
}
