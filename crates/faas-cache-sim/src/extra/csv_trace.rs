//! Reader of invocation traces stored as CSV.
//!
//! Expected header: `kind,mem_size,run_time,warm_time,time`. Each row is one invocation; rows
//! with the same descriptor fields share one [`FunctionDescriptor`].
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use log::info;
use serde::Deserialize;

use crate::error::Error;
use crate::function::{FunctionDescriptor, FunctionRegistry};
use crate::trace::{RequestData, Trace};

#[derive(Deserialize)]
struct TraceRow {
    kind: String,
    mem_size: u64,
    run_time: f64,
    warm_time: f64,
    time: f64,
}

/// Trace loaded from a CSV file.
#[derive(Default)]
pub struct CsvTrace {
    registry: FunctionRegistry,
    /// (function id, time)
    requests: Vec<(usize, f64)>,
    ordered: bool,
}

impl CsvTrace {
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let trace = Self::from_csv(csv::Reader::from_path(path)?)?;
        info!(
            "Read {} invocations of {} functions from {}",
            trace.requests.len(),
            trace.registry.len(),
            path.display()
        );
        Ok(trace)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, Error> {
        Self::from_csv(csv::Reader::from_reader(reader))
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Self, Error> {
        let mut trace = Self {
            ordered: true,
            ..Default::default()
        };
        let mut last_time = f64::NEG_INFINITY;
        for rec in reader.deserialize() {
            let row: TraceRow = rec?;
            let id = trace.registry.register(FunctionDescriptor::new(
                row.kind,
                row.mem_size,
                row.run_time,
                row.warm_time,
            ));
            if row.time < last_time {
                trace.ordered = false;
            }
            last_time = row.time;
            trace.requests.push((id, row.time));
        }
        Ok(trace)
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

impl Trace for CsvTrace {
    fn function_iter(&self) -> Box<dyn Iterator<Item = Arc<FunctionDescriptor>> + '_> {
        Box::new(self.registry.iter().cloned())
    }

    fn request_iter(&self) -> Box<dyn Iterator<Item = RequestData> + '_> {
        Box::new(self.requests.iter().filter_map(|(id, time)| {
            self.registry.get(*id).map(|f| RequestData {
                function: f.clone(),
                time: *time,
            })
        }))
    }

    fn is_ordered_by_time(&self) -> bool {
        self.ordered
    }

    fn function_count(&self) -> usize {
        self.registry.len()
    }
}
