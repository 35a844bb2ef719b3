//! Function descriptors and the registry that interns them.
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Identity and resource/timing profile of a function.
///
/// Descriptors are immutable and shared between the trace, the containers hosting them and the
/// invocation history. Two descriptors are interchangeable for warm starts only if all fields
/// match, not just `kind`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionDescriptor {
    /// Opaque function identifier.
    pub kind: String,
    /// Memory footprint of a container hosting this function.
    pub mem_size: u64,
    /// Execution time on a freshly provisioned container.
    pub run_time: f64,
    /// Execution time on a warm container.
    pub warm_time: f64,
}

impl FunctionDescriptor {
    pub fn new(kind: impl Into<String>, mem_size: u64, run_time: f64, warm_time: f64) -> Self {
        Self {
            kind: kind.into(),
            mem_size,
            run_time,
            warm_time,
        }
    }
}

/// Stores every distinct descriptor seen by a trace.
#[derive(Default)]
pub struct FunctionRegistry {
    functions: Vec<Arc<FunctionDescriptor>>,
}

impl FunctionRegistry {
    pub fn get(&self, id: usize) -> Option<&Arc<FunctionDescriptor>> {
        self.functions.get(id)
    }

    /// Returns the first registered descriptor with the given kind.
    pub fn find_by_kind(&self, kind: &str) -> Option<&Arc<FunctionDescriptor>> {
        self.functions.iter().find(|f| f.kind == kind)
    }

    /// Registers a descriptor and returns its id. Equal descriptors share one id.
    pub fn register(&mut self, f: FunctionDescriptor) -> usize {
        if let Some(id) = self.functions.iter().position(|x| **x == f) {
            return id;
        }
        let id = self.functions.len();
        self.functions.push(Arc::new(f));
        id
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arc<FunctionDescriptor>> {
        self.functions.iter()
    }
}
