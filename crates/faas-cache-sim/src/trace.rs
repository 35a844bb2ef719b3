use std::cmp::Ordering;
use std::sync::Arc;

use crate::function::FunctionDescriptor;

/// A single invocation of a function at a given time.
#[derive(Clone, Debug)]
pub struct RequestData {
    pub function: Arc<FunctionDescriptor>,
    pub time: f64,
}

impl PartialEq for RequestData {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time
    }
}

impl Eq for RequestData {}

impl PartialOrd for RequestData {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RequestData {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time.total_cmp(&other.time)
    }
}

/// Source of invocations fed into [`crate::simulation::ServerlessSimulation`].
pub trait Trace {
    fn function_iter(&self) -> Box<dyn Iterator<Item = Arc<FunctionDescriptor>> + '_>;
    fn request_iter(&self) -> Box<dyn Iterator<Item = RequestData> + '_>;
    /// Indicates whether the requests produced by `request_iter` are ordered in non-decreasing
    /// order by time.
    fn is_ordered_by_time(&self) -> bool;

    fn function_count(&self) -> usize {
        self.function_iter().count()
    }
}
