//! Cold start cost model.
use serde::{Deserialize, Serialize};

use crate::function::FunctionDescriptor;

fn default_base() -> f64 {
    3000.
}

fn default_pct() -> f64 {
    0.2
}

/// Provider overhead paid by every invocation that runs on a freshly provisioned container.
///
/// Processing time of a cold start is `base + run_time + pct * run_time`. Warm starts run for
/// exactly `warm_time` and pay nothing extra.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProviderOverhead {
    /// Fixed part of the overhead (3 seconds in ms).
    #[serde(default = "default_base")]
    pub base: f64,
    /// Part of the overhead proportional to the function runtime.
    #[serde(default = "default_pct")]
    pub pct: f64,
}

impl Default for ProviderOverhead {
    fn default() -> Self {
        Self {
            base: default_base(),
            pct: default_pct(),
        }
    }
}

impl ProviderOverhead {
    pub fn new(base: f64, pct: f64) -> Self {
        Self { base, pct }
    }

    /// Total processing time of a cold start of given function.
    pub fn cold_processing_time(&self, function: &FunctionDescriptor) -> f64 {
        self.base + function.run_time + self.pct * function.run_time
    }
}
