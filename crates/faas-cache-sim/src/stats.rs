use std::ops::AddAssign;

use num::{ToPrimitive, Zero};
use serde::Serialize;

use crate::util::{bump, FxIndexMap};

#[derive(Clone, Default)]
pub struct SampleMetric<T = f64> {
    data: Vec<T>,
}

impl<T> SampleMetric<T> {
    pub fn add(&mut self, x: T) {
        self.data.push(x);
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<T> SampleMetric<T>
where
    T: AddAssign + Copy + Zero,
{
    pub fn sum(&self) -> T {
        let mut s = T::zero();
        for x in self.data.iter().copied() {
            s += x;
        }
        s
    }
}

impl<T> SampleMetric<T>
where
    T: AddAssign + Copy + Zero + ToPrimitive,
{
    pub fn mean(&self) -> f64 {
        self.sum().to_f64().unwrap_or(f64::NAN) / (self.data.len() as f64)
    }
}

impl SampleMetric<f64> {
    pub fn min(&self) -> Option<f64> {
        self.data.iter().copied().reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.data.iter().copied().reduce(f64::max)
    }

    /// Returns the `q`-quantile with linear interpolation, `q` in `[0, 1]`. NaN for an empty sample.
    pub fn quantile(&self, q: f64) -> f64 {
        if self.data.is_empty() {
            return f64::NAN;
        }
        let mut data = self.data.clone();
        let pos = (data.len() - 1) as f64 * q;
        let lo = pos.floor() as usize;
        let hi = pos.ceil() as usize;
        let lo_val = *order_stat::kth_by(&mut data, lo, |a, b| a.total_cmp(b));
        if hi == lo {
            return lo_val;
        }
        let hi_val = *order_stat::kth_by(&mut data, hi, |a, b| a.total_cmp(b));
        lo_val + (hi_val - lo_val) * (pos - lo as f64)
    }
}

/// Number of warm and cold starts of one function kind.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct HitMissCount {
    pub hits: u64,
    pub misses: u64,
}

/// Counters collected by the simulation.
#[derive(Clone, Default, Serialize)]
pub struct Stats {
    /// Dispatched invocations by function kind.
    pub freq: FxIndexMap<String, u64>,
    /// Evicted containers by function kind.
    pub evictions: FxIndexMap<String, u64>,
    /// Dropped invocations by function kind.
    pub capacity_misses: FxIndexMap<String, u64>,
    pub hits: u64,
    pub misses: u64,
    /// Processing times of warm starts.
    #[serde(skip)]
    pub warm_processing_time: SampleMetric,
    /// Processing times of cold starts.
    #[serde(skip)]
    pub cold_processing_time: SampleMetric,
}

impl Stats {
    pub fn on_hit(&mut self, kind: &str, processing_time: f64) {
        self.hits += 1;
        self.warm_processing_time.add(processing_time);
        bump(&mut self.freq, kind);
    }

    pub fn on_miss(&mut self, kind: &str, processing_time: f64) {
        self.misses += 1;
        self.cold_processing_time.add(processing_time);
        bump(&mut self.freq, kind);
    }

    pub fn on_capacity_miss(&mut self, kind: &str) {
        bump(&mut self.capacity_misses, kind);
    }

    pub fn on_eviction(&mut self, kind: &str) {
        bump(&mut self.evictions, kind);
    }

    /// Total number of dispatched invocations.
    pub fn invocations(&self) -> u64 {
        self.hits + self.misses
    }

    pub fn total_capacity_misses(&self) -> u64 {
        self.capacity_misses.values().sum()
    }

    pub fn total_evictions(&self) -> u64 {
        self.evictions.values().sum()
    }

    /// Share of dispatched invocations that needed a new container.
    pub fn cold_start_rate(&self) -> f64 {
        (self.misses as f64) / (self.invocations() as f64)
    }
}
