#![allow(dead_code)]
use std::sync::Arc;

use faas_cache_sim::function::FunctionDescriptor;

pub fn assert_float_eq(x: f64, y: f64, eps: f64) {
    assert!(x > y - eps && x < y + eps, "{} != {}", x, y);
}

pub fn function(kind: &str, mem_size: u64, run_time: f64, warm_time: f64) -> Arc<FunctionDescriptor> {
    Arc::new(FunctionDescriptor::new(kind, mem_size, run_time, warm_time))
}
