//! Synthetic trace generator.
use std::boxed::Box;
use std::sync::Arc;

use rand::prelude::*;
use rand_distr::{Exp, Uniform};
use rand_pcg::Pcg64;

use crate::function::FunctionDescriptor;
use crate::trace::{RequestData, Trace};

/// Type erased version of rand::Distribution trait.
pub trait ErasedDistribution<T> {
    /// Generate a random value of T, using rng as the source of randomness.
    fn sample(&self, rng: &mut dyn rand::RngCore) -> T;
}

impl<T, D: Distribution<T> + ?Sized> ErasedDistribution<T> for D {
    fn sample(&self, rng: &mut dyn rand::RngCore) -> T {
        <Self as Distribution<T>>::sample(self, rng)
    }
}

/// Generator of invocation arrival times.
pub enum ArrivalGenerator {
    /// Random inter-arrival times.
    Random(Box<dyn ErasedDistribution<f64> + Send + Sync>),
    /// Generates equally spaced arrival times with given interval between consecutive arrivals.
    EquallySpaced(f64),
    /// Explicitly given arrivals.
    Fixed(Vec<f64>),
}

/// Generator of a function runtime.
pub enum DurationGenerator {
    /// Random duration.
    Random(Box<dyn ErasedDistribution<f64> + Send + Sync>),
    /// Fixed duration.
    Fixed(f64),
}

/// Generator of container memory requirements.
pub enum MemoryGenerator {
    /// Random requirement.
    Random(Box<dyn ErasedDistribution<u64> + Send + Sync>),
    /// Fixed requirement.
    Fixed(u64),
}

/// Function generation settings.
pub struct SyntheticTraceFunctionConfig {
    /// Time interval that will contain all arrival times.
    pub activity_window: (f64, f64),
    /// Arrival times generator.
    pub arrival_generator: ArrivalGenerator,
    /// Cold execution time generator.
    pub run_time_generator: DurationGenerator,
    /// Warm execution time as a fraction of the cold one.
    pub warm_fraction: f64,
    /// Container memory requirement generator.
    pub memory_generator: MemoryGenerator,
}

/// Synthetic trace generation settings.
pub struct SyntheticTraceConfig {
    /// Function generator configs.
    pub functions: Vec<SyntheticTraceFunctionConfig>,
    /// Random generator seed.
    pub random_seed: u64,
}

impl SyntheticTraceConfig {
    /// Builds a config of `num_functions` functions active during `[0, duration]`.
    ///
    /// Each function gets Poisson arrivals with a mean inter-arrival time between 1 and 60 seconds,
    /// a memory requirement between 128 and 1024, a cold runtime between 0.1 and 10 seconds and a
    /// warm runtime of 5-50% of the cold one. Times are in ms.
    pub fn random_functions(num_functions: usize, duration: f64, random_seed: u64) -> Self {
        let mut gen = Pcg64::seed_from_u64(random_seed);
        let functions = (0..num_functions)
            .map(|_| {
                let mean_iat: f64 = gen.gen_range(1000.0..60000.0);
                let arrival_generator = match Exp::new(1. / mean_iat) {
                    Ok(dist) => ArrivalGenerator::Random(Box::new(dist)),
                    Err(_) => ArrivalGenerator::EquallySpaced(mean_iat),
                };
                SyntheticTraceFunctionConfig {
                    activity_window: (gen.gen_range(0.0..mean_iat), duration),
                    arrival_generator,
                    run_time_generator: DurationGenerator::Random(Box::new(Uniform::new(100.0, 10000.0))),
                    warm_fraction: gen.gen_range(0.05..0.5),
                    memory_generator: MemoryGenerator::Random(Box::new(Uniform::new_inclusive(128u64, 1024u64))),
                }
            })
            .collect();
        Self {
            functions,
            random_seed: gen.gen(),
        }
    }
}

/// Synthetically generated trace.
#[derive(Clone, Default)]
pub struct SyntheticTrace {
    functions: Vec<Arc<FunctionDescriptor>>,
    requests: Vec<RequestData>,
}

impl SyntheticTrace {
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

impl Trace for SyntheticTrace {
    fn function_iter(&self) -> Box<dyn Iterator<Item = Arc<FunctionDescriptor>> + '_> {
        Box::new(self.functions.iter().cloned())
    }

    fn request_iter(&self) -> Box<dyn Iterator<Item = RequestData> + '_> {
        Box::new(self.requests.iter().cloned())
    }

    fn is_ordered_by_time(&self) -> bool {
        true
    }

    fn function_count(&self) -> usize {
        self.functions.len()
    }
}

/// Generates synthetic trace. Function `i` gets kind `"f{i}"`.
pub fn generate_synthetic_trace(mut config: SyntheticTraceConfig) -> SyntheticTrace {
    let mut gen = Pcg64::seed_from_u64(config.random_seed);
    let mut trace: SyntheticTrace = Default::default();
    for (id, func_config) in config.functions.drain(..).enumerate() {
        let mem = match func_config.memory_generator {
            MemoryGenerator::Random(dist) => dist.sample(&mut gen),
            MemoryGenerator::Fixed(val) => val,
        };
        let run_time = match func_config.run_time_generator {
            DurationGenerator::Random(dist) => dist.sample(&mut gen),
            DurationGenerator::Fixed(val) => val,
        };
        let function = Arc::new(FunctionDescriptor::new(
            format!("f{}", id),
            mem,
            run_time,
            run_time * func_config.warm_fraction,
        ));
        trace.functions.push(function.clone());
        let (win_l, win_r) = func_config.activity_window;
        let mut arrivals = Vec::new();
        match func_config.arrival_generator {
            ArrivalGenerator::Random(dist) => {
                let mut t = win_l;
                while t < win_r + 1e-9 {
                    arrivals.push(t);
                    t += dist.sample(&mut gen);
                }
            }
            ArrivalGenerator::EquallySpaced(step) => {
                let mut t = win_l;
                while t < win_r + 1e-9 {
                    arrivals.push(t);
                    t += step;
                }
            }
            ArrivalGenerator::Fixed(vec) => {
                arrivals = vec;
            }
        }
        for time in arrivals {
            trace.requests.push(RequestData {
                function: function.clone(),
                time,
            });
        }
    }
    trace.requests.sort_by(|x, y| x.time.total_cmp(&y.time));
    trace
}
