//! Utilities for running multiple experiments in parallel.
use std::sync::{mpsc::channel, Arc};

use itertools::izip;
use log::error;
use threadpool::ThreadPool;

use crate::config::{Config, RawConfig};
use crate::error::Error;
use crate::simulation::ServerlessSimulation;
use crate::stats::Stats;
use crate::telemetry::NullSink;
use crate::trace::Trace;

/// Runs one simulation per config over the same trace in a thread pool with `n_workers` worker
/// threads. Results are returned in the order of `configs`.
pub fn parallel_simulation_n_workers(
    mut configs: Vec<Config>,
    trace: Arc<dyn Trace + Send + Sync>,
    n_workers: usize,
) -> Result<Vec<Stats>, Error> {
    let pool = ThreadPool::new(n_workers.max(1));
    let (tx, rx) = channel();
    let len = configs.len();
    for (id, config) in izip!(0..len, configs.drain(..)) {
        let tx = tx.clone();
        let trace = trace.clone();
        pool.execute(move || {
            let mut sim = ServerlessSimulation::new(config, NullSink);
            let result = sim.load_trace(trace.as_ref()).map(|_| sim.stats().clone());
            if let Err(e) = tx.send((id, result)) {
                error!("failed to send results of experiment {}: {}", id, e);
            }
        });
    }
    drop(tx);
    let mut results: Vec<_> = rx.iter().take(len).collect();
    if results.len() != len {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("{} of {} experiments did not finish", len - results.len(), len),
        )));
    }
    results.sort_by_key(|x| x.0);
    results.drain(..).map(|x| x.1).collect()
}

/// Runs parallel simulations in a thread pool with a separate worker for each config.
pub fn parallel_simulation(configs: Vec<Config>, trace: Arc<dyn Trace + Send + Sync>) -> Result<Vec<Stats>, Error> {
    let n_workers = configs.len();
    parallel_simulation_n_workers(configs, trace, n_workers)
}

/// Similar to [`parallel_simulation`], but for raw configs. All configs are validated before any
/// simulation starts.
pub fn parallel_simulation_raw(
    configs: Vec<RawConfig>,
    trace: Arc<dyn Trace + Send + Sync>,
) -> Result<Vec<Stats>, Error> {
    let configs = configs
        .into_iter()
        .map(Config::from_raw)
        .collect::<Result<Vec<_>, _>>()?;
    parallel_simulation(configs, trace)
}
