//! Invocation processing.
//!
//! [`ServerlessSimulation`] handles invocations one at a time in the order they are passed. For
//! each invocation it advances the clock, returns finished containers to the idle state, serves the
//! invocation from an idle container of the same function (warm start) or provisions a new one
//! (cold start), evicting idle containers if memory is short. Invocations that can't get a
//! container even after eviction are dropped and counted as capacity misses.
use std::sync::Arc;

use log::{debug, trace, warn};
use rand::SeedableRng;
use rand_pcg::Pcg64;

use crate::config::{Config, RawConfig};
use crate::container::{Container, ContainerPool};
use crate::error::Error;
use crate::eviction::{ttl_for_capacity, EvictionContext, EvictionPolicy};
use crate::function::FunctionDescriptor;
use crate::stats::Stats;
use crate::telemetry::{EventKind, InvocationRecord, MemorySink, TelemetrySink};
use crate::trace::Trace;

/// Result of a single invocation.
#[derive(Clone, Debug, PartialEq)]
pub enum InvocationOutcome {
    /// Served by an idle container, which runs until `finish`.
    Hit { container: usize, finish: f64 },
    /// Served by a new container, which runs until `finish`.
    Miss {
        container: usize,
        finish: f64,
        evicted: Vec<usize>,
    },
    /// Dropped due to insufficient memory. Evictions made while trying to free memory stand.
    CapacityMiss { evicted: Vec<usize> },
}

impl InvocationOutcome {
    /// Returns the event kind reported to the telemetry sink, if any.
    pub fn event(&self) -> Option<EventKind> {
        match self {
            InvocationOutcome::Hit { .. } => Some(EventKind::Hit),
            InvocationOutcome::Miss { .. } => Some(EventKind::Miss),
            InvocationOutcome::CapacityMiss { .. } => None,
        }
    }
}

pub struct ServerlessSimulation<S: TelemetrySink = MemorySink> {
    config: Config,
    history: Vec<(Arc<FunctionDescriptor>, f64)>,
    pool: ContainerPool,
    rng: Pcg64,
    sink: S,
    stats: Stats,
    ttl: f64,
    wall_time: f64,
}

impl ServerlessSimulation<MemorySink> {
    /// Creates a simulation that keeps invocation records in memory.
    pub fn with_memory_sink(config: Config) -> Self {
        Self::new(config, MemorySink::default())
    }
}

impl<S: TelemetrySink> ServerlessSimulation<S> {
    pub fn new(config: Config, sink: S) -> Self {
        Self {
            history: Vec::new(),
            pool: ContainerPool::new(config.mem_capacity),
            rng: Pcg64::seed_from_u64(config.random_seed),
            sink,
            stats: Default::default(),
            ttl: ttl_for_capacity(config.mem_capacity),
            wall_time: 0.,
            config,
        }
    }

    /// Creates a simulation from a raw config. Fails on unknown eviction policy names.
    pub fn from_raw(raw: RawConfig, sink: S) -> Result<Self, Error> {
        Ok(Self::new(Config::from_raw(raw)?, sink))
    }

    /// Processes an invocation of `function` arriving at `time`.
    ///
    /// Times must be non-decreasing across calls. An `Err` means the internal bookkeeping is broken
    /// and the simulation must not be continued.
    pub fn invoke(&mut self, function: &Arc<FunctionDescriptor>, time: f64) -> Result<InvocationOutcome, Error> {
        if time < self.wall_time {
            warn!(
                "invocation of {} at {} arrived before current time {}",
                function.kind, time, self.wall_time
            );
        }
        self.wall_time = time;
        self.cleanup_finished();

        let idle = self.pool.find_idle(function).map(|c| c.id);
        let (container, event, outcome) = match idle {
            Some(id) => {
                let finish = time + function.warm_time;
                self.pool.start(id, time, finish)?;
                self.stats.on_hit(&function.kind, function.warm_time);
                (id, EventKind::Hit, InvocationOutcome::Hit { container: id, finish })
            }
            None => {
                let (created, evicted) = self.cache_miss(function)?;
                let Some(id) = created else {
                    debug!("capacity miss: {} at {}", function.kind, time);
                    self.stats.on_capacity_miss(&function.kind);
                    self.pool.verify()?;
                    return Ok(InvocationOutcome::CapacityMiss { evicted });
                };
                let processing_time = self.cold_processing_time(function);
                let finish = time + processing_time;
                self.pool.start(id, time, finish)?;
                self.stats.on_miss(&function.kind, processing_time);
                (
                    id,
                    EventKind::Miss,
                    InvocationOutcome::Miss {
                        container: id,
                        finish,
                        evicted,
                    },
                )
            }
        };
        if let Some(c) = self.pool.get_mut(container) {
            c.last_invocation_time = time;
        }
        self.history.push((function.clone(), time));
        self.pool.verify()?;

        let record = InvocationRecord {
            kind: function.kind.clone(),
            time,
            event,
        };
        trace!("{} {:?} on container #{} at {}", record.kind, record.event, container, time);
        self.sink.record(&record)?;
        Ok(outcome)
    }

    /// Feeds all requests of the trace into the simulation and flushes the sink.
    ///
    /// Requests of traces that are not ordered by time are sorted (stably) first.
    pub fn load_trace(&mut self, trace: &dyn Trace) -> Result<(), Error> {
        if trace.is_ordered_by_time() {
            for request in trace.request_iter() {
                self.invoke(&request.function, request.time)?;
            }
        } else {
            let mut requests: Vec<_> = trace.request_iter().collect();
            requests.sort();
            for request in requests.iter() {
                self.invoke(&request.function, request.time)?;
            }
        }
        self.sink.flush()
    }

    /// Total processing time of a cold start of `function`.
    pub fn cold_processing_time(&self, function: &FunctionDescriptor) -> f64 {
        self.config.overhead.cold_processing_time(function)
    }

    /// Returns containers whose invocation has finished by the current time to the idle state.
    /// Returns the number of such containers.
    pub fn cleanup_finished(&mut self) -> usize {
        self.pool.reap(self.wall_time).len()
    }

    /// Returns an idle container hosting exactly `function`, if any.
    pub fn find_container(&self, function: &FunctionDescriptor) -> Option<&Container> {
        self.pool.find_idle(function)
    }

    /// Returns the first pooled container of given kind, running or not.
    pub fn find_container_by_kind(&self, kind: &str) -> Option<&Container> {
        self.pool.find_by_kind(kind)
    }

    /// Returns all pooled containers hosting the same function as container `id`.
    pub fn container_clones(&self, id: usize) -> Vec<&Container> {
        self.pool.clones_of(id)
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.config.policy
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Keep-alive used by the TTL policy.
    pub fn ttl(&self) -> f64 {
        self.ttl
    }

    /// Current simulation time.
    pub fn time(&self) -> f64 {
        self.wall_time
    }

    pub fn pool(&self) -> &ContainerPool {
        &self.pool
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Dispatched invocations in processing order.
    pub fn history(&self) -> &[(Arc<FunctionDescriptor>, f64)] {
        &self.history
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn memory_used(&self) -> u64 {
        self.pool.used_memory()
    }

    pub fn capacity(&self) -> u64 {
        self.pool.capacity()
    }

    /// Provisions a new container, evicting idle ones if needed.
    /// Returns the new container id (`None` on capacity miss) and the evicted ids.
    fn cache_miss(&mut self, function: &Arc<FunctionDescriptor>) -> Result<(Option<usize>, Vec<usize>), Error> {
        let evicted = if self.pool.has_room(function.mem_size) {
            Vec::new()
        } else {
            self.evict(function)?
        };
        match self.pool.insert(function.clone()) {
            Ok(id) => {
                debug!(
                    "container #{} created for {} at {} ({} of {} used)",
                    id,
                    function.kind,
                    self.wall_time,
                    self.pool.used_memory(),
                    self.pool.capacity()
                );
                Ok((Some(id), evicted))
            }
            Err(e) => {
                debug!("can't provision {}: {}", function.kind, e);
                Ok((None, evicted))
            }
        }
    }

    fn evict(&mut self, function: &FunctionDescriptor) -> Result<Vec<usize>, Error> {
        if self.pool.all_running() {
            return Ok(Vec::new());
        }
        let ctx = EvictionContext {
            now: self.wall_time,
            ttl: self.ttl,
            freq: &self.stats.freq,
            overhead: &self.config.overhead,
        };
        let victims =
            self.config
                .policy
                .select_victims(self.pool.available().collect(), &ctx, &mut self.rng, function.mem_size);
        for id in victims.iter() {
            let container = self.pool.remove(*id)?.ok_or(Error::UnknownContainer(*id))?;
            debug!(
                "container #{} of {} evicted by {} at {}",
                id, container.function.kind, self.config.policy, self.wall_time
            );
            self.stats.on_eviction(container.kind());
        }
        Ok(victims)
    }
}
