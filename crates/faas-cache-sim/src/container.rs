//! Container model and the container pool.
use std::sync::Arc;

use crate::error::{BusyError, CapacityError, Error};
use crate::function::FunctionDescriptor;
use crate::memory::MemoryAccountant;
use crate::running::RunningSet;
use crate::util::{Counter, FxIndexMap};

/// Status of a pooled container. Derived from [`RunningSet`] membership, never stored.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContainerStatus {
    /// Container is executing an invocation.
    Running,
    /// Container is up, but isn't executing anything.
    Idle,
}

/// Container model.
#[derive(Clone, Debug)]
pub struct Container {
    /// Container id.
    pub id: usize,
    /// Function hosted by the container for its whole lifetime.
    pub function: Arc<FunctionDescriptor>,
    /// Start time of the most recent invocation.
    pub last_invocation_time: f64,
}

impl Container {
    pub fn kind(&self) -> &str {
        &self.function.kind
    }

    pub fn mem_size(&self) -> u64 {
        self.function.mem_size
    }
}

/// Set of provisioned containers together with their memory accounting.
pub struct ContainerPool {
    memory: MemoryAccountant,
    /// Pooled containers by id, in admission order.
    containers: FxIndexMap<usize, Container>,
    running: RunningSet,
    container_counter: Counter,
}

impl ContainerPool {
    /// Creates an empty pool with given memory capacity.
    pub fn new(capacity: u64) -> Self {
        Self {
            memory: MemoryAccountant::new(capacity),
            containers: FxIndexMap::default(),
            running: RunningSet::default(),
            container_counter: Counter::default(),
        }
    }

    /// Checks whether a container of given size fits without eviction.
    pub fn has_room(&self, size: u64) -> bool {
        self.memory.has_room(size)
    }

    /// Returns the first idle container hosting exactly `function`.
    pub fn find_idle(&self, function: &FunctionDescriptor) -> Option<&Container> {
        self.containers
            .values()
            .find(|c| *c.function == *function && !self.running.contains(c.id))
    }

    /// Returns the first pooled container of given kind, running or not.
    pub fn find_by_kind(&self, kind: &str) -> Option<&Container> {
        self.containers.values().find(|c| c.kind() == kind)
    }

    /// Admits a new container for `function` and returns its id.
    pub fn insert(&mut self, function: Arc<FunctionDescriptor>) -> Result<usize, CapacityError> {
        let size = function.mem_size;
        if !self.memory.has_room(size) {
            return Err(CapacityError {
                needed: size,
                free: self.memory.free(),
            });
        }
        let id = self.container_counter.increment();
        self.memory.admit(size);
        self.containers.insert(
            id,
            Container {
                id,
                function,
                last_invocation_time: 0.,
            },
        );
        Ok(id)
    }

    /// Removes an idle container and releases its memory. Returns `Ok(None)` if it isn't pooled.
    pub fn remove(&mut self, id: usize) -> Result<Option<Container>, BusyError> {
        if self.running.contains(id) {
            return Err(BusyError(id));
        }
        let container = self.containers.shift_remove(&id);
        if let Some(c) = container.as_ref() {
            self.memory.release(c.mem_size());
        }
        Ok(container)
    }

    /// Returns all pooled containers hosting the same function as container `id`.
    pub fn clones_of(&self, id: usize) -> Vec<&Container> {
        match self.containers.get(&id) {
            Some(c) => self
                .containers
                .values()
                .filter(|x| *x.function == *c.function)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Iterates over pooled containers that are not running, in admission order.
    pub fn available(&self) -> impl Iterator<Item = &Container> + '_ {
        self.containers.values().filter(|c| !self.running.contains(c.id))
    }

    /// Returns true if no pooled container can be evicted right now.
    pub fn all_running(&self) -> bool {
        self.running.len() == self.containers.len()
    }

    /// Marks a pooled container as running on `[start, finish)`.
    pub fn start(&mut self, id: usize, start: f64, finish: f64) -> Result<(), Error> {
        if !self.containers.contains_key(&id) {
            return Err(Error::UnknownContainer(id));
        }
        self.running.start(id, start, finish);
        Ok(())
    }

    /// Returns containers that finished by `now` to the idle state.
    pub fn reap(&mut self, now: f64) -> Vec<usize> {
        self.running.reap(now)
    }

    /// Checks that tracked memory usage matches the pooled containers.
    pub fn verify(&self) -> Result<(), Error> {
        self.memory.verify(self.containers.values().map(|c| c.mem_size()))
    }

    pub fn status(&self, id: usize) -> Option<ContainerStatus> {
        if !self.containers.contains_key(&id) {
            return None;
        }
        if self.running.contains(id) {
            Some(ContainerStatus::Running)
        } else {
            Some(ContainerStatus::Idle)
        }
    }

    pub fn get(&self, id: usize) -> Option<&Container> {
        self.containers.get(&id)
    }

    pub fn get_mut(&mut self, id: usize) -> Option<&mut Container> {
        self.containers.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Container> + '_ {
        self.containers.values()
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    pub fn running(&self) -> &RunningSet {
        &self.running
    }

    pub fn used_memory(&self) -> u64 {
        self.memory.used()
    }

    pub fn capacity(&self) -> u64 {
        self.memory.capacity()
    }

    /// Returns the number of containers ever admitted.
    pub fn total_created(&self) -> usize {
        self.container_counter.curr()
    }
}
