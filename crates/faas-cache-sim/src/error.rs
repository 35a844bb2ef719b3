//! Error types.
//!
//! Capacity misses and empty eviction rounds are regular simulation outcomes and are not
//! represented here. Everything in [`Error`] aborts the run.

/// A container could not be admitted into the pool.
#[derive(Clone, Copy, Debug, thiserror::Error, PartialEq, Eq)]
#[error("not enough memory for a container of size {needed} ({free} free)")]
pub struct CapacityError {
    pub needed: u64,
    pub free: u64,
}

/// An attempt to remove a running container from the pool.
#[derive(Clone, Copy, Debug, thiserror::Error, PartialEq, Eq)]
#[error("cannot remove running container {0}")]
pub struct BusyError(pub usize);

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("container pool memory {pooled} does not match tracked usage {tracked} (capacity {capacity})")]
    InvariantViolation { pooled: u64, tracked: u64, capacity: u64 },
    #[error(transparent)]
    Busy(#[from] BusyError),
    #[error("container {0} is not in the pool")]
    UnknownContainer(usize),
    #[error("unknown eviction policy: {0}")]
    UnknownPolicy(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}
