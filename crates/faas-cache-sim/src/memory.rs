//! Memory model.
//!
//! Memory is the only resource the cache simulator tracks. Every pooled container holds
//! `mem_size` units for its whole lifetime, whether it is running or idle.
use crate::error::Error;

/// Tracks memory capacity and usage of the container pool.
#[derive(Clone, Debug)]
pub struct MemoryAccountant {
    capacity: u64,
    used: u64,
}

impl MemoryAccountant {
    /// Creates new accountant with nothing allocated.
    pub fn new(capacity: u64) -> Self {
        Self { capacity, used: 0 }
    }

    /// Checks whether it is possible to allocate given amount of memory.
    pub fn has_room(&self, size: u64) -> bool {
        self.used.checked_add(size).map_or(false, |x| x <= self.capacity)
    }

    /// Allocates free memory. Callers must check [`Self::has_room`] first.
    pub fn admit(&mut self, size: u64) {
        debug_assert!(self.has_room(size));
        self.used += size;
    }

    /// Releases allocated memory.
    pub fn release(&mut self, size: u64) {
        debug_assert!(size <= self.used);
        self.used -= size;
    }

    /// Compares tracked usage against the sizes of the pooled containers.
    ///
    /// A total that doesn't fit into `u64` is reported as `u64::MAX`.
    pub fn verify<I: IntoIterator<Item = u64>>(&self, sizes: I) -> Result<(), Error> {
        let total = sizes.into_iter().try_fold(0u64, |acc, x| acc.checked_add(x));
        let pooled = total.unwrap_or(u64::MAX);
        if total.is_none() || pooled != self.used || pooled > self.capacity {
            return Err(Error::InvariantViolation {
                pooled,
                tracked: self.used,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    /// Returns the amount of unallocated memory.
    pub fn free(&self) -> u64 {
        self.capacity - self.used
    }
}
