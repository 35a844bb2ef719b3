//! Various utility structs.
use std::hash::BuildHasherDefault;

use indexmap::IndexMap;
use rustc_hash::FxHasher;

/// A simple incrementing counter.
#[derive(Default)]
pub struct Counter {
    value: usize,
}

impl Counter {
    /// Returns current counter value.
    pub fn curr(&self) -> usize {
        self.value
    }

    /// Post-increments the counter.
    pub fn increment(&mut self) -> usize {
        let curr = self.value;
        self.value += 1;
        curr
    }
}

/// IndexMap with faster hash function.
pub type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;

/// Increments a per-kind counter, starting from zero for unseen kinds.
pub fn bump(map: &mut FxIndexMap<String, u64>, kind: &str) {
    if let Some(x) = map.get_mut(kind) {
        *x += 1;
    } else {
        map.insert(kind.to_string(), 1);
    }
}
