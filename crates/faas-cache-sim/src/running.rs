//! Tracking of containers that are executing an invocation.
use crate::util::FxIndexMap;

/// Maps container ids to their `[start, finish)` execution intervals.
///
/// A pooled container is available for eviction iff it is absent from this set.
#[derive(Default)]
pub struct RunningSet {
    intervals: FxIndexMap<usize, (f64, f64)>,
}

impl RunningSet {
    /// Marks a container as running on `[start, finish)`.
    pub fn start(&mut self, id: usize, start: f64, finish: f64) {
        self.intervals.insert(id, (start, finish));
    }

    pub fn contains(&self, id: usize) -> bool {
        self.intervals.contains_key(&id)
    }

    /// Returns the execution interval of a running container.
    pub fn interval(&self, id: usize) -> Option<(f64, f64)> {
        self.intervals.get(&id).copied()
    }

    /// Removes every container that has finished by `now` and returns their ids.
    pub fn reap(&mut self, now: f64) -> Vec<usize> {
        let finished: Vec<usize> = self
            .intervals
            .iter()
            .filter(|(_, (_, finish))| *finish <= now)
            .map(|(id, _)| *id)
            .collect();
        if !finished.is_empty() {
            self.intervals.retain(|_, (_, finish)| *finish > now);
        }
        finished
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Iterates over `(container id, (start, finish))` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, (f64, f64))> + '_ {
        self.intervals.iter().map(|(id, interval)| (*id, *interval))
    }
}
