//! Eviction policies.
//!
//! Every policy picks victims among *available* containers, i.e. pooled containers that are not
//! running. Except for [`EvictionPolicy::Random`], policies rank the eligible candidates by a
//! per-policy key with a stable sort (ties keep pool order) and greedily take them until enough
//! memory is freed or the candidates run out.
use std::fmt;
use std::str::FromStr;

use rand::Rng;

use crate::coldstart::ProviderOverhead;
use crate::container::Container;
use crate::error::Error;
use crate::util::FxIndexMap;

/// Minimum keep-alive of the TTL policy, 6 minutes in ms.
pub const MIN_TTL: u64 = 6 * 60 * 1000;

/// Keep-alive used by [`EvictionPolicy::Ttl`]: one minute per 400 units of memory, at least
/// [`MIN_TTL`].
pub fn ttl_for_capacity(capacity: u64) -> f64 {
    u64::max((capacity / 400) * 60 * 1000, MIN_TTL) as f64
}

/// Engine state visible to the policies.
pub struct EvictionContext<'a> {
    /// Current simulation time.
    pub now: f64,
    /// Keep-alive of the TTL policy.
    pub ttl: f64,
    /// Invocation counts by function kind.
    pub freq: &'a FxIndexMap<String, u64>,
    pub overhead: &'a ProviderOverhead,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum EvictionPolicy {
    /// Uniformly random victims (`RAND`).
    Random,
    /// Expired containers only, oldest first (`CLOUD21`).
    Ttl,
    /// Least recently used first (`LRU`).
    Lru,
    /// Least frequently invoked function first (`LFU`).
    Lfu,
    /// Smallest warm/cold runtime ratio first (`RUNTIME_DIFF`).
    RuntimeDiff,
    /// Largest cold start processing time first (`COLD_COST`).
    ColdCost,
}

enum Order {
    Ascending,
    Descending,
}

impl EvictionPolicy {
    pub const ALL: [EvictionPolicy; 6] = [
        EvictionPolicy::Random,
        EvictionPolicy::Ttl,
        EvictionPolicy::Lru,
        EvictionPolicy::Lfu,
        EvictionPolicy::RuntimeDiff,
        EvictionPolicy::ColdCost,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EvictionPolicy::Random => "RAND",
            EvictionPolicy::Ttl => "CLOUD21",
            EvictionPolicy::Lru => "LRU",
            EvictionPolicy::Lfu => "LFU",
            EvictionPolicy::RuntimeDiff => "RUNTIME_DIFF",
            EvictionPolicy::ColdCost => "COLD_COST",
        }
    }

    /// Chooses containers to evict in order to free `to_free` units of memory.
    ///
    /// `candidates` must contain only available containers in pool order. May free less than
    /// requested if there are not enough eligible candidates.
    pub fn select_victims<R: Rng + ?Sized>(
        &self,
        candidates: Vec<&Container>,
        ctx: &EvictionContext,
        rng: &mut R,
        to_free: u64,
    ) -> Vec<usize> {
        match self {
            EvictionPolicy::Random => random_victims(candidates, rng, to_free),
            EvictionPolicy::Ttl => {
                let expired = candidates
                    .into_iter()
                    .filter(|c| c.last_invocation_time + ctx.ttl < ctx.now)
                    .map(|c| (c, c.last_invocation_time))
                    .collect();
                ranked_victims(expired, Order::Ascending, to_free)
            }
            EvictionPolicy::Lru => ranked_victims(
                candidates
                    .into_iter()
                    .filter(|c| invoked(c, ctx))
                    .map(|c| (c, c.last_invocation_time))
                    .collect(),
                Order::Ascending,
                to_free,
            ),
            EvictionPolicy::Lfu => ranked_victims(
                candidates
                    .into_iter()
                    .filter(|c| invoked(c, ctx))
                    .map(|c| (c, ctx.freq[c.kind()] as f64))
                    .collect(),
                Order::Ascending,
                to_free,
            ),
            EvictionPolicy::RuntimeDiff => ranked_victims(
                candidates
                    .into_iter()
                    .filter(|c| invoked(c, ctx))
                    .map(|c| {
                        let run_time = if c.function.run_time == 0. {
                            1.
                        } else {
                            c.function.run_time
                        };
                        (c, c.function.warm_time / run_time)
                    })
                    .collect(),
                Order::Ascending,
                to_free,
            ),
            EvictionPolicy::ColdCost => ranked_victims(
                candidates
                    .into_iter()
                    .filter(|c| invoked(c, ctx))
                    .map(|c| (c, ctx.overhead.cold_processing_time(&c.function)))
                    .collect(),
                Order::Descending,
                to_free,
            ),
        }
    }
}

impl FromStr for EvictionPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EvictionPolicy::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| Error::UnknownPolicy(s.to_string()))
    }
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// Containers of kinds that were never invoked are skipped. Containers are only created by
// invocations, so under normal operation this filters nothing.
fn invoked(c: &Container, ctx: &EvictionContext) -> bool {
    ctx.freq.contains_key(c.kind())
}

fn random_victims<R: Rng + ?Sized>(mut available: Vec<&Container>, rng: &mut R, to_free: u64) -> Vec<usize> {
    let mut remaining = to_free;
    let mut victims = Vec::new();
    while remaining > 0 && !available.is_empty() {
        let victim = available.swap_remove(rng.gen_range(0..available.len()));
        remaining = remaining.saturating_sub(victim.mem_size());
        victims.push(victim.id);
    }
    victims
}

fn ranked_victims(mut ranked: Vec<(&Container, f64)>, order: Order, to_free: u64) -> Vec<usize> {
    match order {
        Order::Ascending => ranked.sort_by(|a, b| a.1.total_cmp(&b.1)),
        Order::Descending => ranked.sort_by(|a, b| b.1.total_cmp(&a.1)),
    }
    let mut remaining = to_free;
    let mut victims = Vec::new();
    for (c, _) in ranked {
        if remaining == 0 {
            break;
        }
        remaining = remaining.saturating_sub(c.mem_size());
        victims.push(c.id);
    }
    victims
}
