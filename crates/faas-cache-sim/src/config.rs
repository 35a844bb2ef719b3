use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::coldstart::ProviderOverhead;
use crate::error::Error;
use crate::eviction::EvictionPolicy;

fn default_policy() -> String {
    "RAND".to_string()
}

fn default_capacity() -> u64 {
    32000
}

fn default_seed() -> u64 {
    1
}

/// YAML-serializable config
#[derive(Clone, Serialize, Deserialize)]
pub struct RawConfig {
    #[serde(default = "default_policy")]
    pub policy: String,
    #[serde(default = "default_capacity")]
    pub mem_capacity: u64,
    #[serde(default = "default_seed")]
    pub random_seed: u64,
    #[serde(default)]
    pub provider_overhead: ProviderOverhead,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            policy: default_policy(),
            mem_capacity: default_capacity(),
            random_seed: default_seed(),
            provider_overhead: Default::default(),
        }
    }
}

/// This is simulation config. It implements Default trait (see below) so that you can create
/// default config and change only the fields you need.
#[derive(Clone, Debug)]
pub struct Config {
    pub policy: EvictionPolicy,
    /// Total memory available to containers.
    pub mem_capacity: u64,
    /// Seed of the generator used by [`EvictionPolicy::Random`].
    pub random_seed: u64,
    pub overhead: ProviderOverhead,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            policy: EvictionPolicy::Random,
            mem_capacity: default_capacity(),
            random_seed: default_seed(),
            overhead: Default::default(),
        }
    }
}

impl Config {
    pub fn new(policy: EvictionPolicy, mem_capacity: u64) -> Self {
        Self {
            policy,
            mem_capacity,
            ..Default::default()
        }
    }

    /// Validates a raw config. Fails on unknown eviction policy names.
    pub fn from_raw(raw: RawConfig) -> Result<Self, Error> {
        Ok(Self {
            policy: raw.policy.parse()?,
            mem_capacity: raw.mem_capacity,
            random_seed: raw.random_seed,
            overhead: raw.provider_overhead,
        })
    }

    pub fn from_yaml(path: &Path) -> Result<Self, Error> {
        let f = File::open(path)?;
        Self::from_raw(serde_yaml::from_reader(f)?)
    }
}
