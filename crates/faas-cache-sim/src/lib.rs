//! A library for studying container caching and eviction in FaaS platforms.
//!
//! The simulator replays a trace of function invocations against a memory-limited pool of
//! containers. Each invocation is either a warm start on an idle container of the same function or
//! a cold start on a freshly provisioned one; when memory runs out, one of the
//! [eviction policies][crate::eviction::EvictionPolicy] chooses idle containers to destroy.
//!
//! The entry point is [`simulation::ServerlessSimulation`]. See also
//! [`parallel::parallel_simulation`] for comparing several policies on one trace.

pub mod coldstart;
pub mod config;
pub mod container;
pub mod error;
pub mod eviction;
pub mod extra;
pub mod function;
pub mod memory;
pub mod parallel;
pub mod running;
pub mod simulation;
pub mod stats;
pub mod telemetry;
pub mod trace;
pub mod util;
