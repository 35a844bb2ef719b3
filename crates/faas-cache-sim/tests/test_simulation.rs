mod common;
use common::{assert_float_eq, function};

use rstest::rstest;

use faas_cache_sim::coldstart::ProviderOverhead;
use faas_cache_sim::config::{Config, RawConfig};
use faas_cache_sim::container::ContainerStatus;
use faas_cache_sim::eviction::EvictionPolicy;
use faas_cache_sim::extra::synthetic_trace::{generate_synthetic_trace, SyntheticTraceConfig};
use faas_cache_sim::simulation::{InvocationOutcome, ServerlessSimulation};
use faas_cache_sim::telemetry::{EventKind, NullSink};
use faas_cache_sim::trace::Trace;

fn simulation(policy: EvictionPolicy, capacity: u64) -> ServerlessSimulation {
    ServerlessSimulation::with_memory_sink(Config::new(policy, capacity))
}

#[test]
fn test_cold_then_warm() {
    let mut sim = simulation(EvictionPolicy::Lru, 1000);
    let f = function("a", 100, 250., 2.);
    let outcome = sim.invoke(&f, 0.).unwrap();
    match outcome {
        InvocationOutcome::Miss {
            container,
            finish,
            evicted,
        } => {
            assert_eq!(container, 0);
            assert_float_eq(finish, 3000. + 250. * 1.2, 1e-9);
            assert!(evicted.is_empty());
        }
        _ => panic!("first invocation must be a cold start"),
    }
    assert_float_eq(sim.cold_processing_time(&f), 3300., 1e-9);

    // still running, so the second invocation needs a new container
    assert!(matches!(sim.invoke(&f, 10.).unwrap(), InvocationOutcome::Miss { container: 1, .. }));

    let outcome = sim.invoke(&f, 5000.).unwrap();
    assert_eq!(
        outcome,
        InvocationOutcome::Hit {
            container: 0,
            finish: 5002.
        }
    );
    assert_eq!(sim.pool().running().interval(0), Some((5000., 5002.)));
    assert_eq!(sim.pool().get(0).unwrap().last_invocation_time, 5000.);
    assert_eq!(sim.stats().hits, 1);
    assert_eq!(sim.stats().misses, 2);
    assert_eq!(sim.stats().freq["a"], 3);
    assert_float_eq(sim.stats().warm_processing_time.mean(), 2., 1e-9);

    let events: Vec<EventKind> = sim.sink().records.iter().map(|r| r.event).collect();
    assert_eq!(events, vec![EventKind::Miss, EventKind::Miss, EventKind::Hit]);
    let times: Vec<f64> = sim.history().iter().map(|(_, t)| *t).collect();
    assert_eq!(times, vec![0., 10., 5000.]);
}

#[test]
fn test_warm_start_on_exact_descriptor_only() {
    let mut sim = simulation(EvictionPolicy::Lru, 1000);
    sim.invoke(&function("a", 100, 10., 1.), 0.).unwrap();
    // same kind, different size
    let outcome = sim.invoke(&function("a", 200, 10., 1.), 10000.).unwrap();
    assert!(matches!(outcome, InvocationOutcome::Miss { .. }));
    assert_eq!(sim.pool().len(), 2);
    assert_eq!(sim.find_container_by_kind("a").map(|c| c.id), Some(0));
}

#[test]
fn test_capacity_miss_when_everything_runs() {
    let mut sim = simulation(EvictionPolicy::Random, 100);
    let f = function("a", 60, 10., 1.);
    sim.invoke(&f, 0.).unwrap();
    let outcome = sim.invoke(&f, 0.).unwrap();
    assert_eq!(outcome, InvocationOutcome::CapacityMiss { evicted: vec![] });
    assert_eq!(sim.stats().capacity_misses["a"], 1);
    assert_eq!(sim.stats().freq["a"], 1);
    assert_eq!(sim.stats().total_evictions(), 0);
    assert_eq!(sim.memory_used(), 60);
    // dropped invocations are not recorded
    assert_eq!(sim.sink().records.len(), 1);
    assert_eq!(sim.history().len(), 1);
}

#[test]
fn test_oversized_function() {
    let mut sim = simulation(EvictionPolicy::Lru, 100);
    let outcome = sim.invoke(&function("big", 101, 10., 1.), 0.).unwrap();
    assert_eq!(outcome, InvocationOutcome::CapacityMiss { evicted: vec![] });
    assert!(sim.pool().is_empty());
}

#[test]
fn test_ttl_boundary() {
    let mut sim = simulation(EvictionPolicy::Ttl, 100);
    assert_eq!(sim.ttl(), 360000.);
    let a = function("a", 60, 10., 1.);
    let b = function("b", 60, 10., 1.);
    sim.invoke(&a, 0.).unwrap();
    // container of a expires strictly after 360000
    assert_eq!(
        sim.invoke(&b, 360000.).unwrap(),
        InvocationOutcome::CapacityMiss { evicted: vec![] }
    );
    assert_eq!(sim.pool().status(0), Some(ContainerStatus::Idle));
    match sim.invoke(&b, 360001.).unwrap() {
        InvocationOutcome::Miss { container, evicted, .. } => {
            assert_eq!(container, 1);
            assert_eq!(evicted, vec![0]);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(sim.stats().evictions["a"], 1);
    assert_eq!(sim.stats().capacity_misses["b"], 1);
}

#[test]
fn test_lfu_evicts_least_frequent() {
    let mut sim = simulation(EvictionPolicy::Lfu, 100);
    let a = function("a", 50, 10., 1.);
    let b = function("b", 50, 10., 1.);
    let c = function("c", 50, 10., 1.);
    sim.invoke(&a, 0.).unwrap();
    for t in [10000., 11000., 12000., 13000.] {
        assert!(matches!(sim.invoke(&a, t).unwrap(), InvocationOutcome::Hit { container: 0, .. }));
    }
    sim.invoke(&b, 20000.).unwrap();
    match sim.invoke(&c, 30000.).unwrap() {
        InvocationOutcome::Miss { evicted, .. } => assert_eq!(evicted, vec![1]),
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(sim.stats().freq["a"], 5);
    assert_eq!(sim.stats().evictions["b"], 1);
    assert!(sim.pool().get(0).is_some());
}

#[rstest]
#[case(EvictionPolicy::Lru, 0)]
#[case(EvictionPolicy::ColdCost, 1)]
fn test_single_victim(#[case] policy: EvictionPolicy, #[case] victim: usize) {
    let mut sim = simulation(policy, 100);
    sim.invoke(&function("a", 50, 100., 1.), 0.).unwrap();
    sim.invoke(&function("b", 50, 1000., 1.), 10000.).unwrap();
    match sim.invoke(&function("c", 50, 10., 1.), 20000.).unwrap() {
        InvocationOutcome::Miss { evicted, .. } => assert_eq!(evicted, vec![victim]),
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[test]
fn test_running_containers_survive_eviction() {
    let mut sim = simulation(EvictionPolicy::Lru, 100);
    let a = function("a", 50, 10000., 1.);
    let b = function("b", 50, 10., 1.);
    sim.invoke(&a, 0.).unwrap();
    sim.invoke(&b, 0.).unwrap();
    // a still runs, b is idle
    match sim.invoke(&function("c", 50, 10., 1.), 5000.).unwrap() {
        InvocationOutcome::Miss { evicted, .. } => assert_eq!(evicted, vec![1]),
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(sim.pool().status(0), Some(ContainerStatus::Running));
}

#[test]
fn test_cleanup_is_idempotent() {
    let mut sim = simulation(EvictionPolicy::Lru, 1000);
    sim.invoke(&function("a", 10, 10., 1.), 0.).unwrap();
    sim.invoke(&function("b", 10, 10., 1.), 5000.).unwrap();
    assert_eq!(sim.pool().running().len(), 1);
    assert_eq!(sim.cleanup_finished(), 0);
    assert_eq!(sim.cleanup_finished(), 0);
    assert_eq!(sim.pool().running().len(), 1);
    assert_eq!(sim.time(), 5000.);
}

#[test]
fn test_container_clones() {
    let mut sim = simulation(EvictionPolicy::Lru, 1000);
    let a = function("a", 10, 10., 1.);
    sim.invoke(&a, 0.).unwrap();
    sim.invoke(&a, 1.).unwrap();
    sim.invoke(&function("b", 10, 10., 1.), 2.).unwrap();
    let clones: Vec<usize> = sim.container_clones(1).iter().map(|c| c.id).collect();
    assert_eq!(clones, vec![0, 1]);
    assert!(sim.find_container(&a).is_none());
    sim.invoke(&a, 5000.).unwrap();
    // container 0 serves the invocation, container 1 stays idle
    assert_eq!(sim.find_container(&a).map(|c| c.id), Some(1));
}

#[rstest]
fn test_memory_invariant(#[values("RAND", "CLOUD21", "LRU", "LFU", "RUNTIME_DIFF", "COLD_COST")] name: &str) {
    let raw = RawConfig {
        policy: name.to_string(),
        mem_capacity: 2048,
        ..Default::default()
    };
    let mut sim = ServerlessSimulation::from_raw(raw, NullSink).unwrap();
    let trace = generate_synthetic_trace(SyntheticTraceConfig::random_functions(20, 600000., 7));
    let mut capacity_misses = 0;
    for request in trace.request_iter() {
        let busy: Vec<usize> = sim
            .pool()
            .running()
            .iter()
            .filter(|(_, (_, finish))| *finish > request.time)
            .map(|(id, _)| id)
            .collect();
        let outcome = sim.invoke(&request.function, request.time).unwrap();
        let evicted = match outcome {
            InvocationOutcome::Hit { .. } => vec![],
            InvocationOutcome::Miss { evicted, .. } => evicted,
            InvocationOutcome::CapacityMiss { evicted } => {
                capacity_misses += 1;
                evicted
            }
        };
        assert!(evicted.iter().all(|id| !busy.contains(id)));
        let pooled: u64 = sim.pool().iter().map(|c| c.mem_size()).sum();
        assert_eq!(pooled, sim.memory_used());
        assert!(sim.memory_used() <= sim.capacity());
    }
    let stats = sim.stats();
    assert_eq!(stats.invocations() + capacity_misses, trace.len() as u64);
    assert_eq!(stats.total_capacity_misses(), capacity_misses);
    assert_eq!(stats.freq.values().sum::<u64>(), stats.invocations());
}

#[test]
fn test_random_policy_is_reproducible() {
    let trace = generate_synthetic_trace(SyntheticTraceConfig::random_functions(10, 300000., 3));
    let run = || {
        let mut sim = simulation(EvictionPolicy::Random, 1500);
        sim.load_trace(&trace).unwrap();
        sim.into_sink().records
    };
    assert_eq!(run(), run());
}

#[test]
fn test_custom_overhead() {
    let mut config = Config::new(EvictionPolicy::Lru, 1000);
    config.overhead = ProviderOverhead::new(1000., 0.5);
    let mut sim = ServerlessSimulation::with_memory_sink(config);
    let f = function("a", 10, 100., 1.);
    let outcome = sim.invoke(&f, 0.).unwrap();
    assert_eq!(outcome.event(), Some(EventKind::Miss));
    assert_float_eq(sim.stats().cold_processing_time.mean(), 1150., 1e-9);
    assert_eq!(sim.invoke(&f, 2000.).unwrap().event(), Some(EventKind::Hit));
    let dropped = InvocationOutcome::CapacityMiss { evicted: vec![] };
    assert_eq!(dropped.event(), None);
}

#[test]
fn test_evictions_before_capacity_miss_stand() {
    let mut sim = simulation(EvictionPolicy::Lru, 100);
    let b = function("b", 30, 10., 1.);
    let a = function("a", 40, 10000., 1.);
    sim.invoke(&b, 0.).unwrap();
    sim.invoke(&a, 5000.).unwrap();
    // a runs until 20000, b is idle; freeing b leaves 60 < 70
    let outcome = sim.invoke(&function("c", 70, 10., 1.), 6000.).unwrap();
    assert_eq!(outcome, InvocationOutcome::CapacityMiss { evicted: vec![0] });
    assert_eq!(sim.stats().evictions["b"], 1);
    assert_eq!(sim.stats().capacity_misses["c"], 1);
    assert_eq!(sim.memory_used(), 40);
    assert_eq!(sim.pool().len(), 1);
    assert_eq!(sim.sink().records.len(), 2);
}

#[test]
fn test_huge_mem_size() {
    let mut sim = simulation(EvictionPolicy::Lru, 100);
    sim.invoke(&function("a", 60, 10., 1.), 0.).unwrap();
    let huge = function("h", u64::MAX, 10., 1.);
    // a is still running
    assert_eq!(
        sim.invoke(&huge, 0.).unwrap(),
        InvocationOutcome::CapacityMiss { evicted: vec![] }
    );
    // a is idle and gets evicted, which still isn't enough
    assert_eq!(
        sim.invoke(&huge, 10000.).unwrap(),
        InvocationOutcome::CapacityMiss { evicted: vec![0] }
    );
    assert_eq!(sim.memory_used(), 0);
    assert!(sim.pool().is_empty());
    assert_eq!(sim.stats().capacity_misses["h"], 2);
}
