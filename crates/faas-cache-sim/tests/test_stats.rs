mod common;
use common::assert_float_eq;

use faas_cache_sim::stats::Stats;

#[test]
fn test_counters() {
    let mut stats: Stats = Default::default();
    stats.on_miss("a", 3120.);
    stats.on_hit("a", 10.);
    stats.on_hit("a", 10.);
    stats.on_miss("b", 3240.);
    stats.on_capacity_miss("b");
    stats.on_eviction("a");
    assert_eq!(stats.invocations(), 4);
    assert_eq!(stats.freq["a"], 3);
    assert_eq!(stats.freq["b"], 1);
    assert_eq!(stats.total_capacity_misses(), 1);
    assert_eq!(stats.total_evictions(), 1);
    assert_float_eq(stats.cold_start_rate(), 0.5, 1e-12);
    assert_float_eq(stats.cold_processing_time.mean(), 3180., 1e-9);
    // freq keeps first-seen order
    let kinds: Vec<&String> = stats.freq.keys().collect();
    assert_eq!(kinds, vec!["a", "b"]);
}

#[test]
fn test_serialized_counters() {
    let mut stats: Stats = Default::default();
    stats.on_miss("a", 3120.);
    stats.on_capacity_miss("b");
    let text = serde_yaml::to_string(&stats).unwrap();
    assert!(text.contains("capacity_misses"));
    assert!(text.contains("misses: 1"));
    // raw samples are not part of the report
    assert!(!text.contains("cold_processing_time"));
}
