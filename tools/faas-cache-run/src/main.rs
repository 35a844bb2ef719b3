use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use env_logger::Builder;
use log::{error, info};
use serde::{Deserialize, Serialize};

use faas_cache_sim::config::{Config, RawConfig};
use faas_cache_sim::error::Error;
use faas_cache_sim::extra::csv_trace::CsvTrace;
use faas_cache_sim::extra::synthetic_trace::{generate_synthetic_trace, SyntheticTraceConfig};
use faas_cache_sim::parallel::parallel_simulation_n_workers;
use faas_cache_sim::simulation::ServerlessSimulation;
use faas_cache_sim::stats::{HitMissCount, Stats};
use faas_cache_sim::telemetry::{perf_log_file_name, summarize, summarize_perf_log, MemorySink, PerfLog};
use faas_cache_sim::trace::Trace;
use faas_cache_sim::util::FxIndexMap;

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
/// Replays an invocation trace against a container cache under several eviction policies
struct Args {
    /// Path to CSV trace (kind,mem_size,run_time,warm_time,time)
    #[arg(short, long)]
    trace: Option<PathBuf>,

    /// Number of functions in a synthetic trace, used when no trace file is given
    #[arg(long, default_value_t = 20)]
    synthetic: usize,

    /// Duration of a synthetic trace in ms
    #[arg(long, default_value_t = 3600000.)]
    duration: f64,

    /// Seed of the synthetic trace generator
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Path to YAML file with experiment configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for per-policy performance logs
    #[arg(short, long)]
    log_dir: Option<PathBuf>,

    /// Number of threads for runs without performance logs
    #[arg(long, default_value_t = 1)]
    threads: usize,

    /// Path to produced YAML file with per-policy results
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn default_policies() -> Vec<String> {
    ["RAND", "CLOUD21", "LRU", "LFU", "RUNTIME_DIFF", "COLD_COST"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_run() -> String {
    "0".to_string()
}

/// Several policies over one base config.
#[derive(Serialize, Deserialize)]
struct ExperimentConfig {
    #[serde(default)]
    base_config: RawConfig,
    #[serde(default = "default_policies")]
    policies: Vec<String>,
    #[serde(default = "default_run")]
    run: String,
}

impl ExperimentConfig {
    fn load(path: &Path) -> Result<Self, Error> {
        Ok(serde_yaml::from_reader(File::open(path)?)?)
    }

    fn configs(&self) -> Result<Vec<Config>, Error> {
        self.policies
            .iter()
            .map(|policy| {
                let mut raw = self.base_config.clone();
                raw.policy = policy.clone();
                Config::from_raw(raw)
            })
            .collect()
    }
}

/// Results of one policy as written to the output file.
#[derive(Serialize)]
struct PolicyReport {
    policy: String,
    mem_capacity: u64,
    cold_start_rate: f64,
    mean_cold_processing_time: f64,
    mean_warm_processing_time: f64,
    stats: Stats,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<FxIndexMap<String, HitMissCount>>,
}

impl PolicyReport {
    fn new(config: &Config, stats: &Stats, summary: Option<FxIndexMap<String, HitMissCount>>) -> Self {
        Self {
            policy: config.policy.name().to_string(),
            mem_capacity: config.mem_capacity,
            cold_start_rate: stats.cold_start_rate(),
            mean_cold_processing_time: stats.cold_processing_time.mean(),
            mean_warm_processing_time: stats.warm_processing_time.mean(),
            stats: stats.clone(),
            summary,
        }
    }
}

fn print_results(report: &PolicyReport) {
    let stats = &report.stats;
    println!("describing {} (capacity {})", report.policy, report.mem_capacity);
    println!("{} dispatched invocations", stats.invocations());
    println!("- cold start rate = {}", report.cold_start_rate);
    println!("- mean cold start processing time = {}", report.mean_cold_processing_time);
    println!("- mean warm start processing time = {}", report.mean_warm_processing_time);
    println!("- evictions = {}", stats.total_evictions());
    for (kind, count) in stats.evictions.iter() {
        println!("  {}: {}", kind, count);
    }
    println!("- capacity misses = {}", stats.total_capacity_misses());
    for (kind, count) in stats.capacity_misses.iter() {
        println!("  {}: {}", kind, count);
    }
    if let Some(summary) = &report.summary {
        println!("- misses by function:");
        for (kind, count) in summary.iter() {
            println!("  {}: {} of {}", kind, count.misses, count.hits + count.misses);
        }
    }
}

fn run(args: &Args) -> Result<(), Error> {
    let experiment = match &args.config {
        Some(path) => ExperimentConfig::load(path)?,
        None => ExperimentConfig {
            base_config: Default::default(),
            policies: default_policies(),
            run: default_run(),
        },
    };
    let configs = experiment.configs()?;

    let trace: Arc<dyn Trace + Send + Sync> = match &args.trace {
        Some(path) => Arc::new(CsvTrace::from_path(path)?),
        None => {
            let trace =
                generate_synthetic_trace(SyntheticTraceConfig::random_functions(args.synthetic, args.duration, args.seed));
            info!("Generated {} invocations of {} functions", trace.len(), args.synthetic);
            Arc::new(trace)
        }
    };
    let num_funcs = trace.function_count();

    let mut reports = Vec::new();
    match &args.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            for config in configs {
                let path = dir.join(perf_log_file_name(
                    config.policy.name(),
                    num_funcs,
                    config.mem_capacity,
                    &experiment.run,
                ));
                let mut sim = ServerlessSimulation::new(config.clone(), PerfLog::create(&path)?);
                sim.load_trace(trace.as_ref())?;
                let stats = sim.stats().clone();
                sim.into_sink().into_inner()?;
                info!("Performance log written to {}", path.display());
                reports.push(PolicyReport::new(&config, &stats, Some(summarize_perf_log(&path)?)));
            }
        }
        None if args.threads > 1 => {
            let results = parallel_simulation_n_workers(configs.clone(), trace.clone(), args.threads)?;
            for (config, stats) in configs.iter().zip(results.iter()) {
                reports.push(PolicyReport::new(config, stats, None));
            }
        }
        None => {
            for config in configs {
                let mut sim = ServerlessSimulation::new(config.clone(), MemorySink::default());
                sim.load_trace(trace.as_ref())?;
                let summary = summarize(sim.sink().records.iter());
                reports.push(PolicyReport::new(&config, sim.stats(), Some(summary)));
            }
        }
    }
    for report in reports.iter() {
        print_results(report);
    }
    if let Some(path) = &args.output {
        serde_yaml::to_writer(File::create(path)?, &reports)?;
        info!("Results written to {}", path.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
