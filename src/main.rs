use std::{
    fs::File,
    io::BufReader,
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::Parser;
use planetsim::{Event, Registry, Scenario, SimConfig};

/// Headless planet simulation runner.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Built-in scenario to load: binary, solar or scatter.
    #[arg(short, long, default_value = "solar")]
    scenario: Scenario,

    /// Number of ticks to simulate.
    #[arg(short, long, default_value_t = 1200)]
    ticks: u64,

    /// Ticks per second; the step length is its reciprocal.
    #[arg(long)]
    tps: Option<u32>,

    /// Gravitational constant override.
    #[arg(short, long)]
    gravity: Option<f64>,

    /// Seed for randomised scenarios.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// JSON file with simulation parameters.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Pace ticks against the wall clock instead of running flat out.
    #[arg(long)]
    realtime: bool,
}

fn load_config(args: &Args) -> Result<SimConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open config {}", path.display()))?;
            serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => SimConfig::default(),
    };
    if let Some(tps) = args.tps {
        config.tps = tps;
    }
    if let Some(g) = args.gravity {
        config.gravitational_constant = g;
    }
    Ok(config)
}

fn log_events(registry: &mut Registry) {
    for event in registry.drain_events() {
        match event {
            Event::Merged(merge) => log::info!(
                "merge: {} absorbed {} -> mass {:.2}, radius {:.2}",
                merge.survivor,
                merge.absorbed,
                merge.survivor_mass,
                merge.survivor_radius
            ),
            Event::Removed { id } => log::debug!("body {} removed", id),
            Event::Spawned { id } => log::debug!("body {} spawned", id),
        }
    }
}

fn log_stats(registry: &Registry) {
    let stats = registry.stats();
    log::info!(
        "tick {} | bodies: {} | mass: {:.1} | kinetic: {:.1} | merges: {}",
        stats.ticks,
        stats.body_count,
        stats.total_mass,
        stats.kinetic_energy,
        stats.merges
    );
}

fn run(registry: &mut Registry, ticks: u64, realtime: bool) {
    let tps = registry.config().tps.max(1);
    let dt = registry.config().dt();
    let tick_interval = Duration::from_secs_f64(dt);

    let mut accumulator = Duration::ZERO;
    let mut last_tick = Instant::now();
    let mut done = 0_u64;

    while done < ticks {
        if realtime {
            let now = Instant::now();
            accumulator += now - last_tick;
            last_tick = now;
            if accumulator < tick_interval {
                std::thread::sleep(Duration::from_millis(1));
                continue;
            }
            accumulator -= tick_interval;
        }

        registry.step(dt);
        log_events(registry);
        done += 1;

        if done % tps as u64 == 0 {
            log_stats(registry);
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let g = config.gravitational_constant;
    if !(g.is_finite() && g > 0.0) && args.scenario != Scenario::Scatter {
        log::warn!(
            "G = {} is not attractive; '{}' bodies start at rest",
            g,
            args.scenario
        );
    }
    log::info!(
        "scenario '{}', G = {}, {} tps",
        args.scenario,
        g,
        config.tps
    );

    let records = args.scenario.records(g, args.seed);
    let mut registry = Registry::new(config);
    registry.load_scenario(&records);
    log_events(&mut registry);
    registry.set_running(true);

    run(&mut registry, args.ticks, args.realtime);
    log_stats(&registry);
    Ok(())
}
