use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glam::Vec3;
use murmuration_core::config::SimConfig;
use murmuration_core::entity::FlockEntity;
use murmuration_core::math::random_in_unit_sphere;
use murmuration_core::rng::create_rng;
use murmuration_core::world::FlockWorld;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

const WARMUP_STEPS: usize = 10;
const BENCHMARK_STEPS: usize = 200;
const TARGET_SPS: f64 = 100.0;

#[derive(Parser)]
#[command(name = "murmuration")]
#[command(about = "Flocking simulation CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single simulation from a config file
    Run {
        /// Path to config file (JSON)
        #[arg(long)]
        config: PathBuf,

        /// Output directory for results (optional)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Number of simulation steps to run
        #[arg(long, default_value_t = 10_000)]
        steps: usize,

        /// Sample metrics every N steps
        #[arg(long, default_value_t = 100)]
        sample_every: usize,
    },
    /// Run the performance benchmark suite
    Benchmark,
    /// Dump the default configuration to stdout
    DumpDefaultConfig,
}

fn create_entities(config: &SimConfig) -> Vec<FlockEntity> {
    let mut rng = create_rng(config.seed);
    (0..config.num_entities)
        .map(|i| {
            let position = random_in_unit_sphere(&mut rng) * config.spawn_radius;
            let mut entity = FlockEntity::from_config(i as u32, position, &config.entity);
            entity.velocity = Vec3::Z;
            entity
        })
        .collect()
}

fn build_world(config: &SimConfig) -> Result<FlockWorld> {
    let entities = create_entities(config);
    FlockWorld::try_new(entities, config.clone()).context("failed to initialize flock world")
}

fn run_benchmark(num_entities: usize, seed: u64, use_spatial_grid: bool) -> Result<()> {
    let config = SimConfig {
        num_entities,
        seed,
        use_spatial_grid,
        // Spread larger flocks out so density stays comparable.
        spawn_radius: 10.0 * (num_entities as f32 / 30.0).cbrt(),
        ..SimConfig::default()
    };
    config.validate().context("benchmark config validation error")?;

    let mut world = build_world(&config)?;
    let dt = config.dt;

    for _ in 0..WARMUP_STEPS {
        world.step(dt);
    }

    let mut total_grid = 0u64;
    let mut total_steering = 0u64;
    let mut total_integrate = 0u64;
    let mut total_time = 0u64;
    for _ in 0..BENCHMARK_STEPS {
        let timings = world.step(dt);
        total_grid += timings.grid_rebuild_us;
        total_steering += timings.steering_us;
        total_integrate += timings.integrate_us;
        total_time += timings.total_us;
    }

    let avg_step_us = total_time as f64 / BENCHMARK_STEPS as f64;
    let steps_per_sec = 1_000_000.0 / avg_step_us;
    let label = if use_spatial_grid { "grid" } else { "brute" };

    println!("--- {num_entities} entities ({label}) ---");
    println!("  Avg step:  {avg_step_us:.0} us ({steps_per_sec:.1} steps/sec)");
    println!(
        "  Breakdown: rebuild={:.0} us, steering={:.0} us, integrate={:.0} us",
        total_grid as f64 / BENCHMARK_STEPS as f64,
        total_steering as f64 / BENCHMARK_STEPS as f64,
        total_integrate as f64 / BENCHMARK_STEPS as f64,
    );
    if use_spatial_grid {
        let verdict = if steps_per_sec >= TARGET_SPS {
            "GO"
        } else {
            "NO-GO"
        };
        println!("  Verdict:   {verdict} (target: >={TARGET_SPS} steps/sec)");
    }
    println!();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::DumpDefaultConfig => {
            let config = SimConfig::default();
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Benchmark => {
            if cfg!(debug_assertions) {
                eprintln!("WARNING: running in debug mode. Results are not representative.");
                eprintln!("         Use: cargo run -p murmuration-cli --release -- benchmark");
                eprintln!();
            }
            println!("=== Murmuration benchmark ===");
            println!("Warmup: {WARMUP_STEPS} steps, Benchmark: {BENCHMARK_STEPS} steps");
            println!();

            for num_entities in [100usize, 1_000, 5_000, 20_000] {
                run_benchmark(num_entities, 42, true)?;
            }
            // Brute-force reference at the sizes where O(n^2) is still viable.
            for num_entities in [100usize, 1_000] {
                run_benchmark(num_entities, 42, false)?;
            }
        }
        Commands::Run {
            config,
            out,
            steps,
            sample_every,
        } => {
            let file = File::open(&config).context("failed to open config file")?;
            let reader = BufReader::new(file);
            let sim_config: SimConfig =
                serde_json::from_reader(reader).context("failed to parse config")?;
            sim_config.validate().context("config validation error")?;

            println!("Loaded config from {:?}", config);
            println!(
                "Simulating {} entities for {} steps...",
                sim_config.num_entities, steps
            );

            let mut world = build_world(&sim_config)?;
            let summary = world.run(steps, sample_every, sim_config.dt);

            if let Some(out_dir) = out {
                std::fs::create_dir_all(&out_dir).context("failed to create output directory")?;
                let summary_path = out_dir.join("summary.json");
                let file = File::create(summary_path).context("failed to create summary file")?;
                serde_json::to_writer_pretty(file, &summary).context("failed to write summary")?;
                println!("Run complete. Results saved to {:?}", out_dir);
            } else if let Some(last) = summary.samples.last() {
                println!(
                    "Run complete. mean_speed={:.2} coherence={:.2} mean_neighbors={:.1}",
                    last.mean_speed, last.heading_coherence, last.mean_neighbor_count
                );
            }
        }
    }
    Ok(())
}
