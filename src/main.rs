use anyhow::Result;
use clap::Parser;
use log::info;

use tile_traffic::simulation::{SimConfig, SimWorld};

#[derive(Parser)]
#[command(name = "tile_traffic")]
#[command(about = "Tile-grid traffic simulation, run headless in the terminal")]
struct Cli {
    /// Grid width in tiles
    #[arg(long, default_value = "32")]
    width: i32,

    /// Grid height in tiles
    #[arg(long, default_value = "20")]
    height: i32,

    /// Number of simulation ticks to run
    #[arg(long, default_value = "600")]
    ticks: u32,

    /// Time delta per tick in seconds
    #[arg(long, default_value = "0.05")]
    delta: f32,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Seconds between auto-spawn rounds
    #[arg(long, default_value = "2.0")]
    spawn_interval: f32,

    /// Start with auto-spawn switched off
    #[arg(long)]
    no_auto_spawn: bool,

    /// Start from an empty grid instead of the default cross network
    #[arg(long)]
    blank: bool,

    /// Print the summary and map every N ticks (0 = only at the end)
    #[arg(long, default_value = "20")]
    map_every: u32,

    /// Milliseconds to pause after each printed frame
    #[arg(long, default_value = "0")]
    pause_ms: u64,
}

impl Cli {
    fn config(&self) -> SimConfig {
        SimConfig {
            width: self.width,
            height: self.height,
            spawn_interval: self.spawn_interval,
            auto_spawn: !self.no_auto_spawn,
            seed: self.seed,
            ..SimConfig::default()
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    run_headless(&cli)
}

/// Run the simulation in the terminal
fn run_headless(cli: &Cli) -> Result<()> {
    let config = cli.config();
    let mut world = if cli.blank {
        SimWorld::blank(&config)?
    } else {
        SimWorld::new(&config)?
    };

    info!(
        "Running {}x{} grid for {} ticks of {}s",
        config.width, config.height, cli.ticks, cli.delta
    );

    println!("Initial state:");
    world.print_summary();
    world.draw_map();

    for tick in 1..=cli.ticks {
        world.tick(cli.delta);

        if cli.map_every > 0 && tick % cli.map_every == 0 && tick < cli.ticks {
            println!(
                "--- After tick {} ({:.1}s simulated time) ---",
                tick,
                tick as f32 * cli.delta
            );
            world.print_summary();
            world.draw_map();
            if cli.pause_ms > 0 {
                std::thread::sleep(std::time::Duration::from_millis(cli.pause_ms));
            }
        }
    }

    println!("=== Final State ===");
    world.print_summary();
    world.draw_map();

    let stats = world.traffic().stats();
    info!("=== SIMULATION COMPLETE ===");
    info!("Total vehicles spawned: {}", stats.spawned);
    info!("Total vehicles arrived: {}", stats.arrived);
    info!("Active vehicles: {}", world.traffic().len());
    info!("Road tiles: {}", world.grid().road_count());
    Ok(())
}
