use clap::Parser;
use tracing_subscriber::EnvFilter;

use tower_pathfinding::batch_simulation::BatchSimulation;
use tower_pathfinding::config::Config;
use tower_pathfinding::simulation::Simulation;
use tower_pathfinding::statistics::summarize_file;
use tower_pathfinding::Result;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::parse();
    if let Err(e) = run(config) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(config: Config) -> Result<()> {
    if config.summarize {
        let summary = summarize_file(&config.metrics_file, &config.summary_file, config.runs_needed)?;
        for row in &summary {
            println!("{}", row);
        }
        println!("Averages saved to {}", config.summary_file.display());
        return Ok(());
    }

    if !config.quiet {
        println!("Starting tower defence pathfinding simulation...");
        println!("Level: {}x{} tiles of {}px", config.columns, config.rows, config.tile_size);
        println!("Paths: {} | Frames: {}", config.num_paths, config.frames);
        if config.no_visualization || config.batch_mode {
            println!("Visualization disabled - running in fast mode");
        } else {
            println!("Visualization enabled with {}ms delay", config.delay_ms);
        }
        println!();
    }

    if config.batch_mode {
        let mut batch = BatchSimulation::new(config.clone());
        batch.run()?;
        if !config.quiet {
            batch.print_summary();
        }
        return Ok(());
    }

    let mut simulation = Simulation::new(config.clone())?;
    let report = simulation.run()?;

    println!("\n=== FINAL RESULTS ===");
    println!("{}", report);
    if !config.quiet {
        println!("{}", simulation.pool().metrics());
    }
    Ok(())
}
