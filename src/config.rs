use std::path::PathBuf;

use clap::Parser;

use crate::algorithms::{Algorithm, DistanceMetric};
use crate::statistics::DEFAULT_RUNS_NEEDED;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Level width in tiles.
    #[arg(long, default_value_t = 25)]
    pub columns: usize,

    /// Level height in tiles.
    #[arg(long, default_value_t = 15)]
    pub rows: usize,

    #[arg(long, default_value_t = 32)]
    pub tile_size: i32,

    /// Number of full-length paths precomputed by the pool.
    #[arg(long, default_value_t = 20)]
    pub num_paths: usize,

    #[arg(long, default_value_t = 2000)]
    pub frames: usize,

    #[arg(long, default_value_t = 60)]
    pub num_defences: usize,

    /// Frames between defence placement attempts.
    #[arg(long, default_value_t = 25)]
    pub defence_interval: usize,

    /// Frames between enemy spawns.
    #[arg(long, default_value_t = 20)]
    pub spawn_interval: usize,

    #[arg(long, value_enum, default_value_t = Algorithm::AStar)]
    pub algorithm: Algorithm,

    #[arg(long, value_enum, default_value_t = DistanceMetric::Manhattan)]
    pub distance_metric: DistanceMetric,

    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, default_value_t = 50)]
    pub delay_ms: u64,

    /// Render every n-th frame when visualization is enabled.
    #[arg(long, default_value_t = 10)]
    pub render_every: usize,

    #[arg(long, default_value_t = false)]
    pub no_visualization: bool,

    #[arg(long, default_value_t = false)]
    pub quiet: bool,

    #[arg(long, default_value = "tower_metrics.csv")]
    pub metrics_file: PathBuf,

    /// Run every algorithm and distance metric combination.
    #[arg(long, default_value_t = false)]
    pub batch_mode: bool,

    /// Seeded runs per combination in batch mode.
    #[arg(long, default_value_t = 10)]
    pub num_simulations: usize,

    /// Average the logged metrics instead of simulating.
    #[arg(long, default_value_t = false)]
    pub summarize: bool,

    /// Logged runs an algorithm needs before it is summarized.
    #[arg(long, default_value_t = DEFAULT_RUNS_NEEDED)]
    pub runs_needed: usize,

    #[arg(long, default_value = "metrics_summary.csv")]
    pub summary_file: PathBuf,
}

impl Config {
    pub fn search_settings(&self) -> SearchSettings {
        SearchSettings {
            algorithm: self.algorithm,
            distance_metric: self.distance_metric,
        }
    }
}

/// Session settings the engine reads on every search step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSettings {
    pub algorithm: Algorithm,
    pub distance_metric: DistanceMetric,
}

impl Default for SearchSettings {
    fn default() -> Self {
        SearchSettings {
            algorithm: Algorithm::AStar,
            distance_metric: DistanceMetric::Manhattan,
        }
    }
}
