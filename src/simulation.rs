use std::thread;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::agent::Enemy;
use crate::algorithms::a_star::baseline_length;
use crate::config::{Config, SearchSettings};
use crate::error::Result;
use crate::grid::{Grid, GridOracle, Point};
use crate::metrics::MetricsLog;
use crate::path::SearchView;
use crate::pool::PathPool;
use crate::statistics::SimulationReport;

/// Outcome of a single defence placement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Placed(Point),
    Occupied(Point),
    Critical(Point),
}

/// Headless tower-defence loop driving a [`PathPool`].
///
/// Every frame the pool advances one search, defences are dropped onto
/// random tiles on a cadence, enemies spawn on a cadence and every enemy
/// walks one step along its path.
pub struct Simulation {
    grid: Grid,
    pool: PathPool,
    enemies: Vec<Enemy>,
    config: Config,
    settings: SearchSettings,
    rng: StdRng,
    frame: usize,
    report: SimulationReport,
}

impl Simulation {
    pub fn new(config: Config) -> Result<Self> {
        let grid = Grid::new(config.columns, config.rows, config.tile_size)?;
        let seed = config.seed.unwrap_or_else(rand::random);
        let settings = config.search_settings();

        let mut pool = PathPool::seeded(seed);
        pool.precompute(config.num_paths, &grid);

        Ok(Simulation {
            grid,
            pool,
            enemies: Vec::new(),
            rng: StdRng::seed_from_u64(seed.wrapping_add(1)),
            frame: 0,
            report: SimulationReport::new(seed, settings.algorithm, settings.distance_metric),
            settings,
            config,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn pool(&self) -> &PathPool {
        &self.pool
    }

    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub fn seed(&self) -> u64 {
        self.report.seed
    }

    /// Advances the simulation by one frame.
    pub fn step(&mut self) {
        self.pool.update(&self.grid, &self.settings);

        let defence_interval = self.config.defence_interval.max(1);
        if self.frame % defence_interval == 0
            && self.report.defences_placed < self.config.num_defences
        {
            self.place_random_defence();
        }

        let spawn_interval = self.config.spawn_interval.max(1);
        if self.frame % spawn_interval == 0 {
            self.spawn_enemy();
        }

        self.move_enemies();
        self.frame += 1;
    }

    /// Tries to place a defence on the tile under `point`.
    ///
    /// The placement is refused when the tile is already occupied or when
    /// blocking it might cut the enemies off from the exit.
    pub fn place_defence(&mut self, point: Point) -> Placement {
        let tile = self.grid.tile_size;
        let point = self.grid.snap(point.x, point.y);

        if self.grid.rect_blocked(point.x, point.y, tile - 2, tile - 2) {
            self.report.placements_blocked += 1;
            return Placement::Occupied(point);
        }
        if self.pool.is_critical(point, &self.grid) {
            self.report.placements_critical += 1;
            return Placement::Critical(point);
        }

        self.grid.block(point);
        self.pool.repair(point, &self.grid);
        self.report.defences_placed += 1;
        debug!(?point, placed = self.report.defences_placed, "defence placed");
        Placement::Placed(point)
    }

    fn place_random_defence(&mut self) {
        let x = self.rng.gen_range(0..self.grid.width());
        let y = self.rng.gen_range(0..self.grid.height());
        self.place_defence(Point::new(x, y));
    }

    fn spawn_enemy(&mut self) {
        let id = self.pool.get_path(&self.grid);
        if let Some(start) = self.pool.path(id).map(|p| p.start()) {
            self.enemies.push(Enemy::new(start, id));
            self.report.enemies_spawned += 1;
        }
    }

    fn move_enemies(&mut self) {
        for enemy in &mut self.enemies {
            let reroutes = enemy.reroutes;
            enemy.advance(&mut self.pool, &self.grid);
            self.report.reroutes += enemy.reroutes - reroutes;
        }

        let before = self.enemies.len();
        self.enemies.retain(|e| !e.has_escaped());
        self.report.enemies_escaped += before - self.enemies.len();
    }

    /// Runs every configured frame, flushes the pool's metrics to the
    /// metrics file and returns the report.
    pub fn run(&mut self) -> Result<SimulationReport> {
        info!(
            seed = self.seed(),
            algorithm = %self.settings.algorithm,
            metric = %self.settings.distance_metric,
            frames = self.config.frames,
            "starting simulation"
        );

        let render_every = self.config.render_every.max(1);
        for _ in 0..self.config.frames {
            self.step();
            if !self.config.no_visualization && self.frame % render_every == 0 {
                self.render();
            }
        }

        let log = MetricsLog::new(&self.config.metrics_file);
        self.pool.log_metrics(&log, self.settings.algorithm)?;

        Ok(self.report())
    }

    /// Snapshot of the counters so far.
    pub fn report(&self) -> SimulationReport {
        let mut report = self.report.clone();
        report.frames = self.frame;
        report.paths_finished = self.pool.completed_count();
        report.partial_paths = self.pool.partial_count();
        report.metrics = self.pool.metrics().get(self.settings.algorithm);

        let middle_row = (self.grid.rows / 2) as i32 * self.grid.tile_size;
        report.baseline_route_length =
            baseline_length(&self.grid, Point::new(self.grid.width(), middle_row));
        report
    }

    fn render(&self) {
        let views: Vec<SearchView<'_>> = self.pool.paths().iter().map(|p| p.view()).collect();
        let agents: Vec<Point> = self.enemies.iter().map(|e| e.position).collect();

        print!("\x1B[2J\x1B[1;1H");
        println!("=== TOWER DEFENCE PATHFINDING ===");
        println!(
            "Algorithm: {} ({}) | Frame: {} | Enemies: {} | Defences: {}",
            self.settings.algorithm,
            self.settings.distance_metric,
            self.frame,
            self.enemies.len(),
            self.report.defences_placed
        );
        println!(
            "Paths finished: {}/{} | Escaped: {}",
            self.pool.completed_count(),
            self.pool.len(),
            self.report.enemies_escaped
        );
        print!("{}", self.grid.render(&views, &agents));
        thread::sleep(Duration::from_millis(self.config.delay_ms));
    }
}
