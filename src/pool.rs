use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::algorithms::Algorithm;
use crate::config::SearchSettings;
use crate::error::Result;
use crate::grid::{GridOracle, Point};
use crate::metrics::{Metrics, MetricsLog};
use crate::path::{neighbours, Path, PathId, RepairOutcome, Role, StepOutcome};

/// Attempts at finding an unblocked spawn row before settling for any row.
pub const START_ATTEMPTS: usize = 100;

/// Attempts at sampling a finished full path before building a partial one.
pub const SELECTION_ATTEMPTS: usize = 500;

/// Keeps a pool of paths for enemies to follow.
///
/// Paths are searched incrementally, one path per [`PathPool::update`], so the
/// cost of pathfinding is spread over many frames. New enemies pick a random
/// finished path; when a tile gets blocked the affected paths are repaired or
/// searched again, and stranded enemies are handed partial paths.
pub struct PathPool {
    tasks: Vec<Path>,
    metrics: Metrics,
    rng: StdRng,
    next_id: u64,
    stalled: Option<PathId>,
}

impl Default for PathPool {
    fn default() -> Self {
        Self::new()
    }
}

impl PathPool {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(rng: StdRng) -> Self {
        PathPool {
            tasks: Vec::new(),
            metrics: Metrics::default(),
            rng,
            next_id: 0,
            stalled: None,
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// All paths, partial paths first.
    pub fn paths(&self) -> &[Path] {
        &self.tasks
    }

    pub fn path(&self, id: PathId) -> Option<&Path> {
        self.tasks.iter().find(|t| t.id() == id)
    }

    pub fn partial_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.role() == Role::Partial).count()
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.is_done()).count()
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    fn allocate(&mut self, start: Point, role: Role) -> Path {
        let id = PathId(self.next_id);
        self.next_id += 1;
        Path::new(id, start, role)
    }

    /// Starts searching `count` new full-length paths.
    pub fn precompute<G: GridOracle + ?Sized>(&mut self, count: usize, grid: &G) {
        for _ in 0..count {
            let start = self.find_start(grid);
            let path = self.allocate(start, Role::Full);
            self.tasks.push(path);
        }
        info!(count, total = self.tasks.len(), "precomputing paths");
    }

    /// Picks a random spawn-edge start whose first step into the level is
    /// open. After [`START_ATTEMPTS`] misses any spawn row is returned.
    pub fn find_start<G: GridOracle + ?Sized>(&mut self, grid: &G) -> Point {
        let tile = grid.tile_size();
        let x = grid.width();
        let rows = grid.rows().max(1);

        for _ in 0..START_ATTEMPTS {
            let y = self.rng.gen_range(0..rows) as i32 * tile;
            if !grid.point_blocked(x - tile, y) {
                return Point::new(x, y);
            }
        }

        warn!("no open spawn row found after {START_ATTEMPTS} attempts");
        Point::new(x, self.rng.gen_range(0..rows) as i32 * tile)
    }

    /// Number of finished paths whose route passes through `point`.
    ///
    /// Linear in pool size times route length.
    pub fn point_usage(&self, point: Point) -> usize {
        route_usage(&self.tasks, point)
    }

    /// Advances the first unfinished path by one bounded search step.
    ///
    /// Does nothing once every path is finished.
    pub fn update<G: GridOracle + ?Sized>(&mut self, grid: &G, settings: &SearchSettings) -> StepOutcome {
        let Some(index) = self.tasks.iter().position(|t| !t.is_done()) else {
            return StepOutcome::Idle;
        };

        let (before, rest) = self.tasks.split_at_mut(index);
        let Some((task, after)) = rest.split_first_mut() else {
            return StepOutcome::Idle;
        };
        let (before, after) = (&*before, &*after);
        let id = task.id();
        let outcome = task.step(grid, *settings, |p| {
            route_usage(before, p) + route_usage(after, p)
        });

        match outcome {
            StepOutcome::Completed { expanded, length } => {
                self.metrics
                    .record_completion(settings.algorithm, expanded, length);
                info!(path = ?id, length, algorithm = %settings.algorithm, "path completed");
            }
            StepOutcome::Stalled { .. } if self.stalled != Some(id) => {
                self.stalled = Some(id);
                warn!(path = ?id, "search exhausted its frontier without reaching the exit");
            }
            _ => {}
        }

        outcome
    }

    /// Picks a finished full-length path for a new enemy.
    ///
    /// Falls back to a partial path from a fresh spawn point when no finished
    /// path turns up within [`SELECTION_ATTEMPTS`] samples.
    pub fn get_path<G: GridOracle + ?Sized>(&mut self, grid: &G) -> PathId {
        let spawn = grid.width();
        let candidates: Vec<usize> = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.role() == Role::Full)
            .map(|(i, _)| i)
            .collect();

        if !candidates.is_empty() {
            for _ in 0..SELECTION_ATTEMPTS {
                let index = candidates[self.rng.gen_range(0..candidates.len())];
                let task = &self.tasks[index];
                if task.is_done() && task.start().x >= spawn {
                    return task.id();
                }
            }
        }

        debug!("no finished path available, falling back to a partial path");
        let start = self.find_start(grid);
        self.get_partial_path(start, grid).0
    }

    /// Reacts to `point` becoming blocked.
    ///
    /// Finished paths through the point are repaired. Unfinished paths that
    /// have already reasoned about the point are searched again.
    pub fn repair<G: GridOracle + ?Sized>(&mut self, point: Point, grid: &G) {
        let mut restarted = 0;
        for task in &mut self.tasks {
            if task.is_done() {
                if task.contains(point) && task.repair(point, grid) == RepairOutcome::Restarted {
                    restarted += 1;
                }
            } else if task.frontier().contains(&point) || task.visited().contains(&point) {
                task.restart();
                restarted += 1;
            }
        }

        if restarted > 0 {
            self.stalled = None;
        }
        debug!(?point, restarted, "repaired paths around blocked point");
    }

    /// Finds a path an enemy stranded at `point` can switch to.
    ///
    /// Returns the path together with the point to move to while waiting:
    /// `point` itself when a path passes through or starts there, a
    /// neighbour when only a neighbouring tile is on a finished route, or a
    /// brand-new partial path rooted at `point`.
    pub fn get_partial_path<G: GridOracle + ?Sized>(&mut self, point: Point, grid: &G) -> (PathId, Point) {
        if let Some(task) = self
            .tasks
            .iter()
            .find(|t| (t.is_done() && t.contains(point)) || t.start() == point)
        {
            return (task.id(), point);
        }

        for neighbour in neighbours(point, grid) {
            if let Some(task) = self
                .tasks
                .iter()
                .find(|t| t.is_done() && t.contains(neighbour))
            {
                return (task.id(), neighbour);
            }
        }

        let path = self.allocate(point, Role::Partial);
        let id = path.id();
        self.tasks.insert(0, path);
        debug!(path = ?id, ?point, partials = self.partial_count(), "allocated partial path");
        (id, point)
    }

    /// Whether blocking `point` might cut the enemies off from the exit.
    ///
    /// This only consults finished spawn-rooted paths: the point is safe as
    /// soon as one of them avoids it. With no finished paths every point is
    /// considered critical. It is an approximation, not a connectivity proof.
    pub fn is_critical<G: GridOracle + ?Sized>(&self, point: Point, grid: &G) -> bool {
        let spawn = grid.width();
        !self
            .tasks
            .iter()
            .any(|t| t.is_done() && t.start().x >= spawn && !t.contains(point))
    }

    /// Flushes the counters of `algorithm` to `log`.
    pub fn log_metrics(&self, log: &MetricsLog, algorithm: Algorithm) -> Result<()> {
        log.append(&self.metrics, algorithm)
    }
}

fn route_usage(tasks: &[Path], point: Point) -> usize {
    tasks
        .iter()
        .filter(|t| t.is_done() && t.contains(point))
        .count()
}
