use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::algorithms::heuristic;
use crate::config::SearchSettings;
use crate::grid::{GridOracle, Point};

/// Maximum number of node expansions performed by a single [`Path::step`].
pub const STEP_BUDGET: usize = 25;

/// Stable handle to a [`Path`] owned by a [`crate::pool::PathPool`].
///
/// Indices into the pool shift whenever a partial path is inserted at the
/// front, so consumers hold on to ids instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathId(pub(crate) u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Rooted on the spawn edge, eligible for selection by new enemies.
    Full,
    /// Created on demand to rescue a stranded enemy.
    Partial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The path was already finished; nothing happened.
    Idle,
    Searching { expanded: usize },
    /// The frontier ran dry without reaching the exit. The path stays in
    /// progress until it is restarted.
    Stalled { expanded: usize },
    Completed { expanded: usize, length: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairOutcome {
    NotOnRoute,
    /// The blocked point was dropped; its neighbours were already adjacent.
    Removed,
    /// The blocked point was swapped for a common neighbour.
    Replaced,
    /// The blocked point was swapped for a two point detour.
    Detoured,
    /// No local bypass exists; the search starts over.
    Restarted,
}

/// Borrowed search state for debug rendering.
#[derive(Debug, Clone, Copy)]
pub struct SearchView<'a> {
    pub frontier: &'a FxHashSet<Point>,
    pub visited: &'a FxHashSet<Point>,
    pub route: &'a [Point],
}

/// A single route across the level, searched incrementally over many frames.
#[derive(Debug, Clone)]
pub struct Path {
    id: PathId,
    role: Role,
    start: Point,
    frontier: FxHashSet<Point>,
    visited: FxHashSet<Point>,
    /// Selection priority for score driven strategies.
    scores: FxHashMap<Point, f64>,
    /// Cost-so-far.
    costs: FxHashMap<Point, f64>,
    backtrack: FxHashMap<Point, Point>,
    points: Vec<Point>,
    done: bool,
}

impl Path {
    pub fn new(id: PathId, start: Point, role: Role) -> Self {
        let mut path = Path {
            id,
            role,
            start,
            frontier: FxHashSet::default(),
            visited: FxHashSet::default(),
            scores: FxHashMap::default(),
            costs: FxHashMap::default(),
            backtrack: FxHashMap::default(),
            points: Vec::new(),
            done: false,
        };
        path.restart();
        path
    }

    /// Discards all search state and the finished route, then reseeds the
    /// search from the same start point.
    pub fn restart(&mut self) {
        self.done = false;
        self.points.clear();
        self.visited.clear();
        self.backtrack.clear();
        self.frontier.clear();
        self.frontier.insert(self.start);
        self.scores.clear();
        self.scores.insert(self.start, 0.0);
        self.costs.clear();
        self.costs.insert(self.start, 0.0);
    }

    pub fn id(&self) -> PathId {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// The finished route, empty while the search is in progress.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn frontier(&self) -> &FxHashSet<Point> {
        &self.frontier
    }

    pub fn visited(&self) -> &FxHashSet<Point> {
        &self.visited
    }

    /// Whether the finished route passes through `point`.
    pub fn contains(&self, point: Point) -> bool {
        self.points.contains(&point)
    }

    /// The point following `current` on the finished route.
    pub fn next(&self, current: Point) -> Option<Point> {
        let index = self.points.iter().position(|p| *p == current)?;
        self.points.get(index + 1).copied()
    }

    pub fn view(&self) -> SearchView<'_> {
        SearchView {
            frontier: &self.frontier,
            visited: &self.visited,
            route: &self.points,
        }
    }

    /// Advances the search by at most [`STEP_BUDGET`] node expansions.
    ///
    /// `settings` is read fresh on every call, so a path may be searched by
    /// several strategies over its lifetime. `crowding` reports how many
    /// finished routes already use a point and feeds the edge cost.
    pub fn step<G, F>(&mut self, grid: &G, settings: SearchSettings, crowding: F) -> StepOutcome
    where
        G: GridOracle + ?Sized,
        F: Fn(Point) -> usize,
    {
        if self.done {
            return StepOutcome::Idle;
        }

        let algorithm = settings.algorithm;
        let mut expanded = 0;

        while expanded < STEP_BUDGET {
            let Some(current) = self.select(settings) else {
                break;
            };
            self.frontier.remove(&current);
            self.visited.insert(current);
            expanded += 1;

            if current.is_exit() {
                self.finish(current);
                return StepOutcome::Completed {
                    expanded,
                    length: self.points.len(),
                };
            }

            let cost = self.costs.get(&current).copied().unwrap_or(0.0);
            for neighbour in neighbours(current, grid) {
                if self.visited.contains(&neighbour) {
                    continue;
                }

                let existing = self
                    .frontier
                    .contains(&neighbour)
                    .then(|| self.scores.get(&neighbour).copied().unwrap_or(f64::INFINITY));

                if !algorithm.uses_scores() {
                    if algorithm.admits(existing, 0.0) {
                        self.backtrack.insert(neighbour, current);
                        self.frontier.insert(neighbour);
                    }
                    continue;
                }

                let candidate_cost = cost + edge_cost(current, neighbour, crowding(neighbour));
                let score = algorithm.score(
                    candidate_cost,
                    heuristic(neighbour, settings.distance_metric),
                );
                if algorithm.admits(existing, score) {
                    self.scores.insert(neighbour, score);
                    self.costs.insert(neighbour, candidate_cost);
                    self.backtrack.insert(neighbour, current);
                    self.frontier.insert(neighbour);
                }
            }
        }

        if self.frontier.is_empty() {
            StepOutcome::Stalled { expanded }
        } else {
            StepOutcome::Searching { expanded }
        }
    }

    /// Picks the next frontier point. Ties go to the smallest point so runs
    /// are reproducible regardless of hash order.
    fn select(&self, settings: SearchSettings) -> Option<Point> {
        let rank = |p: &Point| {
            if settings.algorithm.uses_scores() {
                // Points queued by greedy search carry no score.
                self.scores.get(p).copied().unwrap_or(f64::INFINITY)
            } else {
                heuristic(*p, settings.distance_metric)
            }
        };

        self.frontier
            .iter()
            .copied()
            .min_by(|a, b| rank(a).total_cmp(&rank(b)).then_with(|| a.cmp(b)))
    }

    fn finish(&mut self, goal: Point) {
        let mut route = vec![goal];
        let mut current = goal;
        while let Some(&previous) = self.backtrack.get(&current) {
            route.push(previous);
            current = previous;
        }
        route.reverse();

        self.points = route;
        self.done = true;
    }

    /// Patches the finished route around a newly blocked point, falling back
    /// to a full restart when no local bypass exists.
    pub fn repair<G>(&mut self, point: Point, grid: &G) -> RepairOutcome
    where
        G: GridOracle + ?Sized,
    {
        let Some(index) = self.points.iter().position(|p| *p == point) else {
            return RepairOutcome::NotOnRoute;
        };

        if index > 0 && index + 1 < self.points.len() {
            let previous = self.points[index - 1];
            let next = self.points[index + 1];
            let previous_neighbours = neighbours(previous, grid);
            let next_neighbours = neighbours(next, grid);

            if previous_neighbours.contains(&next) {
                self.points.remove(index);
                debug!(path = ?self.id, ?point, "dropped blocked point from route");
                return RepairOutcome::Removed;
            }

            // Bypass points already on the route would make it loop. Spawn
            // lane points may only step straight left, so they are skipped.
            let width = grid.width();
            let fresh = |p: &&Point| p.x < width && !self.points.contains(*p);

            let common = previous_neighbours
                .iter()
                .filter(fresh)
                .find(|n| next_neighbours.contains(n))
                .copied();
            if let Some(common) = common {
                self.points[index] = common;
                self.truncate_at_exit();
                debug!(path = ?self.id, ?point, ?common, "replaced blocked point");
                return RepairOutcome::Replaced;
            }

            let detour = previous_neighbours.iter().filter(fresh).find_map(|&neighbour| {
                neighbours(neighbour, grid)
                    .into_iter()
                    .filter(|p| *p != neighbour && p.x < width && !self.points.contains(p))
                    .find(|p| next_neighbours.contains(p))
                    .map(|hop| (neighbour, hop))
            });
            if let Some((neighbour, hop)) = detour {
                self.points[index] = neighbour;
                self.points.insert(index + 1, hop);
                self.truncate_at_exit();
                debug!(path = ?self.id, ?point, ?neighbour, ?hop, "detoured around blocked point");
                return RepairOutcome::Detoured;
            }
        }

        debug!(path = ?self.id, ?point, "no local bypass, restarting search");
        self.restart();
        RepairOutcome::Restarted
    }

    /// A bypass through the exit lane already reaches the goal, so the rest
    /// of the route is dropped.
    fn truncate_at_exit(&mut self) {
        if let Some(end) = self.points.iter().position(|p| p.is_exit()) {
            self.points.truncate(end + 1);
        }
    }
}

/// Tiles reachable in one move from `point`.
///
/// Points in the spawn lane may only step straight into the level. Elsewhere
/// all eight surrounding tiles are candidates, minus blocked tiles and
/// diagonals that would cut between two blocked corners.
pub fn neighbours<G>(point: Point, grid: &G) -> Vec<Point>
where
    G: GridOracle + ?Sized,
{
    let tile = grid.tile_size();

    if point.x >= grid.width() {
        let left = Point::new(point.x - tile, point.y);
        return if grid.is_blocked(left) {
            Vec::new()
        } else {
            vec![left]
        };
    }

    let mut out = Vec::with_capacity(8);
    for dx in [-tile, 0, tile] {
        for dy in [-tile, 0, tile] {
            if dx == 0 && dy == 0 {
                continue;
            }
            let candidate = Point::new(point.x + dx, point.y + dy);
            if grid.is_blocked(candidate) {
                continue;
            }
            if dx != 0 && dy != 0 && !diagonal_clear(point, candidate, grid) {
                continue;
            }
            out.push(candidate);
        }
    }
    out
}

fn diagonal_clear<G>(a: Point, b: Point, grid: &G) -> bool
where
    G: GridOracle + ?Sized,
{
    !grid.point_blocked(b.x, a.y) && !grid.point_blocked(a.x, b.y)
}

/// Move cost without crowding: 3 along an axis, 4 on a diagonal.
pub fn base_cost(a: Point, b: Point) -> u32 {
    if a.x == b.x || a.y == b.y {
        3
    } else {
        4
    }
}

/// Full move cost into `b`, penalised by the number of finished routes
/// already passing through it.
pub fn edge_cost(a: Point, b: Point, crowding: usize) -> f64 {
    f64::from(base_cost(a, b)) + crowding as f64
}
