use crate::grid::{GridOracle, Point};
use crate::path::PathId;
use crate::pool::PathPool;

/// An enemy walking a pooled path towards the exit.
#[derive(Debug, Clone)]
pub struct Enemy {
    pub position: Point,
    pub path: PathId,
    pub steps: usize,
    pub reroutes: usize,
}

impl Enemy {
    pub fn new(position: Point, path: PathId) -> Self {
        Enemy {
            position,
            path,
            steps: 0,
            reroutes: 0,
        }
    }

    pub fn move_to(&mut self, new_pos: Point) {
        self.position = new_pos;
        self.steps += 1;
    }

    pub fn has_escaped(&self) -> bool {
        self.position.is_exit()
    }

    /// Takes one step along the current path.
    ///
    /// An enemy whose path is unfinished, or no longer passes through its
    /// position, asks the pool for a partial path and waits on it, stepping
    /// onto a neighbouring route when one is offered.
    pub fn advance<G: GridOracle + ?Sized>(&mut self, pool: &mut PathPool, grid: &G) {
        let next = pool
            .path(self.path)
            .filter(|p| p.is_done())
            .and_then(|p| p.next(self.position));

        if let Some(next) = next {
            self.move_to(next);
            return;
        }

        let (path, waypoint) = pool.get_partial_path(self.position, grid);
        if path != self.path {
            self.path = path;
            self.reroutes += 1;
        }
        if waypoint != self.position {
            self.move_to(waypoint);
        }
    }
}
