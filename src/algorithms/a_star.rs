use pathfinding::prelude::astar;

use crate::grid::{GridOracle, Point};
use crate::path::{base_cost, neighbours};

/// Runs a complete, uncrowded A* search from `start` to the exit edge using
/// the `pathfinding` crate.
///
/// This is the yardstick the incremental search is measured against: same
/// neighbour rule and move costs, no crowding penalty, no iteration budget.
///
/// # Returns
///
/// The route and its cost, or `None` if the exit cannot be reached.
pub fn baseline_route<G: GridOracle>(grid: &G, start: Point) -> Option<(Vec<Point>, u32)> {
    let tile = grid.tile_size();
    astar(
        &start,
        |p| {
            neighbours(*p, grid)
                .into_iter()
                .map(|n| (n, base_cost(*p, n)))
                .collect::<Vec<_>>()
        },
        |p| {
            // Every remaining column costs at least one orthogonal move.
            if p.is_exit() {
                0
            } else {
                (p.x / tile + 1) as u32 * base_cost(*p, Point::new(p.x - tile, p.y))
            }
        },
        |p| p.is_exit(),
    )
}

/// Length of the shortest uncrowded route from `start`, counted in points.
pub fn baseline_length<G: GridOracle>(grid: &G, start: Point) -> Option<usize> {
    baseline_route(grid, start).map(|(route, _)| route.len())
}
