use std::fmt::Write;

use crate::error::{Error, Result};
use crate::path::SearchView;

/// A tile-aligned pixel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }

    /// True once a point has crossed the exit edge.
    pub fn is_exit(&self) -> bool {
        self.x < 0
    }
}

/// Read-only view of the level's obstacle state.
///
/// Coordinates are in pixels. Everything left of `x = 0` is the exit lane and
/// everything at or right of [`GridOracle::width`] is the spawn lane; both are
/// open as long as the row exists.
pub trait GridOracle {
    fn point_blocked(&self, x: i32, y: i32) -> bool;

    fn rect_blocked(&self, x: i32, y: i32, w: i32, h: i32) -> bool;

    fn tile_size(&self) -> i32;

    /// Number of tile rows in the level.
    fn rows(&self) -> usize;

    /// Pixel width of the level, which doubles as the spawn boundary.
    fn width(&self) -> i32;

    fn is_blocked(&self, point: Point) -> bool {
        self.point_blocked(point.x, point.y)
    }
}

#[derive(Clone, Debug)]
pub struct Grid {
    pub columns: usize,
    pub rows: usize,
    pub tile_size: i32,
    blocked: Vec<bool>,
}

impl Grid {
    pub fn new(columns: usize, rows: usize, tile_size: i32) -> Result<Self> {
        if columns == 0 || rows == 0 {
            return Err(Error::InvalidGrid(format!(
                "level must have at least one column and row, got {columns}x{rows}"
            )));
        }
        if tile_size <= 0 {
            return Err(Error::InvalidGrid(format!(
                "tile size must be positive, got {tile_size}"
            )));
        }

        Ok(Grid {
            columns,
            rows,
            tile_size,
            blocked: vec![false; columns * rows],
        })
    }

    pub fn height(&self) -> i32 {
        self.rows as i32 * self.tile_size
    }

    /// Snaps an arbitrary pixel position onto the tile grid.
    pub fn snap(&self, x: i32, y: i32) -> Point {
        Point::new(x - x.rem_euclid(self.tile_size), y - y.rem_euclid(self.tile_size))
    }

    fn cell_index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 {
            return None;
        }
        let column = (x / self.tile_size) as usize;
        let row = (y / self.tile_size) as usize;
        (column < self.columns && row < self.rows).then(|| row * self.columns + column)
    }

    /// Marks the tile under `point` as blocked. Returns false when the point is
    /// off the level or the tile was already blocked.
    pub fn block(&mut self, point: Point) -> bool {
        match self.cell_index(point.x, point.y) {
            Some(index) if !self.blocked[index] => {
                self.blocked[index] = true;
                true
            }
            _ => false,
        }
    }

    pub fn unblock(&mut self, point: Point) {
        if let Some(index) = self.cell_index(point.x, point.y) {
            self.blocked[index] = false;
        }
    }

    pub fn blocked_count(&self) -> usize {
        self.blocked.iter().filter(|b| **b).count()
    }

    /// Renders the level with optional search overlays and agents on top.
    ///
    /// The spawn lane is drawn as an extra column on the right and the exit
    /// lane as an extra column on the left.
    pub fn render(&self, views: &[SearchView<'_>], agents: &[Point]) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Legend: E=Enemy, #=Blocked, *=Route, o=Frontier, -=Visited, .=Empty"
        );

        for row in 0..self.rows {
            let y = row as i32 * self.tile_size;
            for column in -1..=self.columns as i32 {
                let point = Point::new(column * self.tile_size, y);
                let glyph = if agents.contains(&point) {
                    'E'
                } else if self.is_blocked(point) {
                    '#'
                } else if views.iter().any(|v| v.route.contains(&point)) {
                    '*'
                } else if views.iter().any(|v| v.frontier.contains(&point)) {
                    'o'
                } else if views.iter().any(|v| v.visited.contains(&point)) {
                    '-'
                } else if column < 0 || column == self.columns as i32 {
                    ' '
                } else {
                    '.'
                };
                out.push(glyph);
                out.push(' ');
            }
            out.push('\n');
        }
        out
    }
}

impl GridOracle for Grid {
    fn point_blocked(&self, x: i32, y: i32) -> bool {
        if y < 0 || y >= self.height() {
            return true;
        }
        match self.cell_index(x, y) {
            Some(index) => self.blocked[index],
            None => false,
        }
    }

    fn rect_blocked(&self, x: i32, y: i32, w: i32, h: i32) -> bool {
        let w = w.max(1);
        let h = h.max(1);
        if x < 0 || y < 0 || x + w > self.width() || y + h > self.height() {
            return true;
        }

        let first_column = x / self.tile_size;
        let last_column = (x + w - 1) / self.tile_size;
        let first_row = y / self.tile_size;
        let last_row = (y + h - 1) / self.tile_size;

        (first_row..=last_row).any(|row| {
            (first_column..=last_column)
                .any(|column| self.point_blocked(column * self.tile_size, row * self.tile_size))
        })
    }

    fn tile_size(&self) -> i32 {
        self.tile_size
    }

    fn rows(&self) -> usize {
        self.rows
    }

    fn width(&self) -> i32 {
        self.columns as i32 * self.tile_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lanes_outside_the_level_are_open() {
        let grid = Grid::new(4, 3, 32).unwrap();
        assert!(!grid.point_blocked(-32, 0));
        assert!(!grid.point_blocked(128, 64));
        assert!(grid.point_blocked(0, -32));
        assert!(grid.point_blocked(0, 96));
    }

    #[test]
    fn block_marks_a_single_tile() {
        let mut grid = Grid::new(4, 3, 32).unwrap();
        assert!(grid.block(Point::new(32, 32)));
        assert!(!grid.block(Point::new(32, 32)));
        assert!(grid.point_blocked(32, 32));
        assert!(grid.point_blocked(63, 63));
        assert!(!grid.point_blocked(64, 32));
        assert!(!grid.block(Point::new(-32, 0)));
        assert_eq!(grid.blocked_count(), 1);

        grid.unblock(Point::new(32, 32));
        assert_eq!(grid.blocked_count(), 0);
    }

    #[test]
    fn rect_blocked_checks_every_covered_tile() {
        let mut grid = Grid::new(4, 3, 32).unwrap();
        grid.block(Point::new(64, 32));
        assert!(!grid.rect_blocked(0, 0, 30, 30));
        assert!(grid.rect_blocked(64, 32, 30, 30));
        assert!(grid.rect_blocked(40, 20, 40, 40));
        // Defences may not be placed in the lanes.
        assert!(grid.rect_blocked(-32, 0, 30, 30));
        assert!(grid.rect_blocked(128, 0, 30, 30));
    }

    #[test]
    fn snap_aligns_to_tiles() {
        let grid = Grid::new(4, 3, 32).unwrap();
        assert_eq!(grid.snap(45, 70), Point::new(32, 64));
        assert_eq!(grid.snap(-5, 0), Point::new(-32, 0));
    }

    #[test]
    fn rejects_empty_levels() {
        assert!(Grid::new(0, 3, 32).is_err());
        assert!(Grid::new(3, 3, 0).is_err());
    }
}
