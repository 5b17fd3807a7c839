use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::grid::Point;

/// Search strategies available to a [`crate::path::Path`].
///
/// The three strategies share neighbour generation, the goal test and metric
/// recording; only frontier selection and neighbour relaxation differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum)]
pub enum Algorithm {
    #[serde(rename = "greedy")]
    #[value(name = "greedy")]
    Greedy,
    #[serde(rename = "astar")]
    #[value(name = "astar")]
    AStar,
    #[serde(rename = "dijkstra")]
    #[value(name = "dijkstra")]
    Dijkstra,
}

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [Algorithm::Greedy, Algorithm::AStar, Algorithm::Dijkstra];

    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Greedy => "greedy",
            Algorithm::AStar => "astar",
            Algorithm::Dijkstra => "dijkstra",
        }
    }

    /// Whether selection is driven by the stored score table. Greedy
    /// best-first ignores scores and ranks by the heuristic alone.
    pub fn uses_scores(self) -> bool {
        !matches!(self, Algorithm::Greedy)
    }

    /// The score stored for a point reached at `cost` with estimate `heuristic`.
    pub fn score(self, cost: f64, heuristic: f64) -> f64 {
        match self {
            Algorithm::Greedy => heuristic,
            Algorithm::AStar => cost + heuristic,
            Algorithm::Dijkstra => cost,
        }
    }

    /// Decides whether a neighbour should be (re)admitted to the frontier.
    ///
    /// `existing` is the neighbour's stored score when it is already queued.
    pub fn admits(self, existing: Option<f64>, candidate: f64) -> bool {
        match (self, existing) {
            (_, None) => true,
            (Algorithm::Greedy, Some(_)) => false,
            (Algorithm::AStar, Some(score)) => score > candidate,
            (Algorithm::Dijkstra, Some(score)) => candidate < score,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    Manhattan,
    Euclidean,
    Chebyshev,
}

impl DistanceMetric {
    pub const ALL: [DistanceMetric; 3] = [
        DistanceMetric::Manhattan,
        DistanceMetric::Euclidean,
        DistanceMetric::Chebyshev,
    ];

    pub fn distance(self, a: Point, b: Point) -> f64 {
        let dx = f64::from((a.x - b.x).abs());
        let dy = f64::from((a.y - b.y).abs());
        match self {
            DistanceMetric::Manhattan => dx + dy,
            DistanceMetric::Euclidean => (dx * dx + dy * dy).sqrt(),
            DistanceMetric::Chebyshev => dx.max(dy),
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DistanceMetric::Manhattan => "manhattan",
            DistanceMetric::Euclidean => "euclidean",
            DistanceMetric::Chebyshev => "chebyshev",
        };
        f.pad(name)
    }
}

/// Estimated distance from `position` to the exit edge.
///
/// The goal is the nearest exit point on the same row, `(0, position.y)`.
pub fn heuristic(position: Point, metric: DistanceMetric) -> f64 {
    metric.distance(position, Point::new(0, position.y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_match_their_definitions() {
        let a = Point::new(0, 0);
        let b = Point::new(3, -4);
        assert_eq!(DistanceMetric::Manhattan.distance(a, b), 7.0);
        assert_eq!(DistanceMetric::Euclidean.distance(a, b), 5.0);
        assert_eq!(DistanceMetric::Chebyshev.distance(a, b), 4.0);
    }

    #[test]
    fn heuristic_targets_the_exit_on_the_same_row() {
        for metric in DistanceMetric::ALL {
            assert_eq!(heuristic(Point::new(96, 64), metric), 96.0);
        }
    }

    #[test]
    fn relaxation_rules_differ_per_algorithm() {
        assert!(Algorithm::Greedy.admits(None, 10.0));
        assert!(!Algorithm::Greedy.admits(Some(100.0), 10.0));
        assert!(Algorithm::AStar.admits(Some(12.0), 10.0));
        assert!(!Algorithm::AStar.admits(Some(10.0), 10.0));
        assert!(Algorithm::Dijkstra.admits(Some(12.0), 10.0));
        assert!(!Algorithm::Dijkstra.admits(Some(8.0), 10.0));
    }

    #[test]
    fn scores_combine_cost_and_estimate() {
        assert_eq!(Algorithm::Greedy.score(5.0, 2.0), 2.0);
        assert_eq!(Algorithm::AStar.score(5.0, 2.0), 7.0);
        assert_eq!(Algorithm::Dijkstra.score(5.0, 2.0), 5.0);
    }
}
