use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::algorithms::{Algorithm, DistanceMetric};
use crate::error::{Error, Result};
use crate::metrics::{AlgorithmMetrics, MetricsLog, MetricsRecord};

/// Runs an algorithm needs in the metrics log before it is averaged.
pub const DEFAULT_RUNS_NEEDED: usize = 10;

#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub seed: u64,
    pub algorithm: Algorithm,
    pub distance_metric: DistanceMetric,
    pub frames: usize,
    pub defences_placed: usize,
    /// Placements refused because the tile was already occupied.
    pub placements_blocked: usize,
    /// Placements refused because the tile looked critical.
    pub placements_critical: usize,
    pub enemies_spawned: usize,
    pub enemies_escaped: usize,
    pub reroutes: usize,
    pub paths_finished: usize,
    pub partial_paths: usize,
    pub metrics: AlgorithmMetrics,
    /// Shortest uncrowded route on the final level, in points.
    pub baseline_route_length: Option<usize>,
}

impl SimulationReport {
    pub fn new(seed: u64, algorithm: Algorithm, distance_metric: DistanceMetric) -> Self {
        SimulationReport {
            seed,
            algorithm,
            distance_metric,
            frames: 0,
            defences_placed: 0,
            placements_blocked: 0,
            placements_critical: 0,
            enemies_spawned: 0,
            enemies_escaped: 0,
            reroutes: 0,
            paths_finished: 0,
            partial_paths: 0,
            metrics: AlgorithmMetrics::default(),
            baseline_route_length: None,
        }
    }

    pub fn average_route_length(&self) -> f64 {
        if self.metrics.paths_completed == 0 {
            0.0
        } else {
            self.metrics.total_path_length as f64 / self.metrics.paths_completed as f64
        }
    }

    pub fn average_nodes_expanded(&self) -> f64 {
        if self.metrics.paths_completed == 0 {
            0.0
        } else {
            self.metrics.nodes_expanded as f64 / self.metrics.paths_completed as f64
        }
    }

    /// Average searched route length relative to the baseline route.
    pub fn route_efficiency(&self) -> f64 {
        match self.baseline_route_length {
            Some(baseline) if baseline > 0 && self.metrics.paths_completed > 0 => {
                self.average_route_length() / baseline as f64
            }
            _ => 0.0,
        }
    }
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Seed: {}", self.seed)?;
        writeln!(f, "Algorithm: {} ({})", self.algorithm, self.distance_metric)?;
        writeln!(f, "Frames: {}", self.frames)?;
        writeln!(
            f,
            "Defences placed: {} (refused: {} occupied, {} critical)",
            self.defences_placed, self.placements_blocked, self.placements_critical
        )?;
        writeln!(
            f,
            "Enemies spawned: {} | escaped: {} | reroutes: {}",
            self.enemies_spawned, self.enemies_escaped, self.reroutes
        )?;
        writeln!(
            f,
            "Paths finished: {} | partial paths: {}",
            self.paths_finished, self.partial_paths
        )?;
        writeln!(f, "Paths completed (all time): {}", self.metrics.paths_completed)?;
        writeln!(f, "Average route length: {:.2}", self.average_route_length())?;
        writeln!(f, "Average nodes expanded on completion: {:.2}", self.average_nodes_expanded())?;
        match self.baseline_route_length {
            Some(length) => {
                writeln!(f, "Baseline route length: {}", length)?;
                writeln!(f, "Route efficiency: {:.3}", self.route_efficiency())?;
            }
            None => writeln!(f, "Baseline route length: unreachable")?,
        }
        Ok(())
    }
}

/// Per-algorithm averages over many logged runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmSummary {
    pub algorithm: Algorithm,
    pub avg_paths_completed: f64,
    pub avg_nodes_expanded: f64,
    pub avg_path_length: f64,
    pub avg_paths_attempted: f64,
}

impl fmt::Display for AlgorithmSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- {} ---", self.algorithm)?;
        writeln!(f, "Average paths completed: {:.3}", self.avg_paths_completed)?;
        writeln!(f, "Average nodes expanded: {:.3}", self.avg_nodes_expanded)?;
        writeln!(f, "Average path length: {:.3}", self.avg_path_length)?;
        writeln!(f, "Average paths attempted: {:.3}", self.avg_paths_attempted)?;
        Ok(())
    }
}

/// Averages the logged runs of every algorithm with at least `runs_needed`
/// rows. Algorithms with fewer rows are skipped.
pub fn summarize(records: &[MetricsRecord], runs_needed: usize) -> Vec<AlgorithmSummary> {
    let mut groups: BTreeMap<Algorithm, Vec<&MetricsRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.algorithm).or_default().push(record);
    }

    let mut summary = Vec::new();
    for (algorithm, runs) in groups {
        if runs.len() < runs_needed {
            warn!(
                %algorithm,
                runs = runs.len(),
                runs_needed,
                "not enough runs logged for a full average"
            );
            continue;
        }

        let count = runs.len() as f64;
        let average = |field: fn(&MetricsRecord) -> u64| {
            runs.iter().map(|r| field(r) as f64).sum::<f64>() / count
        };
        summary.push(AlgorithmSummary {
            algorithm,
            avg_paths_completed: average(|r| r.paths_completed),
            avg_nodes_expanded: average(|r| r.nodes_expanded),
            avg_path_length: average(|r| r.total_path_length),
            avg_paths_attempted: average(|r| r.paths_attempted),
        });
    }
    summary
}

/// Reads a metrics log, averages it and writes the summary CSV to `output`.
pub fn summarize_file(input: &Path, output: &Path, runs_needed: usize) -> Result<Vec<AlgorithmSummary>> {
    let records = MetricsLog::new(input).read()?;
    let summary = summarize(&records, runs_needed);
    if summary.is_empty() {
        return Err(Error::NotEnoughRuns {
            path: input.to_path_buf(),
            needed: runs_needed,
        });
    }

    let mut writer = csv::Writer::from_writer(File::create(output)?);
    for row in &summary {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!(output = %output.display(), algorithms = summary.len(), "averages saved");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(algorithm: Algorithm, completed: u64, expanded: u64) -> MetricsRecord {
        MetricsRecord {
            algorithm,
            paths_completed: completed,
            nodes_expanded: expanded,
            total_path_length: completed * 10,
            paths_attempted: completed,
        }
    }

    #[test]
    fn averages_only_algorithms_with_enough_runs() {
        let mut records = Vec::new();
        for i in 0..4 {
            records.push(record(Algorithm::AStar, i, i * 20));
        }
        records.push(record(Algorithm::Greedy, 8, 8));

        let summary = summarize(&records, 3);

        assert_eq!(summary.len(), 1);
        let astar = &summary[0];
        assert_eq!(astar.algorithm, Algorithm::AStar);
        assert_eq!(astar.avg_paths_completed, 1.5);
        assert_eq!(astar.avg_nodes_expanded, 30.0);
        assert_eq!(astar.avg_path_length, 15.0);
    }

    #[test]
    fn efficiency_needs_a_baseline() {
        let mut report = SimulationReport::new(1, Algorithm::AStar, DistanceMetric::Manhattan);
        assert_eq!(report.route_efficiency(), 0.0);

        report.metrics.paths_completed = 2;
        report.metrics.total_path_length = 30;
        report.baseline_route_length = Some(10);
        assert_eq!(report.average_route_length(), 15.0);
        assert_eq!(report.route_efficiency(), 1.5);
    }
}
