use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::algorithms::Algorithm;
use crate::error::{Error, Result};

/// Aggregate search counters for one algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlgorithmMetrics {
    pub paths_completed: u64,
    pub nodes_expanded: u64,
    pub total_path_length: u64,
    pub paths_attempted: u64,
}

/// Per-algorithm counters owned by the path pool. They only ever grow.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    by_algorithm: FxHashMap<Algorithm, AlgorithmMetrics>,
}

impl Metrics {
    pub fn record_completion(&mut self, algorithm: Algorithm, nodes_expanded: usize, path_length: usize) {
        let entry = self.by_algorithm.entry(algorithm).or_default();
        entry.paths_completed += 1;
        entry.nodes_expanded += nodes_expanded as u64;
        entry.total_path_length += path_length as u64;
        entry.paths_attempted += 1;
    }

    pub fn get(&self, algorithm: Algorithm) -> AlgorithmMetrics {
        self.by_algorithm.get(&algorithm).copied().unwrap_or_default()
    }

    pub fn total(&self) -> AlgorithmMetrics {
        self.by_algorithm
            .values()
            .fold(AlgorithmMetrics::default(), |mut acc, m| {
                acc.paths_completed += m.paths_completed;
                acc.nodes_expanded += m.nodes_expanded;
                acc.total_path_length += m.total_path_length;
                acc.paths_attempted += m.paths_attempted;
                acc
            })
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<10} {:>10} {:>14} {:>12} {:>10}",
            "Algorithm", "Completed", "Nodes Expanded", "Path Length", "Attempted"
        )?;
        for algorithm in Algorithm::ALL {
            let m = self.get(algorithm);
            writeln!(
                f,
                "{:<10} {:>10} {:>14} {:>12} {:>10}",
                algorithm.name(),
                m.paths_completed,
                m.nodes_expanded,
                m.total_path_length,
                m.paths_attempted
            )?;
        }
        Ok(())
    }
}

/// One row of the metrics CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub algorithm: Algorithm,
    pub paths_completed: u64,
    pub nodes_expanded: u64,
    pub total_path_length: u64,
    pub paths_attempted: u64,
}

impl MetricsRecord {
    pub fn new(algorithm: Algorithm, metrics: AlgorithmMetrics) -> Self {
        MetricsRecord {
            algorithm,
            paths_completed: metrics.paths_completed,
            nodes_expanded: metrics.nodes_expanded,
            total_path_length: metrics.total_path_length,
            paths_attempted: metrics.paths_attempted,
        }
    }
}

/// Append-only CSV sink for [`Metrics`].
#[derive(Debug, Clone)]
pub struct MetricsLog {
    path: PathBuf,
}

impl MetricsLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        MetricsLog { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends the counters of `algorithm` as one row. The header is only
    /// written when the file is new or empty.
    pub fn append(&self, metrics: &Metrics, algorithm: Algorithm) -> Result<()> {
        let write_header = fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(write_header)
            .from_writer(file);
        writer.serialize(MetricsRecord::new(algorithm, metrics.get(algorithm)))?;
        writer.flush()?;

        info!(path = %self.path.display(), %algorithm, "logged metrics");
        Ok(())
    }

    pub fn read(&self) -> Result<Vec<MetricsRecord>> {
        let file = File::open(&self.path)?;
        csv::Reader::from_reader(file)
            .deserialize::<MetricsRecord>()
            .map(|record| record.map_err(Error::from))
            .collect()
    }
}
