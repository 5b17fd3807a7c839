use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use tracing::info;

use crate::algorithms::{Algorithm, DistanceMetric};
use crate::config::Config;
use crate::error::Result;
use crate::simulation::Simulation;
use crate::statistics::SimulationReport;

#[derive(Debug, Clone)]
pub struct BatchResult {
    pub simulation_id: usize,
    pub report: SimulationReport,
    pub execution_time: Duration,
}

/// Runs every algorithm and distance metric over the same seeded levels.
pub struct BatchSimulation {
    config: Config,
    results: Vec<BatchResult>,
    start_time: Instant,
}

impl BatchSimulation {
    pub fn new(config: Config) -> Self {
        BatchSimulation {
            config,
            results: Vec::new(),
            start_time: Instant::now(),
        }
    }

    pub fn results(&self) -> &[BatchResult] {
        &self.results
    }

    /// Runs `num_simulations` seeds for every combination. Each run appends
    /// one row to the metrics file.
    pub fn run(&mut self) -> Result<()> {
        let base_seed = self.config.seed.unwrap_or_else(rand::random);
        let combinations = Algorithm::ALL.len() * DistanceMetric::ALL.len();
        let total = combinations * self.config.num_simulations;

        info!(
            base_seed,
            simulations = self.config.num_simulations,
            combinations,
            metrics_file = %self.config.metrics_file.display(),
            "batch simulation started"
        );

        for simulation_id in 0..self.config.num_simulations {
            let seed = base_seed.wrapping_add(simulation_id as u64);
            for algorithm in Algorithm::ALL {
                for distance_metric in DistanceMetric::ALL {
                    let mut run_config = self.config.clone();
                    run_config.algorithm = algorithm;
                    run_config.distance_metric = distance_metric;
                    run_config.seed = Some(seed);
                    run_config.no_visualization = true;

                    let started = Instant::now();
                    let report = Simulation::new(run_config)?.run()?;
                    self.results.push(BatchResult {
                        simulation_id,
                        report,
                        execution_time: started.elapsed(),
                    });
                }
            }

            info!(
                completed = self.results.len(),
                total,
                elapsed = ?self.start_time.elapsed(),
                "batch progress"
            );
        }

        info!(
            results = self.results.len(),
            elapsed = ?self.start_time.elapsed(),
            "batch simulation completed"
        );
        Ok(())
    }

    pub fn print_summary(&self) {
        if self.results.is_empty() {
            println!("No results to summarize.");
            return;
        }

        let mut groups: BTreeMap<(Algorithm, DistanceMetric), Vec<&BatchResult>> = BTreeMap::new();
        for result in &self.results {
            groups
                .entry((result.report.algorithm, result.report.distance_metric))
                .or_default()
                .push(result);
        }

        println!("\n=== BATCH SIMULATION SUMMARY ===");
        println!(
            "{:<10} {:<10} {:>5} {:>10} {:>12} {:>11} {:>9} {:>11} {:>10}",
            "Algorithm", "Metric", "Runs", "Completed", "Nodes/Path", "Avg Length", "Escaped", "Efficiency", "Time"
        );
        println!("{}", "-".repeat(96));

        for ((algorithm, metric), results) in groups {
            let runs = results.len() as f64;
            let average = |f: &dyn Fn(&BatchResult) -> f64| results.iter().map(|&r| f(r)).sum::<f64>() / runs;

            println!(
                "{:<10} {:<10} {:>5} {:>10.1} {:>12.2} {:>11.2} {:>9.1} {:>11.3} {:>10}",
                algorithm.name(),
                metric,
                results.len(),
                average(&|r| r.report.metrics.paths_completed as f64),
                average(&|r| r.report.average_nodes_expanded()),
                average(&|r| r.report.average_route_length()),
                average(&|r| r.report.enemies_escaped as f64),
                average(&|r| r.report.route_efficiency()),
                format!("{:.2?}", Duration::from_secs_f64(average(&|r| r.execution_time.as_secs_f64()))),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn every_combination_shares_each_seed() {
        let metrics_file = std::env::temp_dir().join(format!("batch_metrics_{}.csv", std::process::id()));
        let _ = std::fs::remove_file(&metrics_file);
        let config = Config::parse_from([
            "tower_pathfinding",
            "--batch-mode",
            "--columns",
            "6",
            "--rows",
            "4",
            "--num-paths",
            "2",
            "--frames",
            "40",
            "--num-simulations",
            "2",
            "--seed",
            "5",
            "--metrics-file",
            metrics_file.to_str().unwrap(),
        ]);

        let mut batch = BatchSimulation::new(config);
        batch.run().unwrap();

        assert_eq!(batch.results().len(), 2 * 9);
        for result in batch.results() {
            assert_eq!(result.report.seed, 5 + result.simulation_id as u64);
            assert_eq!(result.report.frames, 40);
        }

        let rows = crate::metrics::MetricsLog::new(&metrics_file).read().unwrap();
        assert_eq!(rows.len(), 18);
        std::fs::remove_file(&metrics_file).unwrap();
    }
}
