use std::fs;
use std::path::PathBuf;

use clap::Parser;
use tower_pathfinding::algorithms::Algorithm;
use tower_pathfinding::config::Config;
use tower_pathfinding::metrics::{AlgorithmMetrics, MetricsLog, MetricsRecord};
use tower_pathfinding::simulation::Simulation;
use tower_pathfinding::statistics::summarize_file;
use tower_pathfinding::Error;

fn temp_file(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("{}_{}.csv", name, std::process::id()));
    let _ = fs::remove_file(&path);
    path
}

#[test]
fn headless_run_logs_one_metrics_row() {
    let metrics_file = temp_file("simulation_metrics");
    let config = Config::parse_from([
        "tower_pathfinding",
        "--no-visualization",
        "--columns",
        "10",
        "--rows",
        "6",
        "--num-paths",
        "4",
        "--frames",
        "300",
        "--num-defences",
        "8",
        "--defence-interval",
        "10",
        "--seed",
        "42",
        "--metrics-file",
        metrics_file.to_str().unwrap(),
    ]);

    let mut simulation = Simulation::new(config).unwrap();
    let report = simulation.run().unwrap();

    assert_eq!(report.frames, 300);
    assert_eq!(report.seed, 42);
    assert_eq!(report.enemies_spawned, 15);
    assert!(report.defences_placed <= 8);
    assert_eq!(report.defences_placed, simulation.grid().blocked_count());
    assert!(report.metrics.paths_completed > 0);
    assert_eq!(
        report.enemies_spawned,
        simulation.enemies().len() + report.enemies_escaped
    );

    let rows = MetricsLog::new(&metrics_file).read().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].algorithm, Algorithm::AStar);
    assert_eq!(rows[0].paths_completed, report.metrics.paths_completed);

    fs::remove_file(&metrics_file).unwrap();
}

#[test]
fn same_seed_gives_the_same_run() {
    let metrics_file = temp_file("seeded_metrics");
    let run = || {
        let config = Config::parse_from([
            "tower_pathfinding",
            "--no-visualization",
            "--columns",
            "8",
            "--rows",
            "5",
            "--frames",
            "150",
            "--seed",
            "9",
            "--metrics-file",
            metrics_file.to_str().unwrap(),
        ]);
        Simulation::new(config).unwrap().run().unwrap()
    };

    let first = run();
    let second = run();
    assert_eq!(first.metrics, second.metrics);
    assert_eq!(first.defences_placed, second.defences_placed);
    assert_eq!(first.enemies_escaped, second.enemies_escaped);

    fs::remove_file(&metrics_file).unwrap();
}

#[test]
fn summary_averages_logged_runs() {
    let input = temp_file("summary_input");
    let output = temp_file("summary_output");

    let mut writer = csv::Writer::from_path(&input).unwrap();
    for i in 0..10u64 {
        let metrics = AlgorithmMetrics {
            paths_completed: 10 + i,
            nodes_expanded: 100,
            total_path_length: 200 + 2 * i,
            paths_attempted: 10 + i,
        };
        writer.serialize(MetricsRecord::new(Algorithm::Dijkstra, metrics)).unwrap();
    }
    writer.serialize(MetricsRecord::new(Algorithm::Greedy, AlgorithmMetrics::default())).unwrap();
    writer.flush().unwrap();
    drop(writer);

    let summary = summarize_file(&input, &output, 10).unwrap();
    assert_eq!(summary.len(), 1);
    assert_eq!(summary[0].algorithm, Algorithm::Dijkstra);
    assert_eq!(summary[0].avg_paths_completed, 14.5);
    assert_eq!(summary[0].avg_nodes_expanded, 100.0);
    assert_eq!(summary[0].avg_path_length, 209.0);

    let text = fs::read_to_string(&output).unwrap();
    assert_eq!(
        text.lines().next(),
        Some("algorithm,avg_paths_completed,avg_nodes_expanded,avg_path_length,avg_paths_attempted")
    );

    let err = summarize_file(&input, &output, 11).unwrap_err();
    assert!(matches!(err, Error::NotEnoughRuns { needed: 11, .. }));

    fs::remove_file(&input).unwrap();
    fs::remove_file(&output).unwrap();
}
