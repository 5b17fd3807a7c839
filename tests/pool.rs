use tower_pathfinding::agent::Enemy;
use tower_pathfinding::algorithms::{Algorithm, DistanceMetric};
use tower_pathfinding::{Grid, GridOracle, PathPool, Point, SearchSettings, StepOutcome};

fn run_until_idle(pool: &mut PathPool, grid: &Grid, settings: &SearchSettings) {
    for _ in 0..10_000 {
        if pool.update(grid, settings) == StepOutcome::Idle {
            return;
        }
    }
    panic!("pool never finished");
}

fn adjacent(a: Point, b: Point, tile: i32) -> bool {
    a != b && (a.x - b.x).abs() <= tile && (a.y - b.y).abs() <= tile
}

#[test]
fn partial_path_from_the_exit_lane_completes_immediately() {
    let grid = Grid::new(4, 3, 32).unwrap();
    let mut pool = PathPool::seeded(1);

    let (id, waypoint) = pool.get_partial_path(Point::new(-32, 0), &grid);
    assert_eq!(waypoint, Point::new(-32, 0));

    let outcome = pool.update(&grid, &SearchSettings::default());
    assert_eq!(outcome, StepOutcome::Completed { expanded: 1, length: 1 });
    assert_eq!(pool.path(id).unwrap().points(), &[Point::new(-32, 0)]);

    let metrics = pool.metrics().get(Algorithm::AStar);
    assert_eq!(metrics.paths_completed, 1);
    assert_eq!(metrics.paths_attempted, 1);
    assert_eq!(metrics.total_path_length, 1);
}

#[test]
fn stranded_enemies_share_partial_paths() {
    let grid = Grid::new(4, 3, 32).unwrap();
    let mut pool = PathPool::seeded(2);

    let (first, _) = pool.get_partial_path(Point::new(64, 32), &grid);
    let (second, _) = pool.get_partial_path(Point::new(64, 32), &grid);

    assert_eq!(first, second);
    assert_eq!(pool.partial_count(), 1);
}

#[test]
fn every_strategy_fills_the_pool_with_valid_routes() {
    let mut grid = Grid::new(10, 6, 32).unwrap();
    for row in 1..5 {
        grid.block(Point::new(160, row * 32));
    }

    for algorithm in Algorithm::ALL {
        for distance_metric in DistanceMetric::ALL {
            let settings = SearchSettings { algorithm, distance_metric };
            let mut pool = PathPool::seeded(3);
            pool.precompute(5, &grid);
            run_until_idle(&mut pool, &grid, &settings);

            assert_eq!(pool.completed_count(), 5);
            for path in pool.paths() {
                let route = path.points();
                assert_eq!(route.first(), Some(&path.start()));
                assert!(route.last().unwrap().is_exit());
                assert!(route.iter().all(|p| !grid.is_blocked(*p)));
                assert!(route.windows(2).all(|w| adjacent(w[0], w[1], 32)));
            }
            assert_eq!(pool.metrics().get(algorithm).paths_completed, 5);
        }
    }
}

#[test]
fn frontier_and_visited_never_overlap() {
    let mut grid = Grid::new(12, 8, 32).unwrap();
    for row in 0..6 {
        grid.block(Point::new(192, row * 32));
    }
    let mut pool = PathPool::seeded(4);
    pool.precompute(3, &grid);
    let settings = SearchSettings {
        algorithm: Algorithm::Dijkstra,
        distance_metric: DistanceMetric::Euclidean,
    };

    while pool.update(&grid, &settings) != StepOutcome::Idle {
        for path in pool.paths() {
            assert!(path.frontier().is_disjoint(path.visited()));
        }
    }
}

#[test]
fn cutting_the_only_route_restarts_the_search() {
    let mut grid = Grid::new(3, 1, 32).unwrap();
    let mut pool = PathPool::seeded(5);
    pool.precompute(1, &grid);
    run_until_idle(&mut pool, &grid, &SearchSettings::default());
    assert_eq!(pool.completed_count(), 1);

    let blocked = Point::new(32, 0);
    assert!(pool.is_critical(blocked, &grid));
    grid.block(blocked);
    pool.repair(blocked, &grid);

    assert_eq!(pool.completed_count(), 0);
    assert!(matches!(
        pool.update(&grid, &SearchSettings::default()),
        StepOutcome::Stalled { .. }
    ));
}

#[test]
fn enemies_walk_their_route_to_the_exit() {
    let grid = Grid::new(6, 4, 32).unwrap();
    let mut pool = PathPool::seeded(6);
    pool.precompute(2, &grid);
    run_until_idle(&mut pool, &grid, &SearchSettings::default());

    let id = pool.get_path(&grid);
    let route = pool.path(id).unwrap().points().to_vec();
    let mut enemy = Enemy::new(route[0], id);

    for _ in 0..route.len() {
        if enemy.has_escaped() {
            break;
        }
        enemy.advance(&mut pool, &grid);
    }

    assert!(enemy.has_escaped());
    assert_eq!(enemy.steps, route.len() - 1);
    assert_eq!(enemy.reroutes, 0);
}
