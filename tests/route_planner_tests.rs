use rand::rngs::StdRng;
use rand::SeedableRng;
use tour_planner::common::{AggregateRoot, DomainError, DomainEvent};
use tour_planner::domains::arena::{parse_layout, random_layout, Arena, ArenaSpec, ObstacleId, Pose};
use tour_planner::domains::motion::{Kinematics, MotionCommand};
use tour_planner::domains::path_planning::PathSearch;
use tour_planner::domains::route_planning::{
    compress_commands, permutations, tour_length, PlanOutcome, PlannerSettings, PlannerState, Route,
    RoutePlanner, TourStrategy,
};

fn planner_for(layout: &str, settings: PlannerSettings) -> RoutePlanner {
    let arena = Arena::from_records(ArenaSpec::default(), &parse_layout(layout).unwrap()).unwrap();
    RoutePlanner::new(
        "planner-test",
        arena,
        Pose::new(15.0, 15.0, 90.0),
        Kinematics::default(),
        settings,
    )
}

fn planner(layout: &str) -> RoutePlanner {
    planner_for(layout, PlannerSettings::default())
}

fn assert_close(pose: Pose, expected: Pose) {
    assert!((pose.x - expected.x).abs() < 1e-6, "{} != {}", pose, expected);
    assert!((pose.y - expected.y).abs() < 1e-6, "{} != {}", pose, expected);
    assert_eq!(pose.heading(), expected.heading());
}

#[test]
fn test_single_obstacle_tour() {
    let mut planner = planner("75,25,T,2");
    let outcome = planner.plan().unwrap();

    assert_eq!(outcome, PlanOutcome::Complete { visit_order: vec![2] });
    assert_eq!(planner.state(), PlannerState::Committed);

    let route = planner.route();
    assert!(route.complete);
    assert!(!route.commands.is_empty());
    match route.commands.last() {
        Some(MotionCommand::Scan(scan)) => assert_eq!(scan.obstacle_id, 2),
        other => panic!("Expected trailing scan, got {:?}", other),
    }
    let approach = planner.arena().obstacle(2).unwrap().approach_pose();
    assert_close(route.end_pose(), approach);
}

#[test]
fn test_unreachable_obstacle_commits_best_partial_tour() {
    // Obstacle 2's approach pose lies outside the arena.
    let mut planner = planner("75,25,T,1;185,105,R,2");
    let outcome = planner.plan().unwrap();

    match outcome {
        PlanOutcome::Partial { visit_order, unreached } => {
            assert_eq!(visit_order, vec![1]);
            assert_eq!(unreached, vec![2]);
        }
        _ => panic!("Expected partial outcome"),
    }
    assert_eq!(planner.state(), PlannerState::Failed);
    assert!(!planner.route().complete);
    assert_eq!(planner.route().scan_count(), 1);
    assert!(planner.route().references(1));
    assert!(!planner.route().references(2));

    let failures = planner
        .uncommitted_events()
        .iter()
        .filter(|e| e.event_type() == "LegFailed")
        .count();
    assert_eq!(failures, 2);
}

#[test]
fn test_consecutive_straights_are_merged() {
    let kinematics = Kinematics::default();
    let compressed = compress_commands(
        vec![
            MotionCommand::straight(100.0, &kinematics),
            MotionCommand::straight(50.0, &kinematics),
        ],
        &kinematics,
    );
    assert_eq!(compressed, vec![MotionCommand::straight(150.0, &kinematics)]);
    assert_eq!(compressed[0].total_ticks(), 150);
}

#[test]
fn test_compression_keeps_other_commands_in_place() {
    let kinematics = Kinematics::default();
    let compressed = compress_commands(
        vec![
            MotionCommand::straight(10.0, &kinematics),
            MotionCommand::turn(90.0, false, &kinematics),
            MotionCommand::straight(10.0, &kinematics),
            MotionCommand::straight(-10.0, &kinematics),
            MotionCommand::scan(1, &kinematics),
            MotionCommand::straight(20.0, &kinematics),
        ],
        &kinematics,
    );
    assert_eq!(
        compressed,
        vec![
            MotionCommand::straight(10.0, &kinematics),
            MotionCommand::turn(90.0, false, &kinematics),
            MotionCommand::straight(0.0, &kinematics),
            MotionCommand::scan(1, &kinematics),
            MotionCommand::straight(20.0, &kinematics),
        ]
    );
    assert_eq!(compressed[2].total_ticks(), 0);
}

#[test]
fn test_compression_is_idempotent() {
    let kinematics = Kinematics::default();
    let mut planner = planner("75,25,T,1;45,155,B,2;155,155,L,3");
    planner.plan().unwrap();

    let once = planner.route().commands.clone();
    let twice = compress_commands(once.clone(), &kinematics);
    assert_eq!(once, twice);

    let raw = vec![
        MotionCommand::straight(10.0, &kinematics),
        MotionCommand::straight(10.0, &kinematics),
        MotionCommand::turn(-90.0, true, &kinematics),
        MotionCommand::straight(-10.0, &kinematics),
        MotionCommand::scan(4, &kinematics),
    ];
    let first = compress_commands(raw, &kinematics);
    assert_eq!(compress_commands(first.clone(), &kinematics), first);
}

#[test]
fn test_committed_tour_is_shortest_feasible_candidate() {
    let spec = ArenaSpec::default();
    let kinematics = Kinematics::default();
    let start = Pose::new(15.0, 15.0, 90.0);

    for seed in 1..=6u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let records = random_layout(&mut rng, &spec, 3);
        let arena = Arena::from_records(spec, &records).unwrap();
        let mut planner = RoutePlanner::new("p1", arena.clone(), start, kinematics, PlannerSettings::default());
        let outcome = planner.plan().unwrap();
        if !outcome.is_complete() {
            continue;
        }

        let obstacles = arena.obstacles();
        let index_of = |id: ObstacleId| obstacles.iter().position(|o| o.id == id).unwrap();
        let committed: Vec<usize> = outcome.visit_order().iter().map(|id| index_of(*id)).collect();
        let committed_length = tour_length(&start, obstacles, &committed);

        let search = PathSearch::new(&arena, &kinematics, planner.settings().search);
        for order in permutations(obstacles.len()) {
            let mut pose = start;
            let mut feasible = true;
            for &index in &order {
                match search.search(pose, obstacles[index].approach_pose()) {
                    Some(leg) => pose = leg.end_pose,
                    None => {
                        feasible = false;
                        break;
                    }
                }
            }
            if feasible {
                assert!(
                    committed_length <= tour_length(&start, obstacles, &order) + 1e-9,
                    "seed {}: {:?} is shorter than committed {:?}",
                    seed,
                    order,
                    committed
                );
            }
        }
    }
}

#[test]
fn test_replan_drops_marker_obstacle_and_starts_from_given_pose() {
    let mut planner = planner("75,25,T,1;45,155,B,2;155,155,L,3");
    assert!(planner.plan().unwrap().is_complete());

    let current = Pose::new(75.0, 55.0, -90.0);
    planner.interrupt_and_recalculate(1, current).unwrap();

    let route = planner.route();
    assert_eq!(planner.state(), PlannerState::Committed);
    assert_eq!(route.start, current);
    assert!(!route.references(1));
    assert!(!route.visit_order.contains(&1));
    let mut order = route.visit_order.clone();
    order.sort();
    assert_eq!(order, vec![2, 3]);
    assert_eq!(route.scan_count(), 2);
}

#[test]
fn test_replan_skips_visited_obstacles() {
    let mut planner = planner("75,25,T,1;45,155,B,2;155,155,L,3");
    planner.plan().unwrap();
    planner.mark_visited(2).unwrap();

    planner
        .interrupt_and_recalculate(1, Pose::new(75.0, 55.0, -90.0))
        .unwrap();
    assert_eq!(planner.route().visit_order, vec![3]);
    assert_eq!(planner.remaining_obstacles(), vec![3]);
}

#[test]
fn test_replan_with_nothing_left_commits_empty_route() {
    let mut planner = planner("75,25,T,1");
    planner.plan().unwrap();

    let current = Pose::new(75.0, 55.0, -90.0);
    planner.interrupt_and_recalculate(1, current).unwrap();
    assert_eq!(planner.route(), &Route::empty(current));
    assert_eq!(planner.state(), PlannerState::Committed);
}

#[test]
fn test_failed_replan_keeps_previous_route() {
    let mut planner = planner("75,25,T,1;185,105,R,2");
    planner.plan().unwrap();
    let before = planner.route().clone();

    let result = planner.interrupt_and_recalculate(1, Pose::new(75.0, 55.0, -90.0));
    match result {
        Err(DomainError::ReplanFailed { obstacle_id, .. }) => assert_eq!(obstacle_id, 1),
        other => panic!("Expected ReplanFailed, got {:?}", other),
    }
    assert_eq!(planner.route(), &before);
    assert_eq!(planner.state(), PlannerState::Failed);
    assert_eq!(
        planner.uncommitted_events().last().map(|e| e.event_type()),
        Some("ReplanFailed")
    );
}

#[test]
fn test_replan_rejects_unknown_obstacle() {
    let mut planner = planner("75,25,T,1");
    planner.plan().unwrap();
    match planner.interrupt_and_recalculate(42, Pose::new(75.0, 55.0, -90.0)) {
        Err(DomainError::UnknownObstacle { id }) => assert_eq!(id, 42),
        other => panic!("Expected UnknownObstacle, got {:?}", other),
    }
}

#[test]
fn test_replan_before_planning_is_rejected() {
    let mut planner = planner("75,25,T,1");
    assert!(matches!(
        planner.interrupt_and_recalculate(1, Pose::new(75.0, 55.0, -90.0)),
        Err(DomainError::InvalidCommand { .. })
    ));
}

const NINE: &str = "25,105,B,1;65,105,B,2;105,105,B,3;145,105,B,4;185,105,B,5;\
                    25,175,B,6;65,175,B,7;105,175,B,8;145,175,B,9";

#[test]
fn test_exhaustive_search_is_bounded() {
    let mut planner = planner(NINE);
    match planner.plan() {
        Err(DomainError::TooManyObstacles { count, max }) => {
            assert_eq!(count, 9);
            assert_eq!(max, 8);
        }
        other => panic!("Expected TooManyObstacles, got {:?}", other),
    }
    assert_eq!(planner.state(), PlannerState::Idle);
}

#[test]
fn test_nearest_neighbor_strategy_handles_large_sets() {
    let settings = PlannerSettings {
        tour_strategy: TourStrategy::NearestNeighbor,
        ..PlannerSettings::default()
    };
    let mut planner = planner_for(NINE, settings);
    let outcome = planner.plan().unwrap();

    let mut covered: Vec<ObstacleId> = match &outcome {
        PlanOutcome::Complete { visit_order } => visit_order.clone(),
        PlanOutcome::Partial { visit_order, unreached } => {
            visit_order.iter().chain(unreached.iter()).copied().collect()
        }
    };
    covered.sort();
    assert_eq!(covered, (1..=9).collect::<Vec<_>>());
}

#[test]
fn test_empty_layout_commits_empty_route() {
    let mut planner = planner("");
    assert_eq!(planner.plan().unwrap(), PlanOutcome::Complete { visit_order: vec![] });
    assert!(planner.route().is_empty());
    assert_eq!(planner.state(), PlannerState::Committed);
}

#[test]
fn test_planning_records_events() {
    let mut planner = planner("75,25,T,2");
    planner.plan().unwrap();

    let types: Vec<&str> = planner.uncommitted_events().iter().map(|e| e.event_type()).collect();
    assert_eq!(types, vec!["PlanningStarted", "TourCommitted"]);
    assert_eq!(planner.version(), 2);
    assert!(planner
        .uncommitted_events()
        .iter()
        .all(|e| e.aggregate_id() == "planner-test"));

    planner.mark_events_as_committed();
    assert!(planner.uncommitted_events().is_empty());
}

#[test]
fn test_route_totals() {
    let mut planner = planner("75,25,T,2");
    planner.plan().unwrap();
    let route = planner.route();

    assert_eq!(route.wire_messages().len(), route.commands.len());
    assert_eq!(route.wire_messages().last().map(String::as_str), Some("P___2"));
    let expected: f64 = route.commands.iter().map(MotionCommand::duration).sum();
    assert!((route.total_duration() - expected).abs() < 1e-12);
    assert!(route.total_ticks() > 0);
}

#[test]
fn test_domain_root_names_each_event_enum() {
    use tour_planner::domains::{ExecutionEvent, RoutePlanningEvent};

    let mut planner = planner("75,25,T,2");
    planner.plan().unwrap();
    assert!(matches!(
        planner.uncommitted_events().first(),
        Some(RoutePlanningEvent::PlanningStarted { .. })
    ));
    let exhausted = ExecutionEvent::RouteExhausted {
        executor_id: "exec".to_string(),
        planned_duration: 0.0,
        ticks: 0,
        timestamp: chrono::Utc::now(),
    };
    assert_eq!(exhausted.event_type(), "RouteExhausted");
}
