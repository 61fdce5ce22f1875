use rand::rngs::StdRng;
use rand::SeedableRng;
use tour_planner::common::DomainError;
use tour_planner::domains::arena::{
    format_layout, parse_layout, random_layout, Arena, ArenaSpec, Facing, Heading, ObstacleRecord, Pose,
};

#[test]
fn test_parse_layout() {
    let records = parse_layout("75,25,T,1; 45,155,b,2;155,155,L,3;").unwrap();
    assert_eq!(
        records,
        vec![
            ObstacleRecord { x: 75, y: 25, facing: Facing::Top, id: 1 },
            ObstacleRecord { x: 45, y: 155, facing: Facing::Bottom, id: 2 },
            ObstacleRecord { x: 155, y: 155, facing: Facing::Left, id: 3 },
        ]
    );
    assert!(parse_layout("").unwrap().is_empty());
    assert!(parse_layout(" ; ").unwrap().is_empty());
}

#[test]
fn test_parse_layout_rejects_malformed_entries() {
    for input in ["75,25,T", "75,25,T,1,9", "x,25,T,1", "75,25,Q,1", "75,25,T,-1", "75.5,25,T,1"] {
        match parse_layout(input) {
            Err(DomainError::InvalidLayout { .. }) => {}
            other => panic!("Expected InvalidLayout for '{}', got {:?}", input, other),
        }
    }
}

#[test]
fn test_format_layout_matches_input_format() {
    let input = "75,25,T,1;45,155,B,2;155,155,L,3;185,105,R,4";
    let records = parse_layout(input).unwrap();
    assert_eq!(format_layout(&records), input);
}

#[test]
fn test_arena_rejects_obstacles_off_grid() {
    let spec = ArenaSpec::default();
    let cases = [
        ("70,25,T,1", 1),
        ("75,205,T,2", 2),
        ("-5,25,T,3", 3),
    ];
    for (layout, expected) in cases {
        match Arena::from_records(spec, &parse_layout(layout).unwrap()) {
            Err(DomainError::ObstacleOutOfArena { id, .. }) => assert_eq!(id, expected),
            other => panic!("Expected ObstacleOutOfArena for '{}', got {:?}", layout, other.map(|_| ())),
        }
    }
}

#[test]
fn test_arena_rejects_duplicate_ids() {
    let records = parse_layout("75,25,T,1;45,155,B,1").unwrap();
    match Arena::from_records(ArenaSpec::default(), &records) {
        Err(DomainError::DuplicateObstacle { id }) => assert_eq!(id, 1),
        other => panic!("Expected DuplicateObstacle, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_approach_poses_face_the_image() {
    let records = parse_layout("75,25,T,1;45,155,B,2;155,155,L,3;185,105,R,4").unwrap();
    let arena = Arena::from_records(ArenaSpec::default(), &records).unwrap();

    let expected = [
        (1, 75.0, 55.0, Heading::South),
        (2, 45.0, 125.0, Heading::North),
        (3, 125.0, 155.0, Heading::East),
        (4, 215.0, 105.0, Heading::West),
    ];
    for (id, x, y, heading) in expected {
        let approach = arena.obstacle(id).unwrap().approach_pose();
        assert_eq!((approach.x, approach.y, approach.heading()), (x, y, heading), "obstacle {}", id);
    }
    assert!(arena.is_valid_position(&arena.obstacle(1).unwrap().approach_pose()));
    assert!(!arena.is_valid_position(&arena.obstacle(4).unwrap().approach_pose()));
}

#[test]
fn test_validity_checks() {
    let arena = Arena::from_records(ArenaSpec::default(), &parse_layout("75,25,T,1").unwrap()).unwrap();

    assert!(arena.is_valid_position(&Pose::new(15.0, 15.0, 90.0)));
    // Wall margin.
    assert!(!arena.is_valid_position(&Pose::new(5.0, 15.0, 90.0)));
    assert!(!arena.is_valid_position(&Pose::new(195.0, 100.0, 90.0)));
    // Safety square is exclusive at its edge.
    assert!(arena.is_valid_position(&Pose::new(75.0, 45.0, 90.0)));
    assert!(!arena.is_valid_position(&Pose::new(75.0, 44.0, 90.0)));
    assert!(!arena.is_valid_position(&Pose::new(60.0, 30.0, 90.0)));
    assert!(arena.is_valid_position(&Pose::new(55.0, 30.0, 90.0)));
}

#[test]
fn test_random_layout_is_valid() {
    let spec = ArenaSpec::default();
    for seed in 0..20u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let records = random_layout(&mut rng, &spec, 5);
        assert!(!records.is_empty());
        assert!(records.len() <= 5);

        let arena = Arena::from_records(spec, &records).unwrap();
        for (i, a) in arena.obstacles().iter().enumerate() {
            assert_eq!(a.id, i as u32 + 1);
            for b in &arena.obstacles()[i + 1..] {
                let apart = (a.x - b.x).abs() >= 2.0 * spec.obstacle_clearance
                    || (a.y - b.y).abs() >= 2.0 * spec.obstacle_clearance;
                assert!(apart, "{} and {} overlap", a, b);
            }
        }
        // Round trip through the text format.
        assert_eq!(parse_layout(&format_layout(&records)).unwrap(), records);
    }
}

#[test]
fn test_random_layout_in_arena_without_interior_cells() {
    let mut rng = StdRng::seed_from_u64(3);
    for (width, height) in [(20.0, 200.0), (200.0, 10.0), (0.0, 0.0)] {
        let spec = ArenaSpec {
            width,
            height,
            ..ArenaSpec::default()
        };
        assert!(random_layout(&mut rng, &spec, 4).is_empty());
    }

    let spec = ArenaSpec {
        width: 30.0,
        height: 30.0,
        ..ArenaSpec::default()
    };
    let records = random_layout(&mut rng, &spec, 4);
    assert_eq!(records, vec![ObstacleRecord { x: 15, y: 15, facing: records[0].facing, id: 1 }]);
}
