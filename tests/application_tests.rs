use tour_planner::adapters::inbound::{ChannelRecognizer, RecognitionEndpoint, RecognitionReply, ScriptedRecognizer};
use tour_planner::adapters::outbound::{init_noop_logger, JsonLinesEventLog, MemoryEventLog, RecordingActuator};
use tour_planner::application::MissionService;
use tour_planner::common::{ApplicationError, DomainError};
use tour_planner::domains::arena::{parse_layout, Pose};
use tour_planner::domains::execution::CycleStatus;
use tour_planner::domains::motion::ScanKind;
use tour_planner::Config;

fn service() -> MissionService {
    MissionService::new(Config::default(), init_noop_logger())
}

#[test]
fn test_plan_layout() {
    let (planner, planned) = service().plan_layout("75,25,T,1;155,155,L,3").unwrap();

    assert!(planned.complete);
    assert_eq!(planned.visit_order, vec![1, 3]);
    assert!(planned.unreached.is_empty());
    assert_eq!(planned.wire_messages, planned.route.wire_messages());
    assert_eq!(planned.route, *planner.route());
    assert!((planned.total_duration - planned.route.total_duration()).abs() < 1e-12);
    assert_eq!(planned.route.start, Config::default().start_pose());
}

#[test]
fn test_plan_route_reports_unreached_obstacles() {
    let records = parse_layout("75,25,T,1;185,105,R,2").unwrap();
    let (_, planned) = service()
        .plan_route(&records, Pose::new(15.0, 15.0, 90.0))
        .unwrap();

    assert!(!planned.complete);
    assert_eq!(planned.visit_order, vec![1]);
    assert_eq!(planned.unreached, vec![2]);
    assert_eq!(planned.wire_messages.last().map(String::as_str), Some("P___1"));
}

#[test]
fn test_plan_layout_rejects_invalid_input() {
    match service().plan_layout("75,25,X,1") {
        Err(ApplicationError::Domain(DomainError::InvalidLayout { .. })) => {}
        other => panic!("Expected InvalidLayout, got {:?}", other.map(|(_, p)| p.visit_order)),
    }
    match service().plan_layout("75,25,T,1;75,25,T,1") {
        Err(ApplicationError::Domain(DomainError::DuplicateObstacle { id })) => assert_eq!(id, 1),
        other => panic!("Expected DuplicateObstacle, got {:?}", other.map(|(_, p)| p.visit_order)),
    }
}

#[test]
fn test_mission_publishes_correlated_events() {
    let service = service();
    let (planner, planned) = service.plan_layout("75,25,T,2").unwrap();
    let planned_ticks = planned.route.total_ticks();

    let actuator = RecordingActuator::new();
    let mut mission = service.start_mission(
        planner,
        Box::new(ScriptedRecognizer::new().with_label(2, "A")),
        Box::new(actuator.clone()),
    );
    let mut log = MemoryEventLog::new();
    let ticks = mission.run(100_000, &mut log).unwrap();

    assert_eq!(ticks, planned_ticks);
    assert!(mission.executor().is_finished());
    assert_eq!(actuator.messages(), planned.wire_messages);

    let types = log.event_types();
    assert_eq!(&types[..2], &["PlanningStarted", "TourCommitted"]);
    assert_eq!(types.last(), Some(&"RouteExhausted"));
    let ticking = planned.route.commands.iter().filter(|c| c.total_ticks() > 0).count();
    assert_eq!(log.count("CommandCompleted"), ticking);
    assert_eq!(log.count("ImageRecognized"), 1);
    assert_eq!(log.count("ObstacleVisited"), 1);

    let correlation = mission.correlation_id();
    assert!(log
        .envelopes()
        .iter()
        .all(|e| e.metadata.correlation_id == Some(correlation)));
    assert!(log
        .envelopes()
        .iter()
        .filter(|e| e.event_type == "TourCommitted")
        .all(|e| e.aggregate_type == "RoutePlanner"));
    assert!(log
        .envelopes()
        .iter()
        .filter(|e| e.event_type == "CommandCompleted")
        .all(|e| e.aggregate_type == "Executor"));
    assert_eq!(
        log.envelopes().last().and_then(|e| e.metadata.tick),
        Some(planned_ticks)
    );

    // Nothing is published twice.
    assert_eq!(mission.publish_events(&mut log).unwrap(), 0);
}

#[test]
fn test_mission_writes_json_lines() {
    let service = service();
    let (planner, _) = service.plan_layout("75,25,T,2").unwrap();
    let mut mission = service.start_mission(
        planner,
        Box::new(ScriptedRecognizer::new()),
        Box::new(RecordingActuator::new()),
    );

    let mut sink = JsonLinesEventLog::new(Vec::new());
    mission.run(100_000, &mut sink).unwrap();
    let written = sink.written();
    let output = String::from_utf8(sink.into_inner()).unwrap();

    let lines: Vec<serde_json::Value> = output
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), written);
    assert_eq!(lines[0]["event_type"], "PlanningStarted");
    assert_eq!(lines[lines.len() - 1]["event_type"], "RouteExhausted");
    assert!(lines.iter().all(|l| l["metadata"]["source"] == "tour-planner"));
}

#[test]
fn test_mission_stops_at_tick_limit() {
    let service = service();
    let (planner, _) = service.plan_layout("75,25,T,2").unwrap();
    let mut mission = service.start_mission(
        planner,
        Box::new(ScriptedRecognizer::new()),
        Box::new(RecordingActuator::new()),
    );

    let mut log = MemoryEventLog::new();
    assert_eq!(mission.run(7, &mut log).unwrap(), 7);
    assert!(!mission.executor().is_finished());
    assert_eq!(mission.executor().tick_count(), 7);
    assert_eq!(log.count("RouteExhausted"), 0);
}

#[tokio::test]
async fn test_realtime_run_is_paced() {
    let service = service();
    let (planner, _) = service.plan_layout("75,25,T,2").unwrap();
    let mut mission = service.start_mission(
        planner,
        Box::new(ScriptedRecognizer::new()),
        Box::new(RecordingActuator::new()),
    );

    let mut log = MemoryEventLog::new();
    let started = std::time::Instant::now();
    let ticks = mission.run_realtime(5, &mut log).await.unwrap();

    assert_eq!(ticks, 5);
    assert_eq!(mission.executor().tick_count(), 5);
    // First interval tick completes immediately, the other four wait 20ms each.
    assert!(started.elapsed() >= std::time::Duration::from_millis(70));
}

#[tokio::test]
async fn test_channel_recognizer_answers_asynchronously() {
    let service = service();
    let (planner, _) = service.plan_layout("75,25,T,2").unwrap();

    let (recognizer, endpoint) = ChannelRecognizer::new(4);
    let RecognitionEndpoint { mut requests, replies } = endpoint;
    let responder = tokio::spawn(async move {
        let mut served = Vec::new();
        while let Some(request) = requests.recv().await {
            served.push(request);
            let reply = RecognitionReply {
                request,
                label: Some("7".to_string()),
            };
            if replies.send(reply).await.is_err() {
                break;
            }
        }
        served
    });

    let mut mission = service.start_mission(planner, Box::new(recognizer), Box::new(RecordingActuator::new()));
    let mut log = MemoryEventLog::new();
    let mut cycles = 0;
    while mission.executor_mut().advance() == CycleStatus::Running {
        mission.publish_events(&mut log).unwrap();
        tokio::task::yield_now().await;
        cycles += 1;
        assert!(cycles < 100_000, "mission never finished");
    }
    mission.publish_events(&mut log).unwrap();

    assert_eq!(log.count("ImageRecognized"), 1);
    assert_eq!(mission.executor().planner().visited(), &[2]);
    // The reply arrives at least one cycle after the request went out.
    assert!(mission.executor().tick_count() > planned_ticks_of(&mission));

    drop(mission);
    let served = responder.await.unwrap();
    assert_eq!(served.len(), 1);
    assert_eq!(served[0].obstacle_id, 2);
    assert_eq!(served[0].kind, ScanKind::Point);
}

fn planned_ticks_of(mission: &tour_planner::application::Mission) -> u64 {
    mission.executor().route().total_ticks()
}
