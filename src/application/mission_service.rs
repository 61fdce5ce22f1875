use std::time::Duration;
use uuid::Uuid;

use crate::common::{
    publish_events, publish_uncommitted, ApplicationError, ApplicationResult, EventMetadata, EventSink,
};
use crate::config::Config;
use crate::domains::arena::{parse_layout, Arena, ObstacleId, ObstacleRecord, Pose};
use crate::domains::execution::{CycleStatus, Executor, EXECUTOR_AGGREGATE_TYPE};
use crate::domains::logger::DynLogger;
use crate::domains::motion::{Actuator, Recognizer};
use crate::domains::route_planning::{PlanOutcome, Route, RoutePlanner};

const EVENT_SOURCE: &str = "tour-planner";

/// What a front end needs from a planning run.
#[derive(Debug, Clone)]
pub struct PlannedRoute {
    pub visit_order: Vec<ObstacleId>,
    /// Obstacles a partial tour could not reach. Empty when complete.
    pub unreached: Vec<ObstacleId>,
    pub complete: bool,
    pub wire_messages: Vec<String>,
    pub total_duration: f64,
    pub route: Route,
}

/// Wires configuration, logging and the domain together for one run.
pub struct MissionService {
    config: Config,
    logger: DynLogger,
}

impl MissionService {
    pub fn new(config: Config, logger: DynLogger) -> Self {
        Self { config, logger }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Planning entry point: obstacle records and a start pose in, visit
    /// order and command queue out. A partial tour is not an error.
    pub fn plan_route(&self, obstacles: &[ObstacleRecord], start: Pose) -> ApplicationResult<(RoutePlanner, PlannedRoute)> {
        let arena = Arena::from_records(self.config.arena_spec(), obstacles)?;
        let mut planner = RoutePlanner::new(
            Uuid::new_v4().to_string(),
            arena,
            start,
            self.config.kinematics(),
            self.config.planner_settings(),
        )
        .with_logger(self.logger.clone());

        let outcome = planner.plan()?;
        let route = planner.route().clone();
        let unreached = match &outcome {
            PlanOutcome::Complete { .. } => Vec::new(),
            PlanOutcome::Partial { unreached, .. } => unreached.clone(),
        };
        let planned = PlannedRoute {
            visit_order: outcome.visit_order().to_vec(),
            unreached,
            complete: outcome.is_complete(),
            wire_messages: route.wire_messages(),
            total_duration: route.total_duration(),
            route,
        };
        Ok((planner, planned))
    }

    /// Parses a `"x,y,D,id;..."` layout and plans from the configured start.
    pub fn plan_layout(&self, layout: &str) -> ApplicationResult<(RoutePlanner, PlannedRoute)> {
        let records = parse_layout(layout)?;
        self.plan_route(&records, self.config.start_pose())
    }

    pub fn start_mission(
        &self,
        planner: RoutePlanner,
        recognizer: Box<dyn Recognizer>,
        actuator: Box<dyn Actuator>,
    ) -> Mission {
        Mission {
            executor: Executor::new(
                planner,
                self.config.execution_settings(),
                recognizer,
                actuator,
                self.logger.clone(),
            ),
            tick_rate: self.config.robot.tick_rate,
            correlation_id: Uuid::new_v4(),
        }
    }
}

/// A planned route being executed. Events from the planner and the executor
/// share one correlation id.
pub struct Mission {
    executor: Executor,
    tick_rate: f64,
    correlation_id: Uuid,
}

impl Mission {
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut Executor {
        &mut self.executor
    }

    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    /// Runs flat out until the route is exhausted or `max_ticks` cycles have
    /// ticked, publishing events after every cycle.
    pub fn run(&mut self, max_ticks: u64, sink: &mut dyn EventSink) -> ApplicationResult<u64> {
        self.publish_events(sink)?;
        let mut ticks = 0;
        while ticks < max_ticks {
            let status = self.executor.advance();
            self.publish_events(sink)?;
            if status == CycleStatus::Finished {
                break;
            }
            ticks += 1;
        }
        Ok(ticks)
    }

    /// Like [`Mission::run`] but paced at the configured tick rate.
    pub async fn run_realtime(&mut self, max_ticks: u64, sink: &mut dyn EventSink) -> ApplicationResult<u64> {
        let mut interval = tokio::time::interval(Duration::from_secs_f64(1.0 / self.tick_rate));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        self.publish_events(sink)?;
        let mut ticks = 0;
        while ticks < max_ticks {
            interval.tick().await;
            let status = self.executor.advance();
            self.publish_events(sink)?;
            if status == CycleStatus::Finished {
                break;
            }
            ticks += 1;
        }
        Ok(ticks)
    }

    /// Drains uncommitted planner and executor events into `sink`.
    pub fn publish_events(&mut self, sink: &mut dyn EventSink) -> ApplicationResult<usize> {
        let metadata = EventMetadata {
            correlation_id: Some(self.correlation_id),
            tick: Some(self.executor.tick_count()),
            source: EVENT_SOURCE.to_string(),
        };
        let planned = publish_uncommitted(self.executor.planner_mut(), sink, &metadata)
            .map_err(ApplicationError::EventLog)?;
        let executed = publish_events(
            self.executor.uncommitted_events(),
            EXECUTOR_AGGREGATE_TYPE,
            sink,
            &metadata,
        )
        .map_err(ApplicationError::EventLog)?;
        self.executor.mark_events_as_committed();
        Ok(planned + executed)
    }
}
