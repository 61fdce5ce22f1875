use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::events::ExecutionEvent;
use super::robot::Robot;
use crate::domains::arena::{ObstacleId, Pose};
use crate::domains::logger::DynLogger;
use crate::domains::motion::{
    Actuator, MotionCommand, PerimeterScanCommand, Recognition, Recognizer, TickContext, TickOutcome,
};
use crate::domains::route_planning::{Route, RoutePlanner};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSettings {
    /// Straight length of each side of the fixed perimeter loop.
    pub perimeter_leg_distance: f64,
    /// Ticks between recognition polls during a perimeter scan.
    pub perimeter_poll_interval: u32,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            perimeter_leg_distance: 40.0,
            perimeter_poll_interval: 10,
        }
    }
}

/// Bookkeeping for the marker interrupt in flight. Exists from the moment a
/// marker is confirmed until a new route is committed or the attempt is given
/// up. The cursor stays on the perimeter scan for that whole window and no
/// point scan runs, so a second marker cannot arrive while one is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplanState {
    pub triggering_obstacle: ObstacleId,
    pub obstacles_remaining: Vec<ObstacleId>,
    pub queue_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStatus {
    Running,
    /// The route has no commands left.
    Finished,
}

/// Runs the committed route one tick per control cycle.
pub struct Executor {
    id: String,
    robot: Robot,
    planner: RoutePlanner,
    settings: ExecutionSettings,
    cursor: usize,
    tick: u64,
    replan: Option<ReplanState>,
    exhaustion_reported: bool,
    recognizer: Box<dyn Recognizer>,
    actuator: Box<dyn Actuator>,
    logger: DynLogger,
    uncommitted_events: Vec<ExecutionEvent>,
}

impl Executor {
    /// The robot starts at the planner's start pose.
    pub fn new(
        planner: RoutePlanner,
        settings: ExecutionSettings,
        recognizer: Box<dyn Recognizer>,
        actuator: Box<dyn Actuator>,
        logger: DynLogger,
    ) -> Self {
        let robot = Robot::new(planner.start(), *planner.kinematics());
        Self {
            id: planner.id.clone(),
            robot,
            planner,
            settings,
            cursor: 0,
            tick: 0,
            replan: None,
            exhaustion_reported: false,
            recognizer,
            actuator,
            logger,
            uncommitted_events: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pose(&self) -> Pose {
        self.robot.pose()
    }

    pub fn robot(&self) -> &Robot {
        &self.robot
    }

    pub fn trail(&self) -> &[(f64, f64)] {
        self.robot.trail()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Cycles in which a command was ticked.
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn planner(&self) -> &RoutePlanner {
        &self.planner
    }

    pub fn planner_mut(&mut self) -> &mut RoutePlanner {
        &mut self.planner
    }

    pub fn route(&self) -> &Route {
        self.planner.route()
    }

    pub fn current_command(&self) -> Option<&MotionCommand> {
        self.planner.route().commands.get(self.cursor)
    }

    pub fn replan_state(&self) -> Option<&ReplanState> {
        self.replan.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.planner
            .route()
            .commands
            .iter()
            .skip(self.cursor)
            .all(|c| c.total_ticks() == 0)
    }

    pub fn uncommitted_events(&self) -> &[ExecutionEvent] {
        &self.uncommitted_events
    }

    pub fn mark_events_as_committed(&mut self) {
        self.uncommitted_events.clear();
    }

    /// One control cycle: ticks the command under the cursor exactly once.
    pub fn advance(&mut self) -> CycleStatus {
        self.robot.record_trail();

        let len = self.planner.route().commands.len();
        while self.cursor < len && self.planner.route().commands[self.cursor].total_ticks() == 0 {
            self.cursor += 1;
        }
        if self.cursor >= len {
            self.report_exhausted();
            return CycleStatus::Finished;
        }

        self.tick += 1;
        let index = self.cursor;
        let (outcome, obstacle_id) = {
            let Self {
                planner,
                robot,
                recognizer,
                actuator,
                ..
            } = self;
            let command = &mut planner.route_mut().commands[index];
            let mut ctx = TickContext {
                driver: robot,
                actuator: actuator.as_mut(),
                recognizer: recognizer.as_mut(),
            };
            (command.tick(&mut ctx), command.obstacle_id())
        };

        match (outcome, obstacle_id) {
            (TickOutcome::Recognized(Recognition::Marker), Some(id)) => {
                if self.on_marker(index, id) {
                    return CycleStatus::Running;
                }
            }
            (TickOutcome::Recognized(Recognition::Target(label)), Some(id)) => {
                self.logger
                    .info(&format!("Obstacle {} recognised as '{}'", id, label));
                self.emit(ExecutionEvent::ImageRecognized {
                    executor_id: self.id.clone(),
                    obstacle_id: id,
                    label,
                    timestamp: Utc::now(),
                });
                self.visit(id);
            }
            (TickOutcome::Recognized(Recognition::Nothing), Some(id)) => self.visit(id),
            (TickOutcome::TargetFound(label), Some(id)) => {
                if self.on_perimeter_target(id, label) {
                    return CycleStatus::Running;
                }
            }
            _ => {}
        }

        if self
            .planner
            .route()
            .commands
            .get(index)
            .is_some_and(MotionCommand::is_complete)
        {
            self.complete_command(index);
        }
        CycleStatus::Running
    }

    /// Advances until the route is exhausted or `max_cycles` cycles have run.
    /// Returns the number of cycles that ticked a command.
    pub fn run_to_completion(&mut self, max_cycles: u64) -> u64 {
        let mut cycles = 0;
        while cycles < max_cycles && self.advance() == CycleStatus::Running {
            cycles += 1;
        }
        cycles
    }

    /// Replaces the scan at `index` with a fresh perimeter scan. Returns
    /// false when no side of the obstacle can be driven to, in which case the
    /// scan completes as usual and the route carries on.
    fn on_marker(&mut self, index: usize, obstacle_id: ObstacleId) -> bool {
        let legs = match self.planner.perimeter_legs(
            obstacle_id,
            self.robot.pose(),
            self.settings.perimeter_leg_distance,
        ) {
            Ok(legs) => legs,
            Err(e) => {
                self.logger.warn(&e.to_string());
                Vec::new()
            }
        };
        if legs.is_empty() {
            self.logger.warn(&format!(
                "Marker at obstacle {} but no perimeter can be driven; continuing the route",
                obstacle_id
            ));
            return false;
        }

        self.logger.info(&format!(
            "Marker at obstacle {}, starting perimeter scan over {} legs",
            obstacle_id,
            legs.len()
        ));
        let mut scan = PerimeterScanCommand::new(obstacle_id, legs, self.settings.perimeter_poll_interval);
        scan.reset();
        self.planner.route_mut().commands[index] = MotionCommand::PerimeterScan(scan);

        self.replan = Some(ReplanState {
            triggering_obstacle: obstacle_id,
            obstacles_remaining: self
                .planner
                .remaining_obstacles()
                .into_iter()
                .filter(|id| *id != obstacle_id)
                .collect(),
            queue_index: index,
        });
        self.emit(ExecutionEvent::MarkerDetected {
            executor_id: self.id.clone(),
            obstacle_id,
            index,
            timestamp: Utc::now(),
        });
        true
    }

    /// Returns true when a new route was committed and the cursor rewound.
    fn on_perimeter_target(&mut self, obstacle_id: ObstacleId, label: String) -> bool {
        let pose = self.robot.pose();
        self.emit(ExecutionEvent::PerimeterTargetFound {
            executor_id: self.id.clone(),
            obstacle_id,
            label,
            pose,
            timestamp: Utc::now(),
        });

        let trigger = self
            .replan
            .take()
            .map_or(obstacle_id, |state| state.triggering_obstacle);
        match self.planner.interrupt_and_recalculate(trigger, pose) {
            Ok(()) => {
                self.rewind();
                true
            }
            Err(e) => {
                self.logger
                    .warn(&format!("{}; continuing the perimeter scan", e));
                false
            }
        }
    }

    fn rewind(&mut self) {
        self.cursor = 0;
        self.exhaustion_reported = false;
        self.logger.info(&format!(
            "New route committed with {} commands, visiting {:?}",
            self.planner.route().commands.len(),
            self.planner.route().visit_order
        ));
    }

    fn visit(&mut self, obstacle_id: ObstacleId) {
        if let Err(e) = self.planner.mark_visited(obstacle_id) {
            self.logger.warn(&e.to_string());
        }
    }

    fn complete_command(&mut self, index: usize) {
        let Some(command) = self.planner.route().commands.get(index) else {
            return;
        };
        let message = command.to_wire_message();
        let perimeter = match command {
            MotionCommand::PerimeterScan(scan) => Some((scan.obstacle_id(), scan.target_found())),
            _ => None,
        };

        if let Some((obstacle_id, target_found)) = perimeter {
            self.emit(ExecutionEvent::PerimeterScanCompleted {
                executor_id: self.id.clone(),
                obstacle_id,
                target_found,
                timestamp: Utc::now(),
            });
        }
        self.emit(ExecutionEvent::CommandCompleted {
            executor_id: self.id.clone(),
            index,
            message,
            pose: self.robot.pose(),
            tick: self.tick,
            timestamp: Utc::now(),
        });
        self.cursor = index + 1;

        if let Some((obstacle_id, _)) = perimeter {
            if self.replan.take().is_some() {
                self.logger.warn(&format!(
                    "Perimeter scan of obstacle {} found no target",
                    obstacle_id
                ));
            }
        }
        if self.cursor >= self.planner.route().commands.len() {
            self.report_exhausted();
        }
    }

    fn report_exhausted(&mut self) {
        if self.exhaustion_reported {
            return;
        }
        self.exhaustion_reported = true;
        let planned_duration = self.planner.route().total_duration();
        self.logger.info(&format!(
            "Route exhausted after {} ticks, planned duration {:.2}s",
            self.tick, planned_duration
        ));
        self.emit(ExecutionEvent::RouteExhausted {
            executor_id: self.id.clone(),
            planned_duration,
            ticks: self.tick,
            timestamp: Utc::now(),
        });
    }

    fn emit(&mut self, event: ExecutionEvent) {
        self.uncommitted_events.push(event);
    }
}
