use crate::common::{AggregateRoot, DomainError, DomainResult};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::events::RoutePlanningEvent;
use super::route::{compress_commands, Route};
use super::tour::{nearest_neighbor_tour, ranked_tours, TourStrategy};
use crate::domains::arena::{Arena, Obstacle, ObstacleId, Pose};
use crate::domains::logger::DynLogger;
use crate::domains::motion::{sweep, Kinematics, MotionCommand, PerimeterScanCommand};
use crate::domains::path_planning::{PathSearch, SearchSettings};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlannerSettings {
    /// Ranked tours attempted before falling back to the best partial one.
    pub max_retry: usize,
    /// Largest obstacle set enumerated exhaustively.
    pub max_exhaustive_obstacles: usize,
    pub tour_strategy: TourStrategy,
    pub search: SearchSettings,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            max_retry: 10,
            max_exhaustive_obstacles: 8,
            tour_strategy: TourStrategy::Exhaustive,
            search: SearchSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlannerState {
    Idle,
    Planning,
    Committed,
    Replanning,
    /// No complete tour was feasible; a partial route is committed.
    Failed,
}

/// Result of [`RoutePlanner::plan`]. Both variants leave a committed route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanOutcome {
    Complete {
        visit_order: Vec<ObstacleId>,
    },
    Partial {
        visit_order: Vec<ObstacleId>,
        unreached: Vec<ObstacleId>,
    },
}

impl PlanOutcome {
    pub fn visit_order(&self) -> &[ObstacleId] {
        match self {
            PlanOutcome::Complete { visit_order } => visit_order,
            PlanOutcome::Partial { visit_order, .. } => visit_order,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, PlanOutcome::Complete { .. })
    }
}

struct TourAttempt {
    route: Route,
    /// Obstacle whose leg was infeasible and the pose the leg started from.
    blocked: Option<(ObstacleId, Pose)>,
}

/// Orders obstacle visits, builds the command queue leg by leg and owns the
/// replanning protocol. Every state change goes through an event.
#[derive(Clone)]
pub struct RoutePlanner {
    pub id: String,
    arena: Arena,
    start: Pose,
    kinematics: Kinematics,
    settings: PlannerSettings,
    state: PlannerState,
    route: Route,
    visited: Vec<ObstacleId>,
    /// Obstacles that showed the marker and are never scheduled again.
    excluded: Vec<ObstacleId>,
    version: u64,
    uncommitted_events: Vec<RoutePlanningEvent>,
    logger: Option<DynLogger>,
}

impl RoutePlanner {
    pub fn new(
        id: impl Into<String>,
        arena: Arena,
        start: Pose,
        kinematics: Kinematics,
        settings: PlannerSettings,
    ) -> Self {
        Self {
            id: id.into(),
            arena,
            start,
            kinematics,
            settings,
            state: PlannerState::Idle,
            route: Route::empty(start),
            visited: Vec::new(),
            excluded: Vec::new(),
            version: 0,
            uncommitted_events: Vec::new(),
            logger: None,
        }
    }

    pub fn with_logger(mut self, logger: DynLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn state(&self) -> PlannerState {
        self.state
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub(crate) fn route_mut(&mut self) -> &mut Route {
        &mut self.route
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn start(&self) -> Pose {
        self.start
    }

    pub fn kinematics(&self) -> &Kinematics {
        &self.kinematics
    }

    pub fn settings(&self) -> &PlannerSettings {
        &self.settings
    }

    pub fn visited(&self) -> &[ObstacleId] {
        &self.visited
    }

    /// Obstacles neither scanned nor excluded by a marker, in layout order.
    pub fn remaining_obstacles(&self) -> Vec<ObstacleId> {
        self.arena
            .obstacles()
            .iter()
            .map(|o| o.id)
            .filter(|id| !self.visited.contains(id) && !self.excluded.contains(id))
            .collect()
    }

    /// Plans a tour over every obstacle from the start pose and commits it.
    ///
    /// Tries the `max_retry` shortest candidate tours in order. When none is
    /// fully feasible the partial tour that reached the most obstacles is
    /// committed instead (ties go to the one with fewer commands).
    pub fn plan(&mut self) -> DomainResult<PlanOutcome> {
        if self.state == PlannerState::Replanning {
            return Err(DomainError::InvalidCommand {
                reason: "cannot plan while a replan is in flight".to_string(),
            });
        }

        let obstacles = self.arena.obstacles().to_vec();
        let candidates = self.candidate_orders(&self.start, &obstacles)?;
        let attempts = candidates.len().min(self.settings.max_retry.max(1));

        self.record(RoutePlanningEvent::PlanningStarted {
            planner_id: self.id.clone(),
            obstacle_count: obstacles.len(),
            candidate_count: attempts,
            timestamp: Utc::now(),
        })?;
        self.log_info(&format!(
            "Planning tour over {} obstacles, {} candidate orders",
            obstacles.len(),
            attempts
        ));

        let mut best_partial: Option<Route> = None;
        for (attempt, order) in candidates.iter().take(attempts).enumerate() {
            let TourAttempt { mut route, blocked } = self.walk_tour(self.start, &obstacles, order);
            match blocked {
                None => {
                    route.compress(&self.kinematics);
                    let visit_order = route.visit_order.clone();
                    self.log_info(&format!(
                        "Committed tour {:?} after {} attempt(s), {} commands",
                        visit_order,
                        attempt + 1,
                        route.commands.len()
                    ));
                    self.record(RoutePlanningEvent::TourCommitted {
                        planner_id: self.id.clone(),
                        route,
                        complete: true,
                        attempts: attempt + 1,
                        timestamp: Utc::now(),
                    })?;
                    return Ok(PlanOutcome::Complete { visit_order });
                }
                Some((obstacle_id, from)) => {
                    self.record(RoutePlanningEvent::LegFailed {
                        planner_id: self.id.clone(),
                        obstacle_id,
                        from,
                        attempt: attempt + 1,
                        timestamp: Utc::now(),
                    })?;
                    if is_better_partial(&route, best_partial.as_ref()) {
                        best_partial = Some(route);
                    }
                }
            }
        }

        let mut route = best_partial.unwrap_or_else(|| Route {
            complete: false,
            ..Route::empty(self.start)
        });
        route.compress(&self.kinematics);
        let visit_order = route.visit_order.clone();
        let unreached: Vec<ObstacleId> = obstacles
            .iter()
            .map(|o| o.id)
            .filter(|id| !visit_order.contains(id))
            .collect();

        self.log_warn(&format!(
            "No complete tour found; committing partial tour {:?}, unreached {:?}",
            visit_order, unreached
        ));
        self.record(RoutePlanningEvent::TourCommitted {
            planner_id: self.id.clone(),
            route,
            complete: false,
            attempts,
            timestamp: Utc::now(),
        })?;
        Ok(PlanOutcome::Partial {
            visit_order,
            unreached,
        })
    }

    /// Rebuilds the route from `current` over the obstacles still to visit,
    /// dropping `marker_obstacle`. Only the single best tour is tried; on
    /// failure the previous route stays committed.
    pub fn interrupt_and_recalculate(&mut self, marker_obstacle: ObstacleId, current: Pose) -> DomainResult<()> {
        if self.arena.obstacle(marker_obstacle).is_none() {
            return Err(DomainError::UnknownObstacle { id: marker_obstacle });
        }
        if matches!(self.state, PlannerState::Idle | PlannerState::Replanning) {
            return Err(DomainError::InvalidCommand {
                reason: format!("cannot replan in state {:?}", self.state),
            });
        }

        let remaining: Vec<Obstacle> = self
            .arena
            .obstacles()
            .iter()
            .filter(|o| o.id != marker_obstacle && !self.visited.contains(&o.id) && !self.excluded.contains(&o.id))
            .cloned()
            .collect();

        self.record(RoutePlanningEvent::ReplanStarted {
            planner_id: self.id.clone(),
            marker_obstacle,
            remaining: remaining.iter().map(|o| o.id).collect(),
            from: current,
            timestamp: Utc::now(),
        })?;
        self.log_info(&format!(
            "Marker at obstacle {}, replanning {} obstacles from {}",
            marker_obstacle,
            remaining.len(),
            current
        ));

        let order = match self.candidate_orders(&current, &remaining) {
            Ok(candidates) => candidates.into_iter().next().unwrap_or_default(),
            Err(e) => return self.fail_replan(marker_obstacle, e.to_string()),
        };

        let TourAttempt { mut route, blocked } = self.walk_tour(current, &remaining, &order);
        if let Some((obstacle_id, from)) = blocked {
            return self.fail_replan(
                marker_obstacle,
                format!("no feasible leg to obstacle {} from {}", obstacle_id, from),
            );
        }

        route.compress(&self.kinematics);
        self.log_info(&format!("Replanned tour {:?}", route.visit_order));
        self.record(RoutePlanningEvent::ReplanSucceeded {
            planner_id: self.id.clone(),
            marker_obstacle,
            route,
            timestamp: Utc::now(),
        })
    }

    /// Legs of a perimeter scan of `obstacle_id` starting and ending on
    /// `from`. The fixed loop of `side_distance` sides is used when every
    /// pose along it is valid. Otherwise the legs are planned through the
    /// viewing poses of the obstacle's other sides, skipping any that cannot
    /// be reached or left again. Empty when no side can be visited.
    pub fn perimeter_legs(
        &self,
        obstacle_id: ObstacleId,
        from: Pose,
        side_distance: f64,
    ) -> DomainResult<Vec<MotionCommand>> {
        let obstacle = self
            .arena
            .obstacle(obstacle_id)
            .ok_or(DomainError::UnknownObstacle { id: obstacle_id })?;

        let fixed = PerimeterScanCommand::loop_legs(side_distance, &self.kinematics);
        if self.sweep_is_clear(from, &fixed) {
            return Ok(fixed);
        }

        let search = PathSearch::new(&self.arena, &self.kinematics, self.settings.search);
        let mut legs = Vec::new();
        let mut at = from;
        let mut sides = 0;
        for side in obstacle.facing.others_counter_clockwise() {
            let view = obstacle.viewing_pose(side, self.arena.spec.approach_distance);
            let Some(out) = search.search(at, view) else {
                continue;
            };
            if search.search(out.end_pose, from).is_none() {
                continue;
            }
            legs.extend(out.commands);
            at = out.end_pose;
            sides += 1;
        }
        if sides == 0 {
            self.log_warn(&format!("No side of obstacle {} can be visited for a perimeter scan", obstacle_id));
            return Ok(Vec::new());
        }
        if let Some(back) = search.search(at, from) {
            legs.extend(back.commands);
        }

        let legs = compress_commands(legs, &self.kinematics);
        if !self.sweep_is_clear(from, &legs) {
            self.log_warn(&format!("Planned perimeter of obstacle {} leaves the free space", obstacle_id));
            return Ok(Vec::new());
        }
        self.log_info(&format!(
            "Fixed loop around obstacle {} is blocked, visiting {} side(s) instead",
            obstacle_id, sides
        ));
        Ok(legs)
    }

    fn sweep_is_clear(&self, from: Pose, commands: &[MotionCommand]) -> bool {
        sweep(from, commands)
            .iter()
            .all(|pose| self.arena.is_valid_position(pose))
    }

    /// Records a completed scan so later replans skip the obstacle.
    pub fn mark_visited(&mut self, obstacle_id: ObstacleId) -> DomainResult<()> {
        if self.arena.obstacle(obstacle_id).is_none() {
            return Err(DomainError::UnknownObstacle { id: obstacle_id });
        }
        if self.visited.contains(&obstacle_id) {
            return Ok(());
        }
        self.record(RoutePlanningEvent::ObstacleVisited {
            planner_id: self.id.clone(),
            obstacle_id,
            timestamp: Utc::now(),
        })
    }

    /// Commits a route built elsewhere, e.g. one restored from a log.
    pub fn commit_route(&mut self, route: Route) -> DomainResult<()> {
        if let Some(id) = route.visit_order.iter().find(|id| self.arena.obstacle(**id).is_none()) {
            return Err(DomainError::UnknownObstacle { id: *id });
        }
        let complete = route.complete;
        self.record(RoutePlanningEvent::TourCommitted {
            planner_id: self.id.clone(),
            route,
            complete,
            attempts: 0,
            timestamp: Utc::now(),
        })
    }

    fn fail_replan(&mut self, marker_obstacle: ObstacleId, reason: String) -> DomainResult<()> {
        self.log_warn(&format!(
            "Replan after marker at obstacle {} failed: {}",
            marker_obstacle, reason
        ));
        self.record(RoutePlanningEvent::ReplanFailed {
            planner_id: self.id.clone(),
            marker_obstacle,
            reason: reason.clone(),
            timestamp: Utc::now(),
        })?;
        Err(DomainError::ReplanFailed {
            obstacle_id: marker_obstacle,
            reason,
        })
    }

    fn candidate_orders(&self, start: &Pose, obstacles: &[Obstacle]) -> DomainResult<Vec<Vec<usize>>> {
        match self.settings.tour_strategy {
            TourStrategy::Exhaustive => {
                if obstacles.len() > self.settings.max_exhaustive_obstacles {
                    return Err(DomainError::TooManyObstacles {
                        count: obstacles.len(),
                        max: self.settings.max_exhaustive_obstacles,
                    });
                }
                Ok(ranked_tours(start, obstacles))
            }
            TourStrategy::NearestNeighbor => Ok(vec![nearest_neighbor_tour(start, obstacles)]),
        }
    }

    /// Walks one visit order, appending a scan after every leg, and stops at
    /// the first infeasible leg.
    fn walk_tour(&self, start: Pose, obstacles: &[Obstacle], order: &[usize]) -> TourAttempt {
        let search = PathSearch::new(&self.arena, &self.kinematics, self.settings.search);
        let mut route = Route::empty(start);
        let mut current = start;

        for &index in order {
            let obstacle = &obstacles[index];
            let Some(leg) = search.search(current, obstacle.approach_pose()) else {
                route.complete = false;
                return TourAttempt {
                    route,
                    blocked: Some((obstacle.id, current)),
                };
            };
            route.commands.extend(leg.commands);
            route.commands.push(MotionCommand::scan(obstacle.id, &self.kinematics));
            route.visit_order.push(obstacle.id);
            current = leg.end_pose;
        }

        TourAttempt { route, blocked: None }
    }

    fn record(&mut self, event: RoutePlanningEvent) -> DomainResult<()> {
        self.apply(&event)?;
        self.add_event(event);
        Ok(())
    }

    fn log_info(&self, msg: &str) {
        if let Some(logger) = &self.logger {
            logger.info(msg);
        }
    }

    fn log_warn(&self, msg: &str) {
        if let Some(logger) = &self.logger {
            logger.warn(msg);
        }
    }
}

fn is_better_partial(candidate: &Route, best: Option<&Route>) -> bool {
    match best {
        None => true,
        Some(best) => {
            let (visited, best_visited) = (candidate.visit_order.len(), best.visit_order.len());
            visited > best_visited || (visited == best_visited && candidate.commands.len() < best.commands.len())
        }
    }
}

impl AggregateRoot for RoutePlanner {
    type Event = RoutePlanningEvent;

    const AGGREGATE_TYPE: &'static str = "RoutePlanner";

    fn aggregate_id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) -> DomainResult<()> {
        match event {
            RoutePlanningEvent::PlanningStarted { .. } => {
                self.state = PlannerState::Planning;
                self.visited.clear();
                self.excluded.clear();
            }
            RoutePlanningEvent::LegFailed { .. } => {}
            RoutePlanningEvent::TourCommitted { route, complete, .. } => {
                self.route = route.clone();
                self.state = if *complete {
                    PlannerState::Committed
                } else {
                    PlannerState::Failed
                };
            }
            RoutePlanningEvent::ObstacleVisited { obstacle_id, .. } => {
                if !self.visited.contains(obstacle_id) {
                    self.visited.push(*obstacle_id);
                }
            }
            RoutePlanningEvent::ReplanStarted { marker_obstacle, .. } => {
                self.state = PlannerState::Replanning;
                if !self.excluded.contains(marker_obstacle) {
                    self.excluded.push(*marker_obstacle);
                }
            }
            RoutePlanningEvent::ReplanSucceeded { route, .. } => {
                self.route = route.clone();
                self.state = PlannerState::Committed;
            }
            RoutePlanningEvent::ReplanFailed { .. } => {
                self.state = if self.route.complete {
                    PlannerState::Committed
                } else {
                    PlannerState::Failed
                };
            }
        }
        self.version += 1;
        Ok(())
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn mark_events_as_committed(&mut self) {
        self.uncommitted_events.clear();
    }

    fn add_event(&mut self, event: Self::Event) {
        self.uncommitted_events.push(event);
    }
}
