use crate::common::DomainEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::route::Route;
use crate::domains::arena::{ObstacleId, Pose};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RoutePlanningEvent {
    PlanningStarted {
        planner_id: String,
        obstacle_count: usize,
        candidate_count: usize,
        timestamp: DateTime<Utc>,
    },
    LegFailed {
        planner_id: String,
        obstacle_id: ObstacleId,
        from: Pose,
        attempt: usize,
        timestamp: DateTime<Utc>,
    },
    TourCommitted {
        planner_id: String,
        route: Route,
        complete: bool,
        attempts: usize,
        timestamp: DateTime<Utc>,
    },
    ObstacleVisited {
        planner_id: String,
        obstacle_id: ObstacleId,
        timestamp: DateTime<Utc>,
    },
    ReplanStarted {
        planner_id: String,
        marker_obstacle: ObstacleId,
        remaining: Vec<ObstacleId>,
        from: Pose,
        timestamp: DateTime<Utc>,
    },
    ReplanSucceeded {
        planner_id: String,
        marker_obstacle: ObstacleId,
        route: Route,
        timestamp: DateTime<Utc>,
    },
    ReplanFailed {
        planner_id: String,
        marker_obstacle: ObstacleId,
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

impl DomainEvent for RoutePlanningEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RoutePlanningEvent::PlanningStarted { .. } => "PlanningStarted",
            RoutePlanningEvent::LegFailed { .. } => "LegFailed",
            RoutePlanningEvent::TourCommitted { .. } => "TourCommitted",
            RoutePlanningEvent::ObstacleVisited { .. } => "ObstacleVisited",
            RoutePlanningEvent::ReplanStarted { .. } => "ReplanStarted",
            RoutePlanningEvent::ReplanSucceeded { .. } => "ReplanSucceeded",
            RoutePlanningEvent::ReplanFailed { .. } => "ReplanFailed",
        }
    }

    fn aggregate_id(&self) -> &str {
        match self {
            RoutePlanningEvent::PlanningStarted { planner_id, .. } => planner_id,
            RoutePlanningEvent::LegFailed { planner_id, .. } => planner_id,
            RoutePlanningEvent::TourCommitted { planner_id, .. } => planner_id,
            RoutePlanningEvent::ObstacleVisited { planner_id, .. } => planner_id,
            RoutePlanningEvent::ReplanStarted { planner_id, .. } => planner_id,
            RoutePlanningEvent::ReplanSucceeded { planner_id, .. } => planner_id,
            RoutePlanningEvent::ReplanFailed { planner_id, .. } => planner_id,
        }
    }

    fn event_version(&self) -> u64 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            RoutePlanningEvent::PlanningStarted { timestamp, .. } => *timestamp,
            RoutePlanningEvent::LegFailed { timestamp, .. } => *timestamp,
            RoutePlanningEvent::TourCommitted { timestamp, .. } => *timestamp,
            RoutePlanningEvent::ObstacleVisited { timestamp, .. } => *timestamp,
            RoutePlanningEvent::ReplanStarted { timestamp, .. } => *timestamp,
            RoutePlanningEvent::ReplanSucceeded { timestamp, .. } => *timestamp,
            RoutePlanningEvent::ReplanFailed { timestamp, .. } => *timestamp,
        }
    }
}
