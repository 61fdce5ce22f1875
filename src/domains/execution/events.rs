use crate::common::DomainEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domains::arena::{ObstacleId, Pose};

/// Aggregate type recorded in envelopes of [`ExecutionEvent`]s.
pub const EXECUTOR_AGGREGATE_TYPE: &str = "Executor";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExecutionEvent {
    CommandCompleted {
        executor_id: String,
        index: usize,
        message: String,
        pose: Pose,
        tick: u64,
        timestamp: DateTime<Utc>,
    },
    ImageRecognized {
        executor_id: String,
        obstacle_id: ObstacleId,
        label: String,
        timestamp: DateTime<Utc>,
    },
    MarkerDetected {
        executor_id: String,
        obstacle_id: ObstacleId,
        index: usize,
        timestamp: DateTime<Utc>,
    },
    PerimeterTargetFound {
        executor_id: String,
        obstacle_id: ObstacleId,
        label: String,
        pose: Pose,
        timestamp: DateTime<Utc>,
    },
    PerimeterScanCompleted {
        executor_id: String,
        obstacle_id: ObstacleId,
        target_found: bool,
        timestamp: DateTime<Utc>,
    },
    RouteExhausted {
        executor_id: String,
        planned_duration: f64,
        ticks: u64,
        timestamp: DateTime<Utc>,
    },
}

impl DomainEvent for ExecutionEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ExecutionEvent::CommandCompleted { .. } => "CommandCompleted",
            ExecutionEvent::ImageRecognized { .. } => "ImageRecognized",
            ExecutionEvent::MarkerDetected { .. } => "MarkerDetected",
            ExecutionEvent::PerimeterTargetFound { .. } => "PerimeterTargetFound",
            ExecutionEvent::PerimeterScanCompleted { .. } => "PerimeterScanCompleted",
            ExecutionEvent::RouteExhausted { .. } => "RouteExhausted",
        }
    }

    fn aggregate_id(&self) -> &str {
        match self {
            ExecutionEvent::CommandCompleted { executor_id, .. } => executor_id,
            ExecutionEvent::ImageRecognized { executor_id, .. } => executor_id,
            ExecutionEvent::MarkerDetected { executor_id, .. } => executor_id,
            ExecutionEvent::PerimeterTargetFound { executor_id, .. } => executor_id,
            ExecutionEvent::PerimeterScanCompleted { executor_id, .. } => executor_id,
            ExecutionEvent::RouteExhausted { executor_id, .. } => executor_id,
        }
    }

    fn event_version(&self) -> u64 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ExecutionEvent::CommandCompleted { timestamp, .. } => *timestamp,
            ExecutionEvent::ImageRecognized { timestamp, .. } => *timestamp,
            ExecutionEvent::MarkerDetected { timestamp, .. } => *timestamp,
            ExecutionEvent::PerimeterTargetFound { timestamp, .. } => *timestamp,
            ExecutionEvent::PerimeterScanCompleted { timestamp, .. } => *timestamp,
            ExecutionEvent::RouteExhausted { timestamp, .. } => *timestamp,
        }
    }
}
