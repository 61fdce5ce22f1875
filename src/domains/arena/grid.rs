use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::layout::ObstacleRecord;
use super::obstacle::{Obstacle, ObstacleId};
use super::pose::Pose;
use crate::common::{DomainError, DomainResult};

/// Slack for poses that sit exactly on a clearance boundary but carry float
/// noise from per-tick motion.
const BOUNDARY_SLACK: f64 = 1e-6;

/// Index of a grid cell; `(0, 0)` is the bottom-left cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub col: i32,
    pub row: i32,
}

/// Static geometry of the arena and the clearances the robot must keep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArenaSpec {
    pub width: f64,
    pub height: f64,
    pub cell_size: f64,
    /// Minimum distance from the robot centre to any wall.
    pub robot_margin: f64,
    /// Half-width of the square around an obstacle centre that the robot
    /// centre may not enter (obstacle half length plus safety margin).
    pub obstacle_clearance: f64,
    pub approach_distance: f64,
}

impl Default for ArenaSpec {
    fn default() -> Self {
        Self {
            width: 200.0,
            height: 200.0,
            cell_size: 10.0,
            robot_margin: 15.0,
            obstacle_clearance: 20.0,
            approach_distance: 30.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arena {
    pub spec: ArenaSpec,
    obstacles: Vec<Obstacle>,
}

impl Arena {
    pub fn new(spec: ArenaSpec, obstacles: Vec<Obstacle>) -> DomainResult<Self> {
        let mut seen = HashSet::new();
        for obstacle in &obstacles {
            if !seen.insert(obstacle.id) {
                return Err(DomainError::DuplicateObstacle { id: obstacle.id });
            }
            if obstacle.x < 0.0 || obstacle.x >= spec.width || obstacle.y < 0.0 || obstacle.y >= spec.height {
                return Err(DomainError::ObstacleOutOfArena {
                    id: obstacle.id,
                    x: obstacle.x as i64,
                    y: obstacle.y as i64,
                });
            }
        }
        Ok(Self { spec, obstacles })
    }

    /// Builds the arena from parsed layout records, rejecting coordinates
    /// that are not cell centres inside the arena.
    pub fn from_records(spec: ArenaSpec, records: &[ObstacleRecord]) -> DomainResult<Self> {
        let mut obstacles = Vec::with_capacity(records.len());
        for record in records {
            let on_grid = is_cell_centre(record.x as f64, spec.cell_size)
                && is_cell_centre(record.y as f64, spec.cell_size);
            let inside = record.x > 0
                && record.y > 0
                && (record.x as f64) < spec.width
                && (record.y as f64) < spec.height;
            if !on_grid || !inside {
                return Err(DomainError::ObstacleOutOfArena {
                    id: record.id,
                    x: record.x,
                    y: record.y,
                });
            }
            obstacles.push(Obstacle::new(
                record.id,
                record.x as f64,
                record.y as f64,
                record.facing,
                spec.approach_distance,
            ));
        }
        Self::new(spec, obstacles)
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn obstacle(&self, id: ObstacleId) -> Option<&Obstacle> {
        self.obstacles.iter().find(|o| o.id == id)
    }

    pub fn cols(&self) -> i32 {
        (self.spec.width / self.spec.cell_size).round() as i32
    }

    pub fn rows(&self) -> i32 {
        (self.spec.height / self.spec.cell_size).round() as i32
    }

    pub fn cell_of(&self, pose: &Pose) -> Cell {
        Cell {
            col: (pose.x / self.spec.cell_size).floor() as i32,
            row: (pose.y / self.spec.cell_size).floor() as i32,
        }
    }

    pub fn contains_cell(&self, cell: Cell) -> bool {
        cell.col >= 0 && cell.row >= 0 && cell.col < self.cols() && cell.row < self.rows()
    }

    /// Robot centre keeps the wall margin on every side.
    pub fn is_within_bounds(&self, pose: &Pose) -> bool {
        let margin = self.spec.robot_margin - BOUNDARY_SLACK;
        pose.x >= margin
            && pose.x <= self.spec.width - margin
            && pose.y >= margin
            && pose.y <= self.spec.height - margin
    }

    /// Robot centre is outside every obstacle's safety square.
    pub fn is_clear(&self, pose: &Pose) -> bool {
        let clearance = self.spec.obstacle_clearance - BOUNDARY_SLACK;
        !self
            .obstacles
            .iter()
            .any(|o| (pose.x - o.x).abs() < clearance && (pose.y - o.y).abs() < clearance)
    }

    pub fn is_valid_position(&self, pose: &Pose) -> bool {
        self.contains_cell(self.cell_of(pose)) && self.is_within_bounds(pose) && self.is_clear(pose)
    }
}

fn is_cell_centre(value: f64, cell_size: f64) -> bool {
    let steps = (value - cell_size / 2.0) / cell_size;
    (steps - steps.round()).abs() < 1e-9
}
