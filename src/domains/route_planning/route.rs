use serde::{Deserialize, Serialize};

use crate::domains::arena::{ObstacleId, Pose};
use crate::domains::motion::{Kinematics, MotionCommand};

/// Chosen visit order plus the command queue that realises it.
///
/// The queue is consumed by position: the executor keeps a cursor into
/// `commands` and never removes entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Pose the first command starts from.
    pub start: Pose,
    pub visit_order: Vec<ObstacleId>,
    pub commands: Vec<MotionCommand>,
    /// False for a best-effort partial tour.
    pub complete: bool,
}

impl Route {
    pub fn empty(start: Pose) -> Self {
        Self {
            start,
            visit_order: Vec::new(),
            commands: Vec::new(),
            complete: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Planned seconds for the whole queue.
    pub fn total_duration(&self) -> f64 {
        self.commands.iter().map(MotionCommand::duration).sum()
    }

    pub fn total_ticks(&self) -> u64 {
        self.commands.iter().map(|c| u64::from(c.total_ticks())).sum()
    }

    pub fn wire_messages(&self) -> Vec<String> {
        self.commands.iter().map(MotionCommand::to_wire_message).collect()
    }

    pub fn scan_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, MotionCommand::Scan(_)))
            .count()
    }

    /// Whether any command scans obstacle `id`.
    pub fn references(&self, id: ObstacleId) -> bool {
        self.commands.iter().any(|c| c.obstacle_id() == Some(id))
    }

    /// Pose after every command has run, starting from `start`.
    pub fn end_pose(&self) -> Pose {
        self.commands
            .iter()
            .fold(self.start, |pose, command| command.apply_to_pose(pose))
    }

    pub fn compress(&mut self, kinematics: &Kinematics) {
        self.commands = compress_commands(std::mem::take(&mut self.commands), kinematics);
    }
}

/// Merges every run of consecutive straight commands into one, summing the
/// signed distances. The merged command gets a fresh tick budget for the new
/// distance, so a run that cancels out becomes a zero-tick command.
pub fn compress_commands(commands: Vec<MotionCommand>, kinematics: &Kinematics) -> Vec<MotionCommand> {
    let mut compressed: Vec<MotionCommand> = Vec::with_capacity(commands.len());
    let mut pending: Option<f64> = None;

    for command in commands {
        match command {
            MotionCommand::Straight(straight) => {
                pending = Some(pending.unwrap_or(0.0) + straight.distance);
            }
            other => {
                if let Some(distance) = pending.take() {
                    compressed.push(MotionCommand::straight(distance, kinematics));
                }
                compressed.push(other);
            }
        }
    }
    if let Some(distance) = pending {
        compressed.push(MotionCommand::straight(distance, kinematics));
    }
    compressed
}
