use crate::domains::arena::Pose;
use crate::domains::motion::{Kinematics, RobotDriver};

/// Owner of the live pose. Commands move it one tick at a time through the
/// [`RobotDriver`] port.
#[derive(Debug, Clone)]
pub struct Robot {
    pose: Pose,
    kinematics: Kinematics,
    trail: Vec<(f64, f64)>,
}

impl Robot {
    pub fn new(start: Pose, kinematics: Kinematics) -> Self {
        Self {
            pose: start,
            kinematics,
            trail: vec![(start.x, start.y)],
        }
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn kinematics(&self) -> &Kinematics {
        &self.kinematics
    }

    /// Distinct positions the robot has passed through, oldest first.
    pub fn trail(&self) -> &[(f64, f64)] {
        &self.trail
    }

    pub(crate) fn record_trail(&mut self) {
        let position = (self.pose.x, self.pose.y);
        if self.trail.last() != Some(&position) {
            self.trail.push(position);
        }
    }
}

impl RobotDriver for Robot {
    fn pose(&self) -> Pose {
        self.pose
    }

    fn straight(&mut self, distance: f64) {
        self.pose = self.pose.advanced(distance);
    }

    fn turn(&mut self, angle: f64, reverse: bool, axes: (f64, f64)) {
        self.pose = self.pose.arced_on(angle, reverse, axes);
    }
}
