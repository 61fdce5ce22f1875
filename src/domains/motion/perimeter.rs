use serde::{Deserialize, Serialize};

use super::command::{MotionCommand, TickContext, TickOutcome};
use super::kinematics::{Kinematics, TickBudget};
use super::recognition::{Recognition, RecognitionPoll, RecognitionRequest, ScanKind};
use crate::domains::arena::{ObstacleId, Pose};

const SIDES: usize = 4;

/// Compound command driving once around an obstacle. Polls the recognition
/// service every `poll_interval` ticks while driving.
///
/// A target seen part way through a leg is held back until that leg is
/// finished, so the robot is back on a cell centre with a square heading
/// when the executor replans from its pose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerimeterScanCommand {
    obstacle_id: ObstacleId,
    poll_interval: u32,
    /// Untouched copy of the legs, used to rebuild the queue.
    plan: Vec<MotionCommand>,
    legs: Vec<MotionCommand>,
    leg_cursor: usize,
    duration: f64,
    budget: TickBudget,
    ticks_since_poll: u32,
    awaiting: bool,
    target_found: bool,
    held_target: Option<String>,
    started: bool,
}

impl PerimeterScanCommand {
    pub fn new(obstacle_id: ObstacleId, legs: Vec<MotionCommand>, poll_interval: u32) -> Self {
        let duration = legs.iter().map(MotionCommand::duration).sum();
        let total = legs.iter().map(MotionCommand::total_ticks).sum();
        Self {
            obstacle_id,
            poll_interval: poll_interval.max(1),
            plan: legs.clone(),
            legs,
            leg_cursor: 0,
            duration,
            budget: TickBudget::new(total),
            ticks_since_poll: 0,
            awaiting: false,
            target_found: false,
            held_target: None,
            started: false,
        }
    }

    /// Closed loop around an obstacle straight ahead of the robot at the
    /// approach distance: a reverse right arc out to the corner, then four
    /// sides of `side_distance` each ending in a forward left arc, and a
    /// final left arc back onto the starting pose.
    pub fn loop_legs(side_distance: f64, kinematics: &Kinematics) -> Vec<MotionCommand> {
        let mut legs = Vec::with_capacity(2 * SIDES + 2);
        legs.push(MotionCommand::turn(-90.0, true, kinematics));
        for _ in 0..SIDES {
            legs.push(MotionCommand::straight(side_distance, kinematics));
            legs.push(MotionCommand::turn(90.0, false, kinematics));
        }
        legs.push(MotionCommand::turn(90.0, false, kinematics));
        legs
    }

    /// Rebuilds the leg queue and rewinds all progress.
    pub fn reset(&mut self) {
        self.legs = self.plan.clone();
        self.leg_cursor = 0;
        self.budget.reset();
        self.ticks_since_poll = 0;
        self.awaiting = false;
        self.target_found = false;
        self.held_target = None;
        self.started = false;
    }

    pub fn obstacle_id(&self) -> ObstacleId {
        self.obstacle_id
    }

    pub fn legs(&self) -> &[MotionCommand] {
        &self.legs
    }

    /// Index of the leg currently being driven.
    pub fn leg_cursor(&self) -> usize {
        self.leg_cursor
    }

    pub fn target_found(&self) -> bool {
        self.target_found
    }

    pub(crate) fn budget(&self) -> &TickBudget {
        &self.budget
    }

    pub(crate) fn duration(&self) -> f64 {
        self.duration
    }

    pub(crate) fn tick(&mut self, ctx: &mut TickContext<'_>) -> TickOutcome {
        if self.budget.total() == 0 {
            return TickOutcome::Idle;
        }
        if !self.started {
            self.started = true;
            ctx.actuator.transmit(&format!("SCAN_OBS_{}", self.obstacle_id));
        }
        if self.budget.is_spent() {
            return TickOutcome::Idle;
        }
        self.budget.tick();

        while self
            .legs
            .get(self.leg_cursor)
            .is_some_and(MotionCommand::is_complete)
        {
            self.leg_cursor += 1;
        }
        if let Some(leg) = self.legs.get_mut(self.leg_cursor) {
            leg.drive_tick(ctx.driver);
        }

        if !self.target_found {
            self.poll(ctx);
        }
        if self.held_target.is_some() && self.at_leg_boundary() {
            if let Some(label) = self.held_target.take() {
                return TickOutcome::TargetFound(label);
            }
        }
        TickOutcome::Progress
    }

    fn poll(&mut self, ctx: &mut TickContext<'_>) {
        self.ticks_since_poll += 1;
        if !self.awaiting && self.ticks_since_poll < self.poll_interval {
            return;
        }
        self.ticks_since_poll = 0;

        let request = RecognitionRequest {
            obstacle_id: self.obstacle_id,
            kind: ScanKind::Perimeter,
        };
        match ctx.recognizer.poll(&request) {
            RecognitionPoll::Pending => self.awaiting = true,
            RecognitionPoll::Ready(Recognition::Target(label)) => {
                self.awaiting = false;
                self.target_found = true;
                self.held_target = Some(label);
            }
            RecognitionPoll::Ready(_) => self.awaiting = false,
        }
    }

    /// The leg under the cursor has just been driven to its end.
    fn at_leg_boundary(&self) -> bool {
        self.legs
            .get(self.leg_cursor)
            .map_or(true, MotionCommand::is_complete)
    }

    pub(crate) fn apply_to_pose(&self, pose: Pose) -> Pose {
        self.plan.iter().fold(pose, |p, leg| leg.apply_to_pose(p))
    }
}
