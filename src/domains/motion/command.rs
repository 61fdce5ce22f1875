use serde::{Deserialize, Serialize};
use std::fmt;

use super::kinematics::{Kinematics, TickBudget};
use super::perimeter::PerimeterScanCommand;
use super::ports::{Actuator, Recognizer, RobotDriver};
use super::recognition::{Recognition, RecognitionPoll, RecognitionRequest, ScanKind};
use crate::domains::arena::{ObstacleId, Pose, TurnRadii};

/// Wire distances are sent in units of this many centimetres.
const WIRE_DISTANCE_UNIT: f64 = 5.0;

/// Collaborators a command may touch during one tick. Borrowed for the
/// duration of a single `tick` call only.
pub struct TickContext<'a> {
    pub driver: &'a mut dyn RobotDriver,
    pub actuator: &'a mut dyn Actuator,
    pub recognizer: &'a mut dyn Recognizer,
}

/// What a single tick produced, beyond moving the robot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Zero-length command; nothing happened.
    Idle,
    Progress,
    /// Scan budget spent, recognition result not in yet.
    AwaitingRecognition,
    /// Point scan finished with this result.
    Recognized(Recognition),
    /// Perimeter scan saw a non-marker image.
    TargetFound(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MotionCommand {
    Straight(StraightCommand),
    Turn(TurnCommand),
    Scan(ScanCommand),
    PerimeterScan(PerimeterScanCommand),
}

impl MotionCommand {
    pub fn straight(distance: f64, kinematics: &Kinematics) -> Self {
        MotionCommand::Straight(StraightCommand::new(distance, kinematics))
    }

    pub fn turn(angle: f64, reverse: bool, kinematics: &Kinematics) -> Self {
        MotionCommand::Turn(TurnCommand::new(angle, reverse, kinematics))
    }

    pub fn scan(obstacle_id: ObstacleId, kinematics: &Kinematics) -> Self {
        MotionCommand::Scan(ScanCommand::new(obstacle_id, kinematics))
    }

    fn budget(&self) -> &TickBudget {
        match self {
            MotionCommand::Straight(c) => &c.budget,
            MotionCommand::Turn(c) => &c.budget,
            MotionCommand::Scan(c) => &c.budget,
            MotionCommand::PerimeterScan(c) => c.budget(),
        }
    }

    pub fn total_ticks(&self) -> u32 {
        self.budget().total()
    }

    pub fn remaining_ticks(&self) -> u32 {
        self.budget().remaining()
    }

    /// Seconds this command was configured to take.
    pub fn duration(&self) -> f64 {
        match self {
            MotionCommand::Straight(c) => c.duration,
            MotionCommand::Turn(c) => c.duration,
            MotionCommand::Scan(c) => c.duration,
            MotionCommand::PerimeterScan(c) => c.duration(),
        }
    }

    pub fn is_complete(&self) -> bool {
        match self {
            MotionCommand::Scan(c) => c.is_complete(),
            other => other.budget().is_spent(),
        }
    }

    /// Obstacle a scan command refers to.
    pub fn obstacle_id(&self) -> Option<ObstacleId> {
        match self {
            MotionCommand::Scan(c) => Some(c.obstacle_id),
            MotionCommand::PerimeterScan(c) => Some(c.obstacle_id()),
            _ => None,
        }
    }

    /// Runs one control cycle of this command. Call at most once per cycle.
    pub fn tick(&mut self, ctx: &mut TickContext<'_>) -> TickOutcome {
        match self {
            MotionCommand::Straight(c) => c.tick(ctx),
            MotionCommand::Turn(c) => c.tick(ctx),
            MotionCommand::Scan(c) => c.tick(ctx),
            MotionCommand::PerimeterScan(c) => c.tick(ctx),
        }
    }

    /// Runs one cycle of motion without talking to the radio. Used for the
    /// legs of a compound command, which the robot executes on its own.
    pub(crate) fn drive_tick(&mut self, driver: &mut dyn RobotDriver) {
        match self {
            MotionCommand::Straight(c) => c.drive_tick(driver),
            MotionCommand::Turn(c) => c.drive_tick(driver),
            MotionCommand::Scan(c) => c.budget.tick(),
            MotionCommand::PerimeterScan(_) => {}
        }
    }

    /// Pose after the command has fully completed. Pure.
    pub fn apply_to_pose(&self, pose: Pose) -> Pose {
        match self {
            MotionCommand::Straight(c) => pose.advanced(c.distance),
            MotionCommand::Turn(c) => pose.arced(c.angle, c.reverse, c.radii),
            MotionCommand::Scan(_) => pose,
            MotionCommand::PerimeterScan(c) => c.apply_to_pose(pose),
        }
    }

    pub fn to_wire_message(&self) -> String {
        match self {
            MotionCommand::Straight(c) => c.to_wire_message(),
            MotionCommand::Turn(c) => c.to_wire_message(),
            MotionCommand::Scan(c) => format!("P___{}", c.obstacle_id),
            MotionCommand::PerimeterScan(c) => format!("SCAN_OBS_{}", c.obstacle_id()),
        }
    }
}

/// Every per-tick pose the robot passes through while `commands` run from
/// `start`, in order. Scans hold the pose; nested perimeter scans are not
/// expanded.
pub fn sweep(start: Pose, commands: &[MotionCommand]) -> Vec<Pose> {
    let mut trace = PoseTrace {
        pose: start,
        poses: Vec::new(),
    };
    for command in commands {
        let mut command = command.clone();
        for _ in 0..command.total_ticks() {
            command.drive_tick(&mut trace);
        }
    }
    trace.poses
}

struct PoseTrace {
    pose: Pose,
    poses: Vec<Pose>,
}

impl RobotDriver for PoseTrace {
    fn pose(&self) -> Pose {
        self.pose
    }

    fn straight(&mut self, distance: f64) {
        self.pose = self.pose.advanced(distance);
        self.poses.push(self.pose);
    }

    fn turn(&mut self, angle: f64, reverse: bool, axes: (f64, f64)) {
        self.pose = self.pose.arced_on(angle, reverse, axes);
        self.poses.push(self.pose);
    }
}

impl fmt::Display for MotionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotionCommand::Straight(c) => {
                write!(f, "Straight({:.1}, {} ticks)", c.distance, c.budget.total())
            }
            MotionCommand::Turn(c) => write!(
                f,
                "Turn({:.2}°, {} ticks, rev={})",
                c.angle,
                c.budget.total(),
                c.reverse
            ),
            MotionCommand::Scan(c) => write!(f, "Scan(obstacle {}, {} ticks)", c.obstacle_id, c.budget.total()),
            MotionCommand::PerimeterScan(c) => write!(
                f,
                "PerimeterScan(obstacle {}, {} legs, {} ticks)",
                c.obstacle_id(),
                c.legs().len(),
                c.budget().total()
            ),
        }
    }
}

/// Straight run along the current heading; negative distance reverses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StraightCommand {
    pub distance: f64,
    duration: f64,
    budget: TickBudget,
    started: bool,
}

impl StraightCommand {
    pub fn new(distance: f64, kinematics: &Kinematics) -> Self {
        let duration = kinematics.straight_duration(distance);
        Self {
            distance,
            duration,
            budget: TickBudget::new(kinematics.ticks_for(duration)),
            started: false,
        }
    }

    fn tick(&mut self, ctx: &mut TickContext<'_>) -> TickOutcome {
        if self.budget.total() == 0 {
            return TickOutcome::Idle;
        }
        if !self.started {
            self.started = true;
            ctx.actuator.transmit(&self.to_wire_message());
        }
        self.drive_tick(ctx.driver);
        TickOutcome::Progress
    }

    fn drive_tick(&mut self, driver: &mut dyn RobotDriver) {
        if self.budget.total() == 0 || self.budget.is_spent() {
            return;
        }
        self.budget.tick();
        driver.straight(self.distance / f64::from(self.budget.total()));
    }

    pub fn to_wire_message(&self) -> String {
        let units = (self.distance.abs() / WIRE_DISTANCE_UNIT).floor() as i64;
        if self.distance < 0.0 {
            format!("SB{:03}", units)
        } else {
            format!("SF{:03}", units)
        }
    }
}

/// 90°-class arc. Positive angles turn counter-clockwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnCommand {
    pub angle: f64,
    pub reverse: bool,
    radii: TurnRadii,
    duration: f64,
    budget: TickBudget,
    started: bool,
    /// Axis radii taken from the heading the turn started on.
    #[serde(default)]
    arc: Option<(f64, f64)>,
}

impl TurnCommand {
    pub fn new(angle: f64, reverse: bool, kinematics: &Kinematics) -> Self {
        let duration = kinematics.turn_duration(angle);
        Self {
            angle,
            reverse,
            radii: kinematics.radii,
            duration,
            budget: TickBudget::new(kinematics.ticks_for(duration)),
            started: false,
            arc: None,
        }
    }

    fn tick(&mut self, ctx: &mut TickContext<'_>) -> TickOutcome {
        if self.budget.total() == 0 {
            return TickOutcome::Idle;
        }
        if !self.started {
            self.started = true;
            ctx.actuator.transmit(&self.to_wire_message());
        }
        self.drive_tick(ctx.driver);
        TickOutcome::Progress
    }

    fn drive_tick(&mut self, driver: &mut dyn RobotDriver) {
        if self.budget.total() == 0 || self.budget.is_spent() {
            return;
        }
        let (radii, reverse) = (self.radii, self.reverse);
        let heading = driver.pose().heading();
        let axes = *self
            .arc
            .get_or_insert_with(|| radii.along_axes(heading, reverse));
        self.budget.tick();
        driver.turn(self.angle / f64::from(self.budget.total()), self.reverse, axes);
    }

    pub fn to_wire_message(&self) -> String {
        let token = match (self.angle > 0.0, self.reverse) {
            (true, false) => "LF090",
            (true, true) => "RB090",
            (false, false) if self.angle < 0.0 => "RF090",
            _ => "LB090",
        };
        token.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum ScanPhase {
    Counting,
    Awaiting,
    Finished(Recognition),
}

/// Stationary scan in front of an obstacle. The recognition request goes out
/// on the final tick; if the answer is not in yet the command waits and
/// re-polls on every following cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanCommand {
    pub obstacle_id: ObstacleId,
    duration: f64,
    budget: TickBudget,
    phase: ScanPhase,
}

impl ScanCommand {
    pub fn new(obstacle_id: ObstacleId, kinematics: &Kinematics) -> Self {
        Self {
            obstacle_id,
            duration: kinematics.scan_time,
            budget: TickBudget::new(kinematics.ticks_for(kinematics.scan_time)),
            phase: ScanPhase::Counting,
        }
    }

    pub fn result(&self) -> Option<&Recognition> {
        match &self.phase {
            ScanPhase::Finished(r) => Some(r),
            _ => None,
        }
    }

    pub fn is_awaiting(&self) -> bool {
        self.phase == ScanPhase::Awaiting
    }

    fn is_complete(&self) -> bool {
        self.budget.total() == 0 || matches!(self.phase, ScanPhase::Finished(_))
    }

    fn tick(&mut self, ctx: &mut TickContext<'_>) -> TickOutcome {
        if self.budget.total() == 0 {
            return TickOutcome::Idle;
        }
        match self.phase {
            ScanPhase::Counting => {
                self.budget.tick();
                if !self.budget.is_spent() {
                    return TickOutcome::Progress;
                }
                ctx.actuator.transmit(&format!("P___{}", self.obstacle_id));
                self.poll(ctx.recognizer)
            }
            ScanPhase::Awaiting => self.poll(ctx.recognizer),
            ScanPhase::Finished(_) => TickOutcome::Idle,
        }
    }

    fn poll(&mut self, recognizer: &mut dyn Recognizer) -> TickOutcome {
        let request = RecognitionRequest {
            obstacle_id: self.obstacle_id,
            kind: ScanKind::Point,
        };
        match recognizer.poll(&request) {
            RecognitionPoll::Pending => {
                self.phase = ScanPhase::Awaiting;
                TickOutcome::AwaitingRecognition
            }
            RecognitionPoll::Ready(result) => {
                self.phase = ScanPhase::Finished(result.clone());
                TickOutcome::Recognized(result)
            }
        }
    }
}
