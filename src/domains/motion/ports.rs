use super::recognition::{RecognitionPoll, RecognitionRequest};
use crate::domains::arena::Pose;

/// Port to the image recognition service.
///
/// `poll` must never block the tick loop. Synchronous services answer
/// `Ready` straight away; asynchronous ones answer `Pending` until the result
/// arrives and are polled again on the next cycle with the same request.
pub trait Recognizer: Send {
    fn poll(&mut self, request: &RecognitionRequest) -> RecognitionPoll;
}

/// Port to the radio link that drives the physical robot.
pub trait Actuator: Send {
    /// Fixed-format message (`SF010`, `LF090`, `P___3`, `SCAN_OBS_3`, ...).
    fn transmit(&mut self, message: &str);
}

/// Receives the fractional per-tick motion of a running command.
pub trait RobotDriver {
    fn pose(&self) -> Pose;
    fn straight(&mut self, distance: f64);
    /// Arcs by `angle` degrees on the `(radius_x, radius_y)` axes locked at
    /// the start of the turn.
    fn turn(&mut self, angle: f64, reverse: bool, axes: (f64, f64));
}
