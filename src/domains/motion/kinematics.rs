use serde::{Deserialize, Serialize};

use crate::domains::arena::TurnRadii;

/// Guards `ceil` against float noise such as `0.2 * 50 = 10.000000000000002`.
const TICK_EPSILON: f64 = 1e-9;

/// Motion timing and arc geometry shared by every command.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kinematics {
    /// Straight and arc speed, cm/s.
    pub speed: f64,
    /// Control cycles per second.
    pub tick_rate: f64,
    pub radii: TurnRadii,
    /// Seconds a point scan holds the robot still.
    pub scan_time: f64,
}

impl Default for Kinematics {
    fn default() -> Self {
        Self {
            speed: 50.0,
            tick_rate: 50.0,
            radii: TurnRadii {
                turn: 20.0,
                drift: 30.0,
            },
            scan_time: 0.25,
        }
    }
}

impl Kinematics {
    pub fn ticks_for(&self, seconds: f64) -> u32 {
        let ticks = (seconds * self.tick_rate - TICK_EPSILON).ceil();
        if ticks <= 0.0 {
            0
        } else {
            ticks as u32
        }
    }

    pub fn straight_duration(&self, distance: f64) -> f64 {
        (distance / self.speed).abs()
    }

    /// Arc length over speed.
    pub fn turn_duration(&self, angle: f64) -> f64 {
        (angle.to_radians() * self.radii.turn / self.speed).abs()
    }
}

/// Discretised duration of a command. `total` is fixed at construction and
/// `remaining` only counts down, never below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickBudget {
    total: u32,
    remaining: u32,
}

impl TickBudget {
    pub fn new(total: u32) -> Self {
        Self {
            total,
            remaining: total,
        }
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn elapsed(&self) -> u32 {
        self.total - self.remaining
    }

    pub fn is_spent(&self) -> bool {
        self.remaining == 0
    }

    /// Counts one tick down. A zero-length budget is never ticked.
    pub fn tick(&mut self) {
        if self.total == 0 {
            return;
        }
        self.remaining = self.remaining.saturating_sub(1);
    }

    pub fn reset(&mut self) {
        self.remaining = self.total;
    }
}
