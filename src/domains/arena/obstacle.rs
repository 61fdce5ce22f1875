use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::pose::{Heading, Pose};
use crate::common::DomainError;

pub type ObstacleId = u32;

/// Side of the obstacle carrying the image to be recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    Top,
    Bottom,
    Left,
    Right,
}

impl Facing {
    /// Direction pointing out of the image face.
    pub fn outward(self) -> Heading {
        match self {
            Facing::Top => Heading::North,
            Facing::Bottom => Heading::South,
            Facing::Left => Heading::West,
            Facing::Right => Heading::East,
        }
    }

    /// The other three sides, counter-clockwise from this one.
    pub fn others_counter_clockwise(self) -> [Facing; 3] {
        match self {
            Facing::Top => [Facing::Left, Facing::Bottom, Facing::Right],
            Facing::Left => [Facing::Bottom, Facing::Right, Facing::Top],
            Facing::Bottom => [Facing::Right, Facing::Top, Facing::Left],
            Facing::Right => [Facing::Top, Facing::Left, Facing::Bottom],
        }
    }
}

impl FromStr for Facing {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "T" | "TOP" | "N" | "NORTH" => Ok(Facing::Top),
            "B" | "BOTTOM" | "S" | "SOUTH" => Ok(Facing::Bottom),
            "L" | "LEFT" | "W" | "WEST" => Ok(Facing::Left),
            "R" | "RIGHT" | "E" | "EAST" => Ok(Facing::Right),
            other => Err(DomainError::InvalidLayout {
                reason: format!("unknown facing '{}'", other),
            }),
        }
    }
}

impl fmt::Display for Facing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            Facing::Top => "T",
            Facing::Bottom => "B",
            Facing::Left => "L",
            Facing::Right => "R",
        };
        f.write_str(token)
    }
}

/// An obstacle placed on a cell centre. Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: ObstacleId,
    pub x: f64,
    pub y: f64,
    pub facing: Facing,
    approach: Pose,
}

impl Obstacle {
    /// `approach_distance` is measured from the obstacle centre to the robot
    /// centre along the facing direction.
    pub fn new(id: ObstacleId, x: f64, y: f64, facing: Facing, approach_distance: f64) -> Self {
        Self {
            id,
            x,
            y,
            facing,
            approach: view_of(x, y, facing, approach_distance),
        }
    }

    /// Pose `distance` out from `side`, looking at the obstacle centre.
    pub fn viewing_pose(&self, side: Facing, distance: f64) -> Pose {
        view_of(self.x, self.y, side, distance)
    }

    /// Pose the robot must reach for a valid scan of the image face.
    pub fn approach_pose(&self) -> Pose {
        self.approach
    }
}

fn view_of(x: f64, y: f64, side: Facing, distance: f64) -> Pose {
    let outward = side.outward();
    let (ux, uy) = outward.unit();
    Pose::facing(x + ux * distance, y + uy * distance, outward.opposite())
}

impl fmt::Display for Obstacle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Obstacle#{}({:.0}, {:.0}, {})", self.id, self.x, self.y, self.facing)
    }
}
