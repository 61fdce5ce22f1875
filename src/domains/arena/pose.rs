use serde::{Deserialize, Serialize};
use std::fmt;

/// Discretised heading: the quadrant band the continuous angle falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Heading {
    North,
    East,
    South,
    West,
}

impl Heading {
    /// Quadrant bands are ±45° windows around each axis; the diagonals at
    /// ±45° belong to North/South and ±135° to North/South as well.
    pub fn from_angle(angle: f64) -> Self {
        if (45.0..=135.0).contains(&angle) {
            Heading::North
        } else if angle > -45.0 && angle < 45.0 {
            Heading::East
        } else if (-135.0..=-45.0).contains(&angle) {
            Heading::South
        } else {
            Heading::West
        }
    }

    pub fn canonical_angle(self) -> f64 {
        match self {
            Heading::North => 90.0,
            Heading::East => 0.0,
            Heading::South => -90.0,
            Heading::West => 180.0,
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Heading::East | Heading::West)
    }

    pub fn opposite(self) -> Self {
        match self {
            Heading::North => Heading::South,
            Heading::East => Heading::West,
            Heading::South => Heading::North,
            Heading::West => Heading::East,
        }
    }

    /// Unit step `(dx, dy)` when driving forward along this heading.
    pub fn unit(self) -> (f64, f64) {
        match self {
            Heading::North => (0.0, 1.0),
            Heading::East => (1.0, 0.0),
            Heading::South => (0.0, -1.0),
            Heading::West => (-1.0, 0.0),
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Heading::North => 'N',
            Heading::East => 'E',
            Heading::South => 'S',
            Heading::West => 'W',
        }
    }
}

/// Arc radii for a 90° turn: `turn` along the direction of travel, `drift`
/// across it. Which one maps to x and which to y depends on the heading axis
/// and whether the robot is reversing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TurnRadii {
    pub turn: f64,
    pub drift: f64,
}

impl TurnRadii {
    /// Distance covered by a 90° turn: the quarter ellipse on the two radii
    /// (Ramanujan's perimeter approximation), never less than the straight
    /// line between its end points.
    pub fn quarter_arc_length(self) -> f64 {
        let (a, b) = (self.turn, self.drift);
        let arc = std::f64::consts::PI * (3.0 * (a + b) - ((3.0 * a + b) * (a + 3.0 * b)).sqrt()) / 4.0;
        arc.max(a.hypot(b))
    }

    /// `(radius_x, radius_y)` for an arc that starts on `heading`.
    pub fn along_axes(self, heading: Heading, reverse: bool) -> (f64, f64) {
        match (heading.is_horizontal(), reverse) {
            (true, false) | (false, true) => (self.turn, self.drift),
            (true, true) | (false, false) => (self.drift, self.turn),
        }
    }
}

/// Robot pose: position, discretised heading and continuous angle in degrees.
///
/// `heading` is always derived from `angle`; there is no way to set one
/// without the other.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    heading: Heading,
    angle: f64,
}

impl Pose {
    pub fn new(x: f64, y: f64, angle: f64) -> Self {
        let angle = wrap_angle(angle);
        Self {
            x,
            y,
            heading: Heading::from_angle(angle),
            angle,
        }
    }

    pub fn facing(x: f64, y: f64, heading: Heading) -> Self {
        Self {
            x,
            y,
            heading,
            angle: heading.canonical_angle(),
        }
    }

    pub fn heading(&self) -> Heading {
        self.heading
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn set_angle(&mut self, angle: f64) {
        self.angle = wrap_angle(angle);
        self.heading = Heading::from_angle(self.angle);
    }

    pub fn distance_to(&self, other: &Pose) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Pose after driving `distance` (negative reverses) along the current heading.
    pub fn advanced(mut self, distance: f64) -> Pose {
        let (ux, uy) = self.heading.unit();
        self.x += ux * distance;
        self.y += uy * distance;
        self
    }

    /// Pose after an arc of `delta` degrees (positive is counter-clockwise).
    ///
    /// The four sign cases encode the drift asymmetry of the drive train and
    /// must not be folded together.
    pub fn arced(self, delta: f64, reverse: bool, radii: TurnRadii) -> Pose {
        let axes = radii.along_axes(self.heading(), reverse);
        self.arced_on(delta, reverse, axes)
    }

    /// Like [`Pose::arced`] with the axis radii fixed by the caller. A turn
    /// split into per-tick steps keeps the radii of its starting heading, so
    /// the steps add up to the same end pose as the whole arc.
    pub fn arced_on(mut self, delta: f64, reverse: bool, (radius_x, radius_y): (f64, f64)) -> Pose {
        let from = self.angle.to_radians();
        let to = (self.angle + delta).to_radians();
        let x_change = radius_x * (to.sin() - from.sin());
        let y_change = radius_y * (to.cos() - from.cos());

        if delta < 0.0 && !reverse {
            // wheels right, forward
            self.x -= x_change;
            self.y += y_change;
        } else if (delta < 0.0 && reverse) || (delta >= 0.0 && !reverse) {
            // wheels left, backward or forward
            self.x += x_change;
            self.y -= y_change;
        } else {
            // wheels right, backward
            self.x -= x_change;
            self.y += y_change;
        }

        self.set_angle(self.angle + delta);
        self
    }

    /// Pose moved to the centre of its grid cell with the canonical angle of
    /// its heading.
    pub fn snapped(self, cell_size: f64) -> Pose {
        Pose::facing(
            snap_to_centre(self.x, cell_size),
            snap_to_centre(self.y, cell_size),
            self.heading,
        )
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.1}, {:.1}, {}, {:.1}°)",
            self.x,
            self.y,
            self.heading.symbol(),
            self.angle
        )
    }
}

/// Wraps an angle in degrees into `(-180, 180]`.
pub fn wrap_angle(mut angle: f64) -> f64 {
    while angle <= -180.0 {
        angle += 360.0;
    }
    while angle > 180.0 {
        angle -= 360.0;
    }
    angle
}

fn snap_to_centre(value: f64, cell_size: f64) -> f64 {
    ((value / cell_size).floor() + 0.5) * cell_size
}
