use serde::{Deserialize, Serialize};

use crate::domains::arena::ObstacleId;

/// Label the recognition service returns for the marker that triggers a
/// perimeter scan.
pub const MARKER_LABEL: &str = "BULLSEYE";

/// Tri-state view of a recognition result. Any label other than the marker
/// is treated as an opaque confirmed target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recognition {
    Nothing,
    Marker,
    Target(String),
}

impl Recognition {
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(str::trim) {
            None | Some("") => Recognition::Nothing,
            Some(MARKER_LABEL) => Recognition::Marker,
            Some(l) => Recognition::Target(l.to_string()),
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Recognition::Nothing => None,
            Recognition::Marker => Some(MARKER_LABEL),
            Recognition::Target(label) => Some(label),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScanKind {
    /// Stationary scan in front of the image face.
    Point,
    /// Periodic check while circling the obstacle.
    Perimeter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecognitionRequest {
    pub obstacle_id: ObstacleId,
    pub kind: ScanKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionPoll {
    Pending,
    Ready(Recognition),
}
