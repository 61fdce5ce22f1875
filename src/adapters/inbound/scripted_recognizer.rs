use std::collections::{HashMap, VecDeque};

use crate::common::{DomainError, DomainResult};
use crate::domains::arena::ObstacleId;
use crate::domains::motion::{Recognition, RecognitionPoll, RecognitionRequest, Recognizer, ScanKind};

/// Recognition service answering from a fixed script.
///
/// Point scans return the label configured for the obstacle (nothing if
/// none). Perimeter polls pop labels from a per-obstacle queue and return
/// nothing once it runs dry. With a latency of `n`, every request answers
/// `Pending` `n` times before the result is released.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRecognizer {
    point_labels: HashMap<ObstacleId, String>,
    perimeter_labels: HashMap<ObstacleId, VecDeque<Option<String>>>,
    latency: u32,
    waiting: HashMap<RecognitionRequest, u32>,
}

impl ScriptedRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label(mut self, obstacle_id: ObstacleId, label: impl Into<String>) -> Self {
        self.point_labels.insert(obstacle_id, label.into());
        self
    }

    /// Answers for successive perimeter polls around `obstacle_id`.
    pub fn with_perimeter_labels(mut self, obstacle_id: ObstacleId, labels: Vec<Option<&str>>) -> Self {
        self.perimeter_labels.insert(
            obstacle_id,
            labels.into_iter().map(|l| l.map(str::to_string)).collect(),
        );
        self
    }

    pub fn with_latency(mut self, polls: u32) -> Self {
        self.latency = polls;
        self
    }

    /// Parses `"1=BULLSEYE,2=A,3=7"` into point labels.
    pub fn from_assignments(assignments: &str) -> DomainResult<Self> {
        let mut recognizer = Self::new();
        for entry in assignments.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (id, label) = entry.split_once('=').ok_or_else(|| DomainError::InvalidLayout {
                reason: format!("expected id=LABEL, got '{}'", entry),
            })?;
            let id: ObstacleId = id.trim().parse().map_err(|_| DomainError::InvalidLayout {
                reason: format!("invalid obstacle id '{}'", id.trim()),
            })?;
            recognizer = recognizer.with_label(id, label.trim());
        }
        Ok(recognizer)
    }

    fn answer(&mut self, request: &RecognitionRequest) -> Recognition {
        let label = match request.kind {
            ScanKind::Point => self.point_labels.get(&request.obstacle_id).cloned(),
            ScanKind::Perimeter => self
                .perimeter_labels
                .get_mut(&request.obstacle_id)
                .and_then(VecDeque::pop_front)
                .flatten(),
        };
        Recognition::from_label(label.as_deref())
    }
}

impl Recognizer for ScriptedRecognizer {
    fn poll(&mut self, request: &RecognitionRequest) -> RecognitionPoll {
        if self.latency > 0 {
            let waited = self.waiting.entry(*request).or_insert(0);
            if *waited < self.latency {
                *waited += 1;
                return RecognitionPoll::Pending;
            }
            self.waiting.remove(request);
        }
        RecognitionPoll::Ready(self.answer(request))
    }
}
