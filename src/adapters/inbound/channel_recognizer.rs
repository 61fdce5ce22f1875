use std::collections::{HashMap, HashSet};
use tokio::sync::mpsc;

use crate::domains::motion::{Recognition, RecognitionPoll, RecognitionRequest, Recognizer};

/// Answer from an external recognition service.
#[derive(Debug, Clone)]
pub struct RecognitionReply {
    pub request: RecognitionRequest,
    pub label: Option<String>,
}

/// Service side of a [`ChannelRecognizer`]: receive requests, send replies.
pub struct RecognitionEndpoint {
    pub requests: mpsc::Receiver<RecognitionRequest>,
    pub replies: mpsc::Sender<RecognitionReply>,
}

/// Recognizer backed by tokio channels. Polling never blocks: the first poll
/// of a request sends it out and answers `Pending`, later polls pick up the
/// reply once it has arrived.
pub struct ChannelRecognizer {
    requests: mpsc::Sender<RecognitionRequest>,
    replies: mpsc::Receiver<RecognitionReply>,
    in_flight: HashSet<RecognitionRequest>,
    ready: HashMap<RecognitionRequest, Recognition>,
}

impl ChannelRecognizer {
    pub fn new(capacity: usize) -> (Self, RecognitionEndpoint) {
        let (request_tx, request_rx) = mpsc::channel(capacity.max(1));
        let (reply_tx, reply_rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                requests: request_tx,
                replies: reply_rx,
                in_flight: HashSet::new(),
                ready: HashMap::new(),
            },
            RecognitionEndpoint {
                requests: request_rx,
                replies: reply_tx,
            },
        )
    }

    fn drain_replies(&mut self) {
        while let Ok(reply) = self.replies.try_recv() {
            if self.in_flight.remove(&reply.request) {
                self.ready
                    .insert(reply.request, Recognition::from_label(reply.label.as_deref()));
            }
        }
    }
}

impl Recognizer for ChannelRecognizer {
    fn poll(&mut self, request: &RecognitionRequest) -> RecognitionPoll {
        self.drain_replies();
        if let Some(result) = self.ready.remove(request) {
            return RecognitionPoll::Ready(result);
        }
        if !self.in_flight.contains(request) {
            match self.requests.try_send(*request) {
                Ok(()) => {
                    self.in_flight.insert(*request);
                }
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::debug!(obstacle = request.obstacle_id, "recognition queue full, retrying next cycle");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::warn!(obstacle = request.obstacle_id, "recognition service gone, treating as no result");
                    return RecognitionPoll::Ready(Recognition::Nothing);
                }
            }
        }
        RecognitionPoll::Pending
    }
}
