use crate::domains::motion::Actuator;
use std::sync::{Arc, Mutex};

/// Keeps every transmitted message. Clones share the same buffer, so a test
/// can hand one clone to the executor and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingActuator {
    messages: Arc<Mutex<Vec<String>>>,
}

impl RecordingActuator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        match self.messages.lock() {
            Ok(messages) => messages.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Actuator for RecordingActuator {
    fn transmit(&mut self, message: &str) {
        match self.messages.lock() {
            Ok(mut messages) => messages.push(message.to_string()),
            Err(poisoned) => poisoned.into_inner().push(message.to_string()),
        }
    }
}

/// Stands in for the radio link in headless runs: logs each message.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingActuator;

impl Actuator for TracingActuator {
    fn transmit(&mut self, message: &str) {
        tracing::info!(target: "tour_planner::actuator", message, "transmit");
    }
}
