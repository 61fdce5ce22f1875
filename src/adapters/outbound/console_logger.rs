use crate::domains::logger::{DomainLogger, DynLogger};
use std::sync::Arc;

/// Forwards domain log lines to `tracing`, so they honour the subscriber's
/// `EnvFilter` like every other log line of the binary.
struct TracingBridge;

impl DomainLogger for TracingBridge {
    fn info(&self, msg: &str) {
        tracing::info!(target: "tour_planner::domain", "{}", msg);
    }

    fn warn(&self, msg: &str) {
        tracing::warn!(target: "tour_planner::domain", "{}", msg);
    }

    fn error(&self, msg: &str) {
        tracing::error!(target: "tour_planner::domain", "{}", msg);
    }
}

/// Console-backed domain logger; the default when no log file is configured.
pub fn init_console_logger() -> DynLogger {
    Arc::new(TracingBridge)
}
