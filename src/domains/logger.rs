use std::sync::Arc;

/// Port through which the planner and the executor report progress.
///
/// Calls happen inside the tick loop, so implementations must return quickly
/// and swallow their own failures.
pub trait DomainLogger: Send + Sync + 'static {
    fn info(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn error(&self, msg: &str);
}

/// Shared handle; one logger serves the planner, the executor and the
/// mission service.
pub type DynLogger = Arc<dyn DomainLogger>;
