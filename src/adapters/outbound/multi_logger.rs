use crate::domains::logger::{DomainLogger, DynLogger};
use std::sync::Arc;

/// Fans every message out to all attached loggers, in order.
pub struct MultiLogger {
    targets: Vec<DynLogger>,
}

impl MultiLogger {
    pub fn new(targets: Vec<DynLogger>) -> Self {
        Self { targets }
    }
}

impl DomainLogger for MultiLogger {
    fn info(&self, msg: &str) {
        for target in &self.targets {
            target.info(msg);
        }
    }

    fn warn(&self, msg: &str) {
        for target in &self.targets {
            target.warn(msg);
        }
    }

    fn error(&self, msg: &str) {
        for target in &self.targets {
            target.error(msg);
        }
    }
}

/// File logger plus console. Falls back to the console alone when the file
/// logger cannot be installed.
pub fn init_combined_logger(path: &str, level: log::LevelFilter) -> DynLogger {
    let console = super::init_console_logger();
    match super::init_file_logger(path, level) {
        Ok(file) => Arc::new(MultiLogger::new(vec![file, console])),
        Err(e) => {
            console.warn(&e);
            console
        }
    }
}
