use chrono::Utc;
use log::{error as log_error, info as log_info, warn as log_warn};
use std::sync::Arc;

use crate::domains::logger::{DomainLogger, DynLogger};

/// Mission log written through `fast_log`. Each line carries an RFC 3339
/// timestamp ahead of the message.
pub struct FastLogLogger;

impl DomainLogger for FastLogLogger {
    fn info(&self, msg: &str) {
        log_info!("{} - {}", Utc::now().to_rfc3339(), msg);
    }

    fn warn(&self, msg: &str) {
        log_warn!("{} - {}", Utc::now().to_rfc3339(), msg);
    }

    fn error(&self, msg: &str) {
        log_error!("{} - {}", Utc::now().to_rfc3339(), msg);
    }
}

/// Installs `fast_log` writing to `path` (mirrored to the console) and
/// returns the domain logger that feeds it. `fast_log` is a global logger, so
/// this can succeed only once per process.
pub fn init_file_logger(path: &str, level: log::LevelFilter) -> Result<DynLogger, String> {
    fast_log::init(fast_log::config::Config::new().console().file(path).level(level))
        .map_err(|e| format!("Failed to initialize fast_log at {}: {}", path, e))?;
    Ok(Arc::new(FastLogLogger))
}

/// Maps a config level name onto a `log` filter; unknown names mean `Info`.
pub fn parse_level(level: &str) -> log::LevelFilter {
    level.parse().unwrap_or(log::LevelFilter::Info)
}
